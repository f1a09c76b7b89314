//! Nearest-node lookup for snapping arbitrary query coordinates onto the
//! graph.

use tracing::debug;

use crate::geodesy::{distance_km, Coordinate};
use crate::graph::{Graph, NodeId, NodeKind};

/// Absolute cap on the radius back-off, in kilometres.
const EXPANSION_CAP_KM: f64 = 5000.0;

/// Ocean candidates within this factor of the overall closest distance win
/// over closer Port candidates; ports are fallback anchors, not preferred
/// routing entries.
const OCEAN_PREFERENCE_FACTOR: f64 = 1.2;

/// Distance discount applied to coastal nodes to bias toward shore-adjacent
/// entry points.
const COASTAL_DISCOUNT: f64 = 0.8;

/// Parameters controlling a nearest-node search.
#[derive(Debug, Clone)]
pub struct LocateOptions {
    /// Node kinds eligible as results; `None` accepts every kind.
    pub allowed_kinds: Option<Vec<NodeKind>>,
    pub max_distance_km: f64,
    /// Double the radius in fixed increments (up to 5,000 km) when the
    /// initial budget finds nothing.
    pub expand_radius: bool,
    /// Apply the coastal distance discount.
    pub prefer_coastal: bool,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            allowed_kinds: None,
            max_distance_km: 1000.0,
            expand_radius: false,
            prefer_coastal: false,
        }
    }
}

impl LocateOptions {
    /// Options for snapping route endpoints: water-capable kinds only, with
    /// a generous budget and radius back-off.
    pub fn water_endpoint(max_distance_km: f64) -> Self {
        Self {
            allowed_kinds: Some(vec![NodeKind::Ocean, NodeKind::Port]),
            max_distance_km,
            expand_radius: true,
            prefer_coastal: false,
        }
    }

    fn allows(&self, kind: NodeKind) -> bool {
        match &self.allowed_kinds {
            Some(kinds) => kinds.contains(&kind),
            None => true,
        }
    }
}

/// A located node together with its true (undiscounted) distance from the
/// query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestNode {
    pub id: NodeId,
    pub distance_km: f64,
}

/// Outcome of [`locate`]: either a node, or the nearest distance observed so
/// the caller can report how far off the query was.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocateOutcome {
    Found(NearestNode),
    NotFound { nearest_km: f64 },
}

/// Find the node nearest to `point` among the allowed kinds.
///
/// Candidates are ranked by a scoring distance (the geodesic distance, with
/// the coastal discount applied when requested); Ocean nodes within 20% of
/// the best score beat closer Port nodes. The reported distance is always
/// the real geodesic one.
pub fn locate(graph: &Graph, point: Coordinate, options: &LocateOptions) -> LocateOutcome {
    let point = point.normalized();
    let mut radius = options.max_distance_km;

    loop {
        match scan(graph, point, options, radius) {
            LocateOutcome::Found(found) => return LocateOutcome::Found(found),
            LocateOutcome::NotFound { nearest_km } => {
                if !options.expand_radius || radius >= EXPANSION_CAP_KM {
                    return LocateOutcome::NotFound { nearest_km };
                }
                radius = (radius * 2.0).min(EXPANSION_CAP_KM);
                debug!(radius_km = radius, "expanding nearest-node search radius");
            }
        }
    }
}

fn scan(
    graph: &Graph,
    point: Coordinate,
    options: &LocateOptions,
    radius_km: f64,
) -> LocateOutcome {
    // (id, kind, real distance, scoring distance)
    let mut candidates: Vec<(NodeId, NodeKind, f64, f64)> = Vec::new();
    let mut nearest_any = f64::INFINITY;

    for node in graph.nodes() {
        if !options.allows(node.kind) {
            continue;
        }

        let real = distance_km(point, node.coordinates);
        nearest_any = nearest_any.min(real);

        let score = if options.prefer_coastal && node.coastal {
            real * COASTAL_DISCOUNT
        } else {
            real
        };

        if score <= radius_km {
            candidates.push((node.id, node.kind, real, score));
        }
    }

    if candidates.is_empty() {
        return LocateOutcome::NotFound {
            nearest_km: nearest_any,
        };
    }

    candidates.sort_by(|a, b| a.3.total_cmp(&b.3).then(a.0.cmp(&b.0)));
    let best_score = candidates[0].3;

    let preferred_ocean = candidates
        .iter()
        .find(|(_, kind, _, score)| *kind == NodeKind::Ocean && *score <= best_score * OCEAN_PREFERENCE_FACTOR);

    let chosen = preferred_ocean.unwrap_or(&candidates[0]);
    LocateOutcome::Found(NearestNode {
        id: chosen.0,
        distance_km: chosen.2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;
    use std::collections::HashMap;

    fn fixture() -> Graph {
        let mut graph = Graph::new();
        graph.add_node(Node::ocean(0, Coordinate::new(1.0, 0.0)));
        graph.add_node(Node::ocean(1, Coordinate::new(5.0, 0.0)));
        graph.add_node(Node::port(
            2,
            Coordinate::new(0.9, 0.0),
            HashMap::new(),
        ));
        graph
    }

    #[test]
    fn finds_closest_node() {
        let graph = fixture();
        let options = LocateOptions {
            allowed_kinds: Some(vec![NodeKind::Ocean]),
            ..LocateOptions::default()
        };
        match locate(&graph, Coordinate::new(0.0, 0.0), &options) {
            LocateOutcome::Found(found) => assert_eq!(found.id, 0),
            other => panic!("expected a node, got {other:?}"),
        }
    }

    #[test]
    fn prefers_ocean_over_marginally_closer_port() {
        let graph = fixture();
        // Port 2 is closest (0.9°) but ocean node 0 (1.0°) is within 20%.
        match locate(&graph, Coordinate::new(0.0, 0.0), &LocateOptions::default()) {
            LocateOutcome::Found(found) => assert_eq!(found.id, 0),
            other => panic!("expected a node, got {other:?}"),
        }
    }

    #[test]
    fn never_exceeds_budget_without_expansion() {
        let graph = fixture();
        let options = LocateOptions {
            max_distance_km: 10.0,
            ..LocateOptions::default()
        };
        match locate(&graph, Coordinate::new(40.0, 0.0), &options) {
            LocateOutcome::NotFound { nearest_km } => {
                assert!(nearest_km > 10.0);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn expansion_finds_distant_node_within_cap() {
        let graph = fixture();
        let options = LocateOptions {
            max_distance_km: 10.0,
            expand_radius: true,
            ..LocateOptions::default()
        };
        // ~3,900 km away: unreachable at 10 km, reachable after back-off.
        match locate(&graph, Coordinate::new(36.0, 0.0), &options) {
            LocateOutcome::Found(found) => assert_eq!(found.id, 1),
            other => panic!("expected a node, got {other:?}"),
        }
    }

    #[test]
    fn expansion_still_bounded_by_cap() {
        let mut graph = Graph::new();
        graph.add_node(Node::ocean(0, Coordinate::new(0.0, 0.0)));
        let options = LocateOptions {
            max_distance_km: 10.0,
            expand_radius: true,
            ..LocateOptions::default()
        };
        // Antipodal-ish point, ~20,000 km away: beyond the 5,000 km cap.
        match locate(&graph, Coordinate::new(179.0, 0.0), &options) {
            LocateOutcome::NotFound { nearest_km } => assert!(nearest_km > EXPANSION_CAP_KM),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
