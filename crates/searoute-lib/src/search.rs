//! Best-first shortest-path search over the water-only weight function.
//!
//! Dijkstra when no heuristic is supplied; A* when the caller provides the
//! consistent geodesic heuristic toward the destination. The weight law:
//!
//! - passage edges cost `base_weight × 0.8`;
//! - edges between two water-capable nodes cost `base_weight` (or the
//!   per-request adjusted weight from a weather overlay);
//! - everything else is a forbidden transition and is never traversed.
//!
//! Tie-break law: entries with equal priority settle in discovery order
//! (each heap entry carries a monotonic sequence number), so identical
//! inputs reproduce identical paths in tests.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::geodesy::distance_km;
use crate::graph::{Edge, Graph, NodeId};

/// Discount applied to passage edges by the weight function.
pub const PASSAGE_DISCOUNT: f64 = 0.8;

/// Per-request weight overlay keyed by ordered node pair.
///
/// Weather refinement writes adjusted weights here instead of into the
/// shared graph, which keeps concurrent queries lock-free.
#[derive(Debug, Clone, Default)]
pub struct WeightOverlay {
    adjusted: HashMap<(NodeId, NodeId), f64>,
}

impl WeightOverlay {
    pub fn set(&mut self, a: NodeId, b: NodeId, weight: f64) {
        self.adjusted.insert(ordered(a, b), weight);
    }

    pub fn get(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.adjusted.get(&ordered(a, b)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.adjusted.is_empty()
    }
}

fn ordered(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Water-only edge weight; `None` marks a forbidden transition.
pub fn edge_weight(
    graph: &Graph,
    from: NodeId,
    edge: &Edge,
    overlay: Option<&WeightOverlay>,
) -> Option<f64> {
    let base = overlay
        .and_then(|o| o.get(from, edge.target))
        .unwrap_or(edge.base_weight);

    if edge.is_passage {
        return Some(base * PASSAGE_DISCOUNT);
    }

    let from_ok = graph.node(from).map(|n| n.kind.is_water_capable());
    let to_ok = graph.node(edge.target).map(|n| n.kind.is_water_capable());
    match (from_ok, to_ok) {
        (Some(true), Some(true)) => Some(base),
        _ => None,
    }
}

/// A found path with its optimization cost (discounts and adjustments
/// included, unlike the physical distance the reconstructor reports).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub path: Vec<NodeId>,
    pub cost: f64,
}

/// Shortest path from `start` to `goal` under the water-only weight
/// function. `use_heuristic` enables the geodesic A* heuristic.
pub fn shortest_path(
    graph: &Graph,
    start: NodeId,
    goal: NodeId,
    overlay: Option<&WeightOverlay>,
    use_heuristic: bool,
) -> Option<SearchResult> {
    if start == goal {
        return Some(SearchResult {
            path: vec![start],
            cost: 0.0,
        });
    }
    let goal_coord = graph.node(goal)?.coordinates;

    let mut g_score: HashMap<NodeId, f64> = HashMap::new();
    let mut parents: HashMap<NodeId, NodeId> = HashMap::new();
    let mut queue = BinaryHeap::new();
    let mut sequence: u64 = 0;

    g_score.insert(start, 0.0);
    queue.push(QueueEntry::new(start, 0.0, 0.0, sequence));

    while let Some(entry) = queue.pop() {
        let current = match g_score.get(&entry.node) {
            // Stale entry: a cheaper path already settled this node.
            Some(score) if *score < entry.cost.0 => continue,
            Some(score) => *score,
            None => continue,
        };

        if entry.node == goal {
            return Some(SearchResult {
                path: reconstruct(&parents, start, goal),
                cost: current,
            });
        }

        for edge in graph.neighbours(entry.node) {
            let Some(weight) = edge_weight(graph, entry.node, edge, overlay) else {
                continue;
            };

            let tentative = current + weight;
            if tentative < *g_score.get(&edge.target).unwrap_or(&f64::INFINITY) {
                g_score.insert(edge.target, tentative);
                parents.insert(edge.target, entry.node);
                let estimate = if use_heuristic {
                    graph
                        .node(edge.target)
                        .map(|n| distance_km(n.coordinates, goal_coord))
                        .unwrap_or(0.0)
                } else {
                    0.0
                };
                sequence += 1;
                queue.push(QueueEntry::new(edge.target, tentative, estimate, sequence));
            }
        }
    }

    None
}

fn reconstruct(parents: &HashMap<NodeId, NodeId>, start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match parents.get(&current) {
            Some(&parent) => {
                path.push(parent);
                current = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: NodeId,
    cost: FloatOrd,
    estimate: FloatOrd,
    sequence: u64,
}

impl QueueEntry {
    fn new(node: NodeId, cost: f64, heuristic: f64, sequence: u64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
            estimate: FloatOrd(cost + heuristic),
            sequence,
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by estimate;
        // equal estimates settle in discovery order.
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::Coordinate;
    use crate::graph::{Node, NodeKind};

    fn line_graph() -> Graph {
        // 0 - 1 - 2 - 3 along the equator, one degree apart.
        let mut graph = Graph::new();
        for id in 0..4 {
            graph.add_node(Node::ocean(id, Coordinate::new(id as f64, 0.0)));
        }
        for id in 0..3 {
            let weight = distance_km(
                Coordinate::new(id as f64, 0.0),
                Coordinate::new(id as f64 + 1.0, 0.0),
            );
            graph.add_edge(id, id + 1, Edge::lattice(id + 1, weight));
        }
        graph
    }

    #[test]
    fn dijkstra_finds_line_path() {
        let graph = line_graph();
        let result = shortest_path(&graph, 0, 3, None, false).unwrap();
        assert_eq!(result.path, vec![0, 1, 2, 3]);
        assert!((result.cost - 3.0 * 111.19).abs() < 1.0);
    }

    #[test]
    fn a_star_matches_dijkstra_on_line() {
        let graph = line_graph();
        let dijkstra = shortest_path(&graph, 0, 3, None, false).unwrap();
        let a_star = shortest_path(&graph, 0, 3, None, true).unwrap();
        assert_eq!(dijkstra.path, a_star.path);
        assert!((dijkstra.cost - a_star.cost).abs() < 1e-9);
    }

    #[test]
    fn start_equals_goal_is_single_node() {
        let graph = line_graph();
        let result = shortest_path(&graph, 2, 2, None, false).unwrap();
        assert_eq!(result.path, vec![2]);
        assert_eq!(result.cost, 0.0);
    }

    #[test]
    fn forbidden_edges_are_never_traversed() {
        let mut graph = line_graph();
        // Replace node 1 with a Passage-kind node: edges into it are not
        // water-capable and (not being passage edges) become forbidden.
        let mut blocked = Node::ocean(1, Coordinate::new(1.0, 0.0));
        blocked.kind = NodeKind::Passage;
        graph.add_node(blocked);

        assert!(shortest_path(&graph, 0, 3, None, false).is_none());
    }

    #[test]
    fn passage_edges_are_discounted() {
        let mut graph = line_graph();
        // Long-way lattice detour 0-1-2-3 versus a direct passage 0-3.
        let direct = Edge {
            target: 3,
            base_weight: 400.0,
            is_passage: true,
            is_antimeridian_crossing: false,
            is_temporary: false,
            passage_name: Some("Shortcut".to_string()),
        };
        graph.add_edge(0, 3, direct);

        let result = shortest_path(&graph, 0, 3, None, false).unwrap();
        // 400 × 0.8 = 320 beats ~333.6 over the lattice.
        assert_eq!(result.path, vec![0, 3]);
        assert!((result.cost - 320.0).abs() < 1e-9);
    }

    #[test]
    fn overlay_redirects_the_search_without_touching_the_graph() {
        let mut graph = line_graph();
        // Alternate route 0 - 4 - 3 with slightly higher base cost.
        graph.add_node(Node::ocean(4, Coordinate::new(1.5, 1.0)));
        graph.add_edge(0, 4, Edge::lattice(4, 200.0));
        graph.add_edge(4, 3, Edge::lattice(3, 200.0));

        let unweighted = shortest_path(&graph, 0, 3, None, false).unwrap();
        assert_eq!(unweighted.path, vec![0, 1, 2, 3]);

        let mut overlay = WeightOverlay::default();
        overlay.set(1, 2, 5000.0);
        let adjusted = shortest_path(&graph, 0, 3, Some(&overlay), false).unwrap();
        assert_eq!(adjusted.path, vec![0, 4, 3]);

        // Base weights are untouched.
        assert!((graph.edge(1, 2).unwrap().base_weight - 111.19).abs() < 1.0);
    }

    #[test]
    fn disconnected_goal_returns_none() {
        let mut graph = line_graph();
        graph.add_node(Node::ocean(9, Coordinate::new(50.0, 0.0)));
        assert!(shortest_path(&graph, 0, 9, None, false).is_none());
    }

    #[test]
    fn equal_cost_ties_settle_in_discovery_order() {
        // Diamond: 0 -> {1, 2} -> 3 with identical weights; discovery order
        // makes the route through the first-listed neighbour win.
        let mut graph = Graph::new();
        for id in 0..4 {
            graph.add_node(Node::ocean(id, Coordinate::new(id as f64, 0.0)));
        }
        graph.add_edge(0, 1, Edge::lattice(1, 100.0));
        graph.add_edge(0, 2, Edge::lattice(2, 100.0));
        graph.add_edge(1, 3, Edge::lattice(3, 100.0));
        graph.add_edge(2, 3, Edge::lattice(3, 100.0));

        let first = shortest_path(&graph, 0, 3, None, false).unwrap();
        let second = shortest_path(&graph, 0, 3, None, false).unwrap();
        assert_eq!(first.path, second.path);
        assert_eq!(first.path, vec![0, 1, 3]);
    }
}
