//! Wrap-around connectivity across the ±180° antimeridian.
//!
//! The lattice builder works in plain [-180, 180] longitude space, so the
//! two nodes at 179° and -179° on the same latitude end up ~39,800 km apart
//! as far as adjacency is concerned. This pass adds the missing wrap edges
//! for the bands nearest the line and flags them so path reconstruction can
//! split the crossing at the dateline.

use tracing::info;

use crate::geodesy::wrapped_distance;
use crate::graph::{Edge, Graph, NodeId};

/// How close to ±180° a node must be to join a band.
pub const DEFAULT_BUFFER_DEG: f64 = 5.0;

/// Maximum latitude difference between paired west/east nodes.
pub const DEFAULT_MAX_LAT_DIFF_DEG: f64 = 1.0;

/// Connect west-band and east-band nodes across the antimeridian.
///
/// Quadratic in band size, which stays small relative to the whole graph.
/// Idempotent: the existing-edge check makes a second run insert nothing.
/// Returns the number of edges added and sets the graph's
/// `antimeridian_connected` flag once the pass completes.
pub fn connect_antimeridian(graph: &mut Graph, buffer_deg: f64, max_lat_diff_deg: f64) -> usize {
    let mut west: Vec<NodeId> = Vec::new();
    let mut east: Vec<NodeId> = Vec::new();

    for node in graph.nodes() {
        let lon = node.coordinates.lon;
        if (-180.0..=-180.0 + buffer_deg).contains(&lon) {
            west.push(node.id);
        } else if (180.0 - buffer_deg..=180.0).contains(&lon) {
            east.push(node.id);
        }
    }
    west.sort_unstable();
    east.sort_unstable();

    info!(
        west = west.len(),
        east = east.len(),
        "scanning antimeridian bands"
    );

    let mut pending: Vec<(NodeId, NodeId, f64)> = Vec::new();
    for &w in &west {
        let w_coord = graph.node(w).map(|n| n.coordinates);
        let Some(w_coord) = w_coord else { continue };
        for &e in &east {
            let Some(e_coord) = graph.node(e).map(|n| n.coordinates) else {
                continue;
            };
            if (w_coord.lat - e_coord.lat).abs() > max_lat_diff_deg {
                continue;
            }
            let (km, crosses) = wrapped_distance(w_coord, e_coord, 180.0);
            if !crosses {
                continue;
            }
            if graph.has_edge(w, e) {
                continue;
            }
            pending.push((w, e, km));
        }
    }

    let mut added = 0;
    for (w, e, km) in pending {
        let edge = Edge {
            target: e,
            base_weight: km,
            is_passage: false,
            is_antimeridian_crossing: true,
            is_temporary: false,
            passage_name: None,
        };
        if graph.add_edge(w, e, edge) {
            added += 1;
        }
    }

    graph.stats_mut().antimeridian_connected = true;
    graph.sync_stats();
    info!(added, "antimeridian connection pass finished");
    added
}

/// Connect with the default band buffer and latitude threshold.
pub fn connect_antimeridian_default(graph: &mut Graph) -> usize {
    connect_antimeridian(graph, DEFAULT_BUFFER_DEG, DEFAULT_MAX_LAT_DIFF_DEG)
}
