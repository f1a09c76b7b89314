//! Turns a node path into a renderable coordinate sequence and the
//! vessel-facing totals.
//!
//! The reported distance is the physical one: the sum of traversed edge
//! base weights, before the passage discount and any weather adjustment.
//! The optimization cost the search minimized is a different number and
//! stays internal.

use serde::Serialize;

use crate::geodesy::Coordinate;
use crate::graph::{Graph, NodeId};
use crate::query::VesselProfile;

/// A computed route ready to return to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub source: [f64; 2],
    pub destination: [f64; 2],
    /// Continuous `[lon, lat]` sequence: the unsnapped query endpoints with
    /// the traversed node coordinates (and dateline split points) between
    /// them, unwrapped so no consecutive pair jumps more than 180°.
    pub coordinates: Vec<[f64; 2]>,
    /// Number of graph nodes traversed.
    pub path_length: usize,
    /// Physical distance in kilometres (base weights, pre-discount).
    pub total_distance_km: f64,
    pub estimated_time_hours: f64,
    pub fuel_consumption: f64,
    pub passages_used: Vec<String>,
    pub crosses_antimeridian: bool,
    /// Snap distances from the query endpoints to their graph nodes.
    pub source_snap_km: f64,
    pub destination_snap_km: f64,
}

/// Build the summary for a found node path.
pub fn reconstruct(
    graph: &Graph,
    path: &[NodeId],
    source: Coordinate,
    destination: Coordinate,
    vessel: &VesselProfile,
    source_snap_km: f64,
    destination_snap_km: f64,
) -> RouteSummary {
    let mut coordinates: Vec<[f64; 2]> = vec![source.into()];
    let mut total_distance = 0.0;
    let mut passages_used = Vec::new();
    let mut crosses_antimeridian = false;

    for (i, &node_id) in path.iter().enumerate() {
        let Some(node) = graph.node(node_id) else {
            continue;
        };
        coordinates.push(node.coordinates.into());

        let Some(&next_id) = path.get(i + 1) else {
            continue;
        };
        let Some(edge) = graph.edge(node_id, next_id) else {
            continue;
        };

        total_distance += edge.base_weight;
        if edge.is_passage {
            if let Some(name) = &edge.passage_name {
                if passages_used.last() != Some(name) {
                    passages_used.push(name.clone());
                }
            }
        }
        if edge.is_antimeridian_crossing {
            crosses_antimeridian = true;
            // Split the crossing at the dateline so it renders as two
            // segments meeting at ±180° instead of one spanning the map.
            if let Some(next) = graph.node(next_id) {
                let (here, there) = if node.coordinates.lon < 0.0 {
                    (-180.0, 180.0)
                } else {
                    (180.0, -180.0)
                };
                coordinates.push([here, node.coordinates.lat]);
                coordinates.push([there, next.coordinates.lat]);
            }
        }
    }

    coordinates.push(destination.into());
    unwrap_longitudes(&mut coordinates);

    let speed = vessel.speed_km_per_hour;
    let estimated_time_hours = if speed > 0.0 {
        total_distance / speed
    } else {
        0.0
    };

    RouteSummary {
        source: source.into(),
        destination: destination.into(),
        coordinates,
        path_length: path.len(),
        total_distance_km: total_distance,
        estimated_time_hours,
        fuel_consumption: total_distance * vessel.fuel_consumption_per_km,
        passages_used,
        crosses_antimeridian,
        source_snap_km,
        destination_snap_km,
    }
}

/// Continuity correction: shift each coordinate by ∓360° relative to its
/// predecessor when the raw difference exceeds 180°, so the rendered line
/// never wraps across the whole map.
fn unwrap_longitudes(coordinates: &mut [[f64; 2]]) {
    for i in 1..coordinates.len() {
        let prev = coordinates[i - 1][0];
        let diff = coordinates[i][0] - prev;
        if diff > 180.0 {
            coordinates[i][0] -= 360.0;
        } else if diff < -180.0 {
            coordinates[i][0] += 360.0;
        }
    }
}
