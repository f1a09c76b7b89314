//! End-to-end route planning: validate the request, snap both endpoints to
//! water nodes, search, optionally refine against wave conditions, and
//! reconstruct the result.
//!
//! Weather never touches the shared graph. Each refinement iteration samples
//! conditions at the midpoints of the current best path's edges and writes
//! adjusted weights into a per-request [`WeightOverlay`], so concurrent
//! queries stay lock-free.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, QuerySide, Result};
use crate::geodesy::{self, Coordinate};
use crate::graph::{Graph, NodeId};
use crate::locate::{locate, LocateOptions, LocateOutcome, NearestNode};
use crate::route::{self, RouteSummary};
use crate::search::{self, SearchResult, WeightOverlay};
use crate::weather::WeatherSource;

/// Wave-height penalties are divided by this before scaling an edge weight,
/// so a 10 m head sea at worst doubles the edge cost.
const WEATHER_PENALTY_SCALE: f64 = 10.0;

/// Upper bound on refinement rounds regardless of what the caller asks for.
pub const MAX_WEATHER_ITERATIONS: u32 = 3;

/// Default snap radius for query endpoints, in kilometres.
pub const DEFAULT_MAX_SNAP_KM: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchAlgorithm {
    Dijkstra,
    AStar,
}

/// Vessel characteristics used for the time and fuel estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselProfile {
    pub speed_km_per_hour: f64,
    pub fuel_consumption_per_km: f64,
    pub kind: String,
}

impl Default for VesselProfile {
    fn default() -> Self {
        Self {
            speed_km_per_hour: 20.0,
            fuel_consumption_per_km: 1.0,
            kind: "cargo".to_string(),
        }
    }
}

/// A single routing request.
#[derive(Debug, Clone)]
pub struct RouteQuery {
    pub source: Coordinate,
    pub destination: Coordinate,
    pub vessel: VesselProfile,
    pub algorithm: SearchAlgorithm,
    /// Refinement rounds when a weather source is supplied; clamped to
    /// [`MAX_WEATHER_ITERATIONS`].
    pub weather_iterations: u32,
    pub max_snap_distance_km: f64,
}

impl RouteQuery {
    pub fn new(source: Coordinate, destination: Coordinate) -> Self {
        Self {
            source,
            destination,
            vessel: VesselProfile::default(),
            algorithm: SearchAlgorithm::AStar,
            weather_iterations: MAX_WEATHER_ITERATIONS,
            max_snap_distance_km: DEFAULT_MAX_SNAP_KM,
        }
    }
}

/// Plan a route without weather refinement.
pub fn plan_route(graph: &Graph, query: &RouteQuery) -> Result<RouteSummary> {
    plan(graph, query, None)
}

/// Plan a route and refine it against the given wave conditions.
pub fn plan_route_with_weather(
    graph: &Graph,
    query: &RouteQuery,
    weather: &dyn WeatherSource,
) -> Result<RouteSummary> {
    plan(graph, query, Some(weather))
}

fn plan(
    graph: &Graph,
    query: &RouteQuery,
    weather: Option<&dyn WeatherSource>,
) -> Result<RouteSummary> {
    if graph.node_count() == 0 {
        return Err(Error::GraphUnavailable {
            reason: "graph has no nodes; build or load one first".to_string(),
        });
    }

    let source = validate_endpoint(query.source, QuerySide::Source)?;
    let destination = validate_endpoint(query.destination, QuerySide::Destination)?;

    let start = snap_endpoint(graph, source, QuerySide::Source, query.max_snap_distance_km)?;
    let goal = snap_endpoint(
        graph,
        destination,
        QuerySide::Destination,
        query.max_snap_distance_km,
    )?;
    debug!(
        start = start.id,
        goal = goal.id,
        source_snap_km = start.distance_km,
        destination_snap_km = goal.distance_km,
        "query endpoints snapped"
    );

    let use_heuristic = query.algorithm == SearchAlgorithm::AStar;
    let initial = search::shortest_path(graph, start.id, goal.id, None, use_heuristic)
        .ok_or(Error::NoPath)?;

    let best = match weather {
        Some(provider) => refine_with_weather(graph, initial, provider, query, use_heuristic),
        None => initial,
    };

    info!(
        nodes = best.path.len(),
        cost = best.cost,
        "route found"
    );

    Ok(route::reconstruct(
        graph,
        &best.path,
        source,
        destination,
        &query.vessel,
        start.distance_km,
        goal.distance_km,
    ))
}

fn validate_endpoint(coordinate: Coordinate, side: QuerySide) -> Result<Coordinate> {
    if !coordinate.lon.is_finite() || !coordinate.lat.is_finite() {
        return Err(Error::InvalidCoordinate {
            side,
            coordinate,
            reason: "longitude and latitude must be finite".to_string(),
        });
    }
    if !(-180.0..=180.0).contains(&coordinate.lon) {
        return Err(Error::InvalidCoordinate {
            side,
            coordinate,
            reason: "longitude must be within [-180, 180]".to_string(),
        });
    }
    if !(-90.0..=90.0).contains(&coordinate.lat) {
        return Err(Error::InvalidCoordinate {
            side,
            coordinate,
            reason: "latitude must be within [-90, 90]".to_string(),
        });
    }
    Ok(coordinate)
}

fn snap_endpoint(
    graph: &Graph,
    coordinate: Coordinate,
    side: QuerySide,
    max_distance_km: f64,
) -> Result<NearestNode> {
    let options = LocateOptions::water_endpoint(max_distance_km);
    match locate(graph, coordinate, &options) {
        LocateOutcome::Found(nearest) => Ok(nearest),
        LocateOutcome::NotFound { nearest_km } => Err(Error::NoNearbyNode {
            side,
            max_km: max_distance_km,
            nearest_km,
        }),
    }
}

/// Iteratively re-weight sampled edges by wave conditions and re-search.
///
/// The overlay accumulates across iterations and always covers both the
/// incumbent's and the candidate's edges before the two are compared, so a
/// corridor can never win merely because its weather was never sampled.
/// Keeps the cheapest path seen under the accumulated overlay.
fn refine_with_weather(
    graph: &Graph,
    initial: SearchResult,
    weather: &dyn WeatherSource,
    query: &RouteQuery,
    use_heuristic: bool,
) -> SearchResult {
    let iterations = query.weather_iterations.min(MAX_WEATHER_ITERATIONS);
    let mut best = initial;
    let start = best.path[0];
    let goal = *best.path.last().unwrap_or(&start);
    let mut overlay = WeightOverlay::default();

    for iteration in 0..iterations {
        sample_into_overlay(graph, &best.path, weather, &mut overlay);
        if overlay.is_empty() {
            debug!(iteration, "no weather adjustments sampled; stopping refinement");
            break;
        }

        let Some(candidate) =
            search::shortest_path(graph, start, goal, Some(&overlay), use_heuristic)
        else {
            break;
        };
        if candidate.path == best.path {
            best.cost = candidate.cost;
            break;
        }

        sample_into_overlay(graph, &candidate.path, weather, &mut overlay);
        let candidate_cost = path_cost(graph, &candidate.path, &overlay);
        let incumbent_cost = path_cost(graph, &best.path, &overlay);
        debug!(
            iteration,
            candidate_cost, incumbent_cost, "weather refinement pass"
        );
        if candidate_cost < incumbent_cost {
            best = SearchResult {
                path: candidate.path,
                cost: candidate_cost,
            };
        } else {
            best.cost = incumbent_cost;
        }
    }

    best
}

/// Sample wave conditions at each edge midpoint of `path` and write the
/// adjusted weights into `overlay`. Head seas (waves opposing the heading)
/// raise the cost, following seas lower it slightly. Already-sampled pairs
/// and edges without wave data keep their current weight.
fn sample_into_overlay(
    graph: &Graph,
    path: &[NodeId],
    weather: &dyn WeatherSource,
    overlay: &mut WeightOverlay,
) {
    for pair in path.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if overlay.get(from, to).is_some() {
            continue;
        }
        let (Some(a), Some(b)) = (graph.node(from), graph.node(to)) else {
            continue;
        };
        let Some(edge) = graph.edge(from, to) else {
            continue;
        };
        let midpoint = geodesy::midpoint(a.coordinates, b.coordinates);
        let Some(conditions) = weather.fetch(midpoint.lat, midpoint.lon) else {
            continue;
        };
        let heading = geodesy::bearing_deg(a.coordinates, b.coordinates);
        let difference = geodesy::direction_difference_deg(heading, conditions.wave_direction_deg);
        let penalty = conditions.wave_height_m * difference.to_radians().cos();
        let adjusted = edge.base_weight * (1.0 + penalty / WEATHER_PENALTY_SCALE);
        overlay.set(from, to, adjusted.max(0.0));
    }
}

fn path_cost(graph: &Graph, path: &[NodeId], overlay: &WeightOverlay) -> f64 {
    path.windows(2)
        .filter_map(|pair| {
            let edge = graph.edge(pair[0], pair[1])?;
            search::edge_weight(graph, pair[0], edge, Some(overlay))
        })
        .sum()
}
