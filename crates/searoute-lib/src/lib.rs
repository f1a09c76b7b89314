//! Sea-route engine library entry points.
//!
//! This crate builds a global ocean routing graph from water geometry,
//! augments it with maritime passages and antimeridian crossings, persists
//! it, and answers shortest-path queries between arbitrary coordinates.
//! Higher-level consumers (CLI, services) should only depend on the
//! functions exported here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod antimeridian;
pub mod builder;
pub mod error;
pub mod geodesy;
pub mod geometry;
pub mod graph;
pub mod locate;
pub mod passages;
pub mod query;
pub mod route;
pub mod search;
pub mod store;
pub mod weather;

pub use antimeridian::{connect_antimeridian, connect_antimeridian_default};
pub use builder::{BuildReport, GridBuilder, Port};
pub use error::{Error, QuerySide, Result};
pub use geodesy::Coordinate;
pub use geometry::WaterGeometry;
pub use graph::{BuildParameters, Graph, GraphStats, Node, NodeId, NodeKind};
pub use passages::{apply_passages, builtin_passages, passages_from_json, Passage};
pub use query::{plan_route, plan_route_with_weather, RouteQuery, SearchAlgorithm, VesselProfile};
pub use route::RouteSummary;
pub use store::{ensure_augmented, load_graph, save_graph, try_load_graph};
pub use weather::{NoWeather, UniformWeather, WaveConditions, WeatherSource};
