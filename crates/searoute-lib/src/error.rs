use std::path::PathBuf;

use thiserror::Error;

use crate::geodesy::Coordinate;

/// Convenient result alias for the sea routing library.
pub type Result<T> = std::result::Result<T, Error>;

/// Which end of a route query a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySide {
    Source,
    Destination,
}

impl std::fmt::Display for QuerySide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuerySide::Source => f.write_str("source"),
            QuerySide::Destination => f.write_str("destination"),
        }
    }
}

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A query coordinate fell outside the valid longitude/latitude ranges.
    #[error("invalid {side} coordinate [{}, {}]: {reason}", .coordinate.lon, .coordinate.lat)]
    InvalidCoordinate {
        side: QuerySide,
        coordinate: Coordinate,
        reason: String,
    },

    /// No graph node was found within the search budget of a query endpoint.
    /// Carries the nearest distance actually observed to aid diagnosis.
    #[error("no water node within {max_km:.0} km of {side}; nearest is {nearest_km:.1} km away")]
    NoNearbyNode {
        side: QuerySide,
        max_km: f64,
        nearest_km: f64,
    },

    /// The graph is disconnected between the located endpoints.
    #[error("no navigable path between the located endpoints")]
    NoPath,

    /// No graph could be loaded or built; fatal at process startup.
    #[error("no routing graph available: {reason}")]
    GraphUnavailable { reason: String },

    /// Malformed geometry input encountered while constructing the water test.
    #[error("geometry error in {context}: {message}")]
    Geometry { context: String, message: String },

    /// Raised when serializing a graph container fails.
    #[error("failed to serialize graph: {message}")]
    GraphStoreSerialize { message: String },

    /// Raised when loading a graph container from a file fails.
    #[error("failed to load graph from {path}: {message}")]
    GraphStoreLoad { path: PathBuf, message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON parsing errors (passage definitions, GeoJSON inputs).
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
