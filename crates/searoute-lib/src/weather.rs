//! Marine weather seam used by the optional route refinement loop.
//!
//! The library never talks to a weather provider itself; callers hand in a
//! [`WeatherSource`] and the refinement loop samples it at edge midpoints.
//! Missing data is normal: `None` simply skips the penalty for that edge.

use serde::{Deserialize, Serialize};

/// Sea-state sample at a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveConditions {
    /// Significant wave height in metres.
    pub wave_height_m: f64,
    /// Direction waves arrive from, degrees clockwise from north
    /// (meteorological convention).
    pub wave_direction_deg: f64,
    /// Mean wave period in seconds.
    pub wave_period_s: f64,
}

/// Best-effort sea-state lookup.
pub trait WeatherSource: Send + Sync {
    fn fetch(&self, lat: f64, lon: f64) -> Option<WaveConditions>;
}

/// Source that reports no data anywhere; refinement over it is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWeather;

impl WeatherSource for NoWeather {
    fn fetch(&self, _lat: f64, _lon: f64) -> Option<WaveConditions> {
        None
    }
}

/// Uniform conditions everywhere; useful in tests and calibration runs.
#[derive(Debug, Clone, Copy)]
pub struct UniformWeather(pub WaveConditions);

impl WeatherSource for UniformWeather {
    fn fetch(&self, _lat: f64, _lon: f64) -> Option<WaveConditions> {
        Some(self.0)
    }
}
