//! Spherical distance primitives and antimeridian-aware helpers.
//!
//! All distances are great-circle kilometres on a spherical Earth
//! (R = 6371 km). Longitudes are wrapped into [-180, 180] and latitudes
//! clamped into [-90, 90] before any trigonometry, so callers may pass
//! unnormalized coordinates (for example a longitude shifted by 360° during
//! antimeridian handling).

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Flat-Earth fallback scale: kilometres per degree at the equator.
const KM_PER_DEGREE: f64 = 111.0;

/// A `[longitude, latitude]` pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Wrap longitude into [-180, 180] and clamp latitude into [-90, 90].
    pub fn normalized(self) -> Self {
        Self {
            lon: ((self.lon + 180.0).rem_euclid(360.0)) - 180.0,
            lat: self.lat.clamp(-90.0, 90.0),
        }
    }

    /// True when both components are within the valid geographic ranges.
    pub fn is_valid(self) -> bool {
        (-180.0..=180.0).contains(&self.lon) && (-90.0..=90.0).contains(&self.lat)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        [value.lon, value.lat]
    }
}

/// Outcome of a distance computation.
///
/// `degraded` marks the flat-Earth fallback taken when the haversine
/// arithmetic produced a non-finite value. Callers that must distinguish
/// exact from approximate results check the flag; most use [`distance_km`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceOutcome {
    pub km: f64,
    pub degraded: bool,
}

/// Great-circle distance between two coordinates via the haversine formula.
///
/// The squared-half-chord term is clamped into [0, 1] before the inverse
/// step so floating-point overshoot near antipodal points cannot produce a
/// domain error. A non-finite result falls back to a 111 km/degree planar
/// approximation and is reported as degraded.
pub fn haversine(a: Coordinate, b: Coordinate) -> DistanceOutcome {
    let a = a.normalized();
    let b = b.normalized();

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    let km = EARTH_RADIUS_KM * c;

    if km.is_finite() {
        DistanceOutcome { km, degraded: false }
    } else {
        let fallback = ((b.lon - a.lon).powi(2) + (b.lat - a.lat).powi(2)).sqrt() * KM_PER_DEGREE;
        warn!(
            from = ?a,
            to = ?b,
            "haversine produced a non-finite value, using planar approximation"
        );
        DistanceOutcome {
            km: if fallback.is_finite() { fallback } else { 0.0 },
            degraded: true,
        }
    }
}

/// Great-circle distance in kilometres, ignoring the degraded flag.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    haversine(a, b).km
}

/// Distance that accounts for antimeridian wrapping.
///
/// When the raw longitude difference exceeds `wrap_threshold` degrees the
/// western point is shifted by +360° so the pair becomes adjacent, and the
/// crossing is reported to the caller.
pub fn wrapped_distance(a: Coordinate, b: Coordinate, wrap_threshold: f64) -> (f64, bool) {
    let a = a.normalized();
    let b = b.normalized();

    let lon_diff = (a.lon - b.lon).abs();
    if lon_diff <= wrap_threshold {
        return (distance_km(a, b), false);
    }

    let (wrapped_a, wrapped_b) = if a.lon < 0.0 {
        (Coordinate::new(a.lon + 360.0, a.lat), b)
    } else {
        (a, Coordinate::new(b.lon + 360.0, b.lat))
    };

    (distance_km(wrapped_a, wrapped_b), true)
}

/// Initial great-circle bearing from `a` to `b` in degrees, normalized into
/// [0, 360).
pub fn bearing_deg(a: Coordinate, b: Coordinate) -> f64 {
    let a = a.normalized();
    let b = b.normalized();

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    (y.atan2(x).to_degrees() + 360.0).rem_euclid(360.0)
}

/// Absolute angular difference between two headings, normalized into [0, 180].
pub fn direction_difference_deg(heading: f64, other: f64) -> f64 {
    let diff = (heading - other).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Midpoint of two coordinates, adjusted so a pair straddling the
/// antimeridian averages on the short arc instead of across the whole map.
pub fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
    let a = a.normalized();
    let mut b = b.normalized();

    if (a.lon - b.lon).abs() > 180.0 {
        if a.lon < 0.0 {
            b.lon -= 360.0;
        } else {
            b.lon += 360.0;
        }
    }

    Coordinate::new((a.lon + b.lon) / 2.0, (a.lat + b.lat) / 2.0).normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (Coordinate::new(0.0, 0.0), Coordinate::new(10.0, 10.0)),
            (Coordinate::new(-74.0, 40.7), Coordinate::new(139.7, 35.7)),
            (Coordinate::new(-179.5, -30.0), Coordinate::new(179.5, -30.5)),
        ];
        for (a, b) in pairs {
            assert_eq!(distance_km(a, b), distance_km(b, a));
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = Coordinate::new(12.5, -33.3);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn known_distance_london_paris() {
        let london = Coordinate::new(-0.1276, 51.5072);
        let paris = Coordinate::new(2.3522, 48.8566);
        let d = distance_km(london, paris);
        assert!((330.0..360.0).contains(&d), "got {d}");
    }

    #[test]
    fn normalization_wraps_longitude() {
        let p = Coordinate::new(190.0, 95.0).normalized();
        assert_eq!(p.lon, -170.0);
        assert_eq!(p.lat, 90.0);
    }

    #[test]
    fn wrapped_distance_crosses_antimeridian() {
        let west = Coordinate::new(-179.0, 10.0);
        let east = Coordinate::new(179.0, 10.0);
        let (km, crossed) = wrapped_distance(west, east, 180.0);
        assert!(crossed);
        // ~2 degrees of longitude at lat 10: roughly 219 km, far from the
        // naive ~39,800 km taken the long way around.
        assert!((180.0..260.0).contains(&km), "got {km}");
    }

    #[test]
    fn wrapped_distance_reports_no_crossing_for_adjacent_points() {
        let a = Coordinate::new(10.0, 0.0);
        let b = Coordinate::new(12.0, 0.0);
        let (km, crossed) = wrapped_distance(a, b, 180.0);
        assert!(!crossed);
        assert!((200.0..250.0).contains(&km), "got {km}");
    }

    #[test]
    fn haversine_is_exact_for_finite_inputs() {
        let outcome = haversine(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0));
        assert!(!outcome.degraded);
    }

    #[test]
    fn haversine_degrades_on_non_finite_input() {
        let outcome = haversine(Coordinate::new(f64::NAN, 0.0), Coordinate::new(1.0, 1.0));
        assert!(outcome.degraded);
        assert!(outcome.km.is_finite());
    }

    #[test]
    fn bearing_due_east() {
        let b = bearing_deg(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((b - 90.0).abs() < 1e-6, "got {b}");
    }

    #[test]
    fn direction_difference_is_bounded() {
        assert_eq!(direction_difference_deg(350.0, 10.0), 20.0);
        assert_eq!(direction_difference_deg(0.0, 180.0), 180.0);
        assert_eq!(direction_difference_deg(90.0, 90.0), 0.0);
    }

    #[test]
    fn midpoint_takes_short_arc_over_antimeridian() {
        let m = midpoint(Coordinate::new(-179.0, 0.0), Coordinate::new(179.0, 0.0));
        assert!(m.lon.abs() > 179.0 || (m.lon - 180.0).abs() < 1.0, "got {m:?}");
    }
}
