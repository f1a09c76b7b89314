//! Water membership tests backed by ocean polygons and shipping lanes.
//!
//! The rest of the library only needs two predicates from its geometry
//! inputs: "is this point inside a water polygon" and "is this point within
//! the shipping-lane buffer". Ingestion and coordinate-system conversion
//! happen upstream; this module consumes GeoJSON that is already in WGS84.

use geo::{Contains, Distance, Euclidean, LineString, MultiLineString, MultiPolygon, Point, Polygon};
use geojson::GeoJson;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geodesy::Coordinate;

/// Approximate kilometres per degree, used to express the lane buffer in
/// degree space where the line-distance test runs.
const KM_PER_DEGREE: f64 = 111.0;

/// Default shipping-lane buffer in kilometres.
pub const DEFAULT_LANE_BUFFER_KM: f64 = 5.0;

/// Immutable collection of water polygons and shipping-lane features.
#[derive(Debug, Clone, Default)]
pub struct WaterGeometry {
    polygons: Vec<MultiPolygon<f64>>,
    lanes: Vec<LineString<f64>>,
    lane_buffer_deg: f64,
    /// Features dropped during construction because their geometry was
    /// malformed; surfaced in the build report.
    skipped_features: usize,
}

impl WaterGeometry {
    pub fn new(polygons: Vec<MultiPolygon<f64>>, lanes: Vec<LineString<f64>>) -> Self {
        Self {
            polygons,
            lanes,
            lane_buffer_deg: DEFAULT_LANE_BUFFER_KM / KM_PER_DEGREE,
            skipped_features: 0,
        }
    }

    /// Override the shipping-lane buffer (kilometres).
    pub fn with_lane_buffer_km(mut self, km: f64) -> Self {
        self.lane_buffer_deg = km / KM_PER_DEGREE;
        self
    }

    /// Parse water polygons from a GeoJSON document.
    ///
    /// Polygon and MultiPolygon features are accepted; anything else is
    /// skipped per-feature and counted rather than failing the whole load.
    pub fn from_geojson_str(ocean: &str, lanes: Option<&str>) -> Result<Self> {
        let mut geometry = Self::default();
        geometry.lane_buffer_deg = DEFAULT_LANE_BUFFER_KM / KM_PER_DEGREE;

        for value in geometry_values(ocean, "ocean polygons")? {
            match MultiPolygon::try_from(value.clone())
                .or_else(|_| Polygon::try_from(value).map(|p| MultiPolygon(vec![p])))
            {
                Ok(multi) => geometry.polygons.push(multi),
                Err(e) => {
                    warn!(error = %e, "skipping non-polygon ocean feature");
                    geometry.skipped_features += 1;
                }
            }
        }

        if let Some(lanes) = lanes {
            for value in geometry_values(lanes, "shipping lanes")? {
                match LineString::try_from(value.clone()) {
                    Ok(line) => geometry.lanes.push(line),
                    Err(_) => match MultiLineString::try_from(value) {
                        Ok(multi) => geometry.lanes.extend(multi.0),
                        Err(e) => {
                            warn!(error = %e, "skipping non-linear shipping lane feature");
                            geometry.skipped_features += 1;
                        }
                    },
                }
            }
        }

        debug!(
            polygons = geometry.polygons.len(),
            lanes = geometry.lanes.len(),
            skipped = geometry.skipped_features,
            "loaded water geometry"
        );

        if geometry.polygons.is_empty() && geometry.lanes.is_empty() {
            return Err(Error::Geometry {
                context: "ocean polygons".to_string(),
                message: "no usable water features found".to_string(),
            });
        }

        Ok(geometry)
    }

    /// Number of features dropped during parsing.
    pub fn skipped_features(&self) -> usize {
        self.skipped_features
    }

    /// Stable digest of the water mask. Build checkpoints carry it so a
    /// resumed run never mixes chunks from a different geometry.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for multi in &self.polygons {
            for polygon in &multi.0 {
                hash_line(&mut hasher, polygon.exterior());
                for ring in polygon.interiors() {
                    hash_line(&mut hasher, ring);
                }
            }
        }
        for lane in &self.lanes {
            hash_line(&mut hasher, lane);
        }
        hasher.update(self.lane_buffer_deg.to_le_bytes());
        hasher.finalize().into()
    }

    /// Point-in-polygon test against the water polygon set.
    pub fn contains(&self, coord: Coordinate) -> bool {
        let point = Point::new(coord.lon, coord.lat);
        self.polygons.iter().any(|poly| poly.contains(&point))
    }

    /// Distance in kilometres from a point to the nearest shipping lane.
    pub fn lane_distance_km(&self, coord: Coordinate) -> Option<f64> {
        let point = Point::new(coord.lon, coord.lat);
        self.lanes
            .iter()
            .map(|lane| Euclidean.distance(&point, lane) * KM_PER_DEGREE)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// True when the coordinate lies in open water or inside the
    /// shipping-lane buffer.
    pub fn is_water(&self, coord: Coordinate) -> bool {
        if self.contains(coord) {
            return true;
        }
        let point = Point::new(coord.lon, coord.lat);
        self.lanes
            .iter()
            .any(|lane| Euclidean.distance(&point, lane) < self.lane_buffer_deg)
    }

    /// Convenience constructor for a single rectangular water area, used by
    /// tests and small fixtures.
    pub fn rectangle(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Self {
        let ring = LineString::from(vec![
            (lon_min, lat_min),
            (lon_max, lat_min),
            (lon_max, lat_max),
            (lon_min, lat_max),
            (lon_min, lat_min),
        ]);
        Self::new(vec![MultiPolygon(vec![Polygon::new(ring, vec![])])], Vec::new())
    }
}

fn hash_line(hasher: &mut Sha256, line: &LineString<f64>) {
    for coord in line.coords() {
        hasher.update(coord.x.to_le_bytes());
        hasher.update(coord.y.to_le_bytes());
    }
}

/// Extract the geometry values from a GeoJSON document, accepting
/// FeatureCollection, GeometryCollection, single Feature, and bare Geometry
/// shapes the way the upstream data is actually published.
fn geometry_values(input: &str, context: &str) -> Result<Vec<geojson::Value>> {
    let parsed: GeoJson = input.parse().map_err(|e: geojson::Error| Error::Geometry {
        context: context.to_string(),
        message: e.to_string(),
    })?;

    let mut values = Vec::new();
    match parsed {
        GeoJson::FeatureCollection(collection) => {
            for feature in collection.features {
                if let Some(geometry) = feature.geometry {
                    collect_values(geometry.value, &mut values);
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(geometry) = feature.geometry {
                collect_values(geometry.value, &mut values);
            }
        }
        GeoJson::Geometry(geometry) => collect_values(geometry.value, &mut values),
    }
    Ok(values)
}

fn collect_values(value: geojson::Value, out: &mut Vec<geojson::Value>) {
    match value {
        geojson::Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_values(geometry.value, out);
            }
        }
        other => out.push(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_contains_interior_point() {
        let water = WaterGeometry::rectangle(-10.0, -10.0, 10.0, 10.0);
        assert!(water.is_water(Coordinate::new(0.0, 0.0)));
        assert!(!water.is_water(Coordinate::new(20.0, 0.0)));
    }

    #[test]
    fn lane_buffer_admits_nearby_points() {
        let lane = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
        let water = WaterGeometry::new(Vec::new(), vec![lane]).with_lane_buffer_km(10.0);
        // ~0.04 degrees north of the lane: about 4.4 km, inside the buffer.
        assert!(water.is_water(Coordinate::new(0.5, 0.04)));
        assert!(!water.is_water(Coordinate::new(0.5, 1.0)));
    }

    #[test]
    fn geojson_polygon_feature_parses() {
        let ocean = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-5,-5],[5,-5],[5,5],[-5,5],[-5,-5]]]
                }
            }]
        }"#;
        let water = WaterGeometry::from_geojson_str(ocean, None).unwrap();
        assert!(water.contains(Coordinate::new(0.0, 0.0)));
        assert!(!water.contains(Coordinate::new(6.0, 0.0)));
        assert_eq!(water.skipped_features(), 0);
    }

    #[test]
    fn malformed_features_are_skipped_not_fatal() {
        let ocean = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {"type": "Point", "coordinates": [0, 0]}
                },
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-5,-5],[5,-5],[5,5],[-5,5],[-5,-5]]]
                    }
                }
            ]
        }"#;
        let water = WaterGeometry::from_geojson_str(ocean, None).unwrap();
        assert_eq!(water.skipped_features(), 1);
        assert!(water.contains(Coordinate::new(0.0, 0.0)));
    }
}
