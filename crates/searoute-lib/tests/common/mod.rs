//! Shared fixtures: a synthetic two-basin world with a land barrier that is
//! only passable far to the south or through a canal passage.

#![allow(dead_code)]

use std::collections::HashMap;

use searoute_lib::{
    apply_passages, BuildParameters, Coordinate, Graph, GridBuilder, Passage, Port, WaterGeometry,
};

/// West basin, east basin, and a southern strip joining them below -57°.
/// The column of lattice points at longitude -80 is the only land.
pub fn americas_geojson() -> String {
    let basin = |lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64| {
        format!(
            r#"{{"type":"Feature","properties":{{}},"geometry":{{"type":"Polygon","coordinates":[[[{lon_min},{lat_min}],[{lon_max},{lat_min}],[{lon_max},{lat_max}],[{lon_min},{lat_max}],[{lon_min},{lat_min}]]]}}}}"#
        )
    };
    format!(
        r#"{{"type":"FeatureCollection","features":[{},{},{}]}}"#,
        basin(-141.0, -59.0, -81.0, 61.0),
        basin(-79.0, -59.0, -19.0, 61.0),
        basin(-141.0, -61.0, -19.0, -57.0),
    )
}

pub fn americas_water() -> WaterGeometry {
    WaterGeometry::from_geojson_str(&americas_geojson(), None).expect("fixture geometry parses")
}

pub fn americas_parameters() -> BuildParameters {
    BuildParameters {
        lon_min: -140.0,
        lon_max: -20.0,
        lat_min: -60.0,
        lat_max: 60.0,
        spacing_deg: 2.0,
        chunk_size_deg: 20.0,
    }
}

pub fn americas_ports() -> Vec<Port> {
    vec![
        Port {
            name: "New York".to_string(),
            coordinates: Coordinate::new(-74.0060, 40.7128),
            properties: HashMap::new(),
        },
        Port {
            name: "Los Angeles".to_string(),
            coordinates: Coordinate::new(-118.2426, 33.7292),
            properties: HashMap::new(),
        },
    ]
}

pub fn canal_passage() -> Passage {
    Passage {
        name: "Panama Canal".to_string(),
        endpoints: [Coordinate::new(-82.2, 9.0), Coordinate::new(-77.8, 9.0)],
        weight_multiplier: 0.5,
    }
}

/// Build the two-basin world without the canal.
pub fn build_americas() -> Graph {
    let water = americas_water();
    let builder = GridBuilder::new(americas_parameters());
    let (graph, _report) = builder
        .build(&water, &americas_ports())
        .expect("fixture world builds");
    graph
}

/// Build the two-basin world and cut the canal through the barrier.
pub fn build_americas_with_canal() -> Graph {
    let mut graph = build_americas();
    let report = apply_passages(&mut graph, &[canal_passage()]);
    assert_eq!(report.added, 1, "canal fixture must attach: {:?}", report.skipped);
    graph
}

/// A small all-water world centred on the origin.
pub fn build_pond() -> Graph {
    let water = WaterGeometry::rectangle(-4.0, -4.0, 4.0, 4.0);
    let parameters = BuildParameters {
        lon_min: -3.0,
        lon_max: 3.0,
        lat_min: -3.0,
        lat_max: 3.0,
        spacing_deg: 1.0,
        chunk_size_deg: 3.0,
    };
    let (graph, _) = GridBuilder::new(parameters)
        .build(&water, &[])
        .expect("pond builds");
    graph
}
