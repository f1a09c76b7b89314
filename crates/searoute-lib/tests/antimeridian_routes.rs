use searoute_lib::{
    connect_antimeridian_default, plan_route, BuildParameters, Coordinate, Graph, GridBuilder,
    RouteQuery, WaterGeometry,
};

/// An equatorial water band spanning the full longitude range.
fn dateline_world() -> Graph {
    let water = WaterGeometry::rectangle(-181.0, -5.0, 181.0, 5.0);
    let parameters = BuildParameters {
        lon_min: -180.0,
        lon_max: 180.0,
        lat_min: -4.0,
        lat_max: 4.0,
        spacing_deg: 2.0,
        chunk_size_deg: 20.0,
    };
    let (mut graph, _) = GridBuilder::new(parameters)
        .build(&water, &[])
        .expect("band builds");
    let added = connect_antimeridian_default(&mut graph);
    assert!(added > 0, "band fixture must gain wrap edges");
    graph
}

#[test]
fn route_crosses_the_dateline_instead_of_circling_the_globe() {
    let graph = dateline_world();
    let query = RouteQuery::new(Coordinate::new(176.0, 0.0), Coordinate::new(-176.0, 0.0));
    let summary = plan_route(&graph, &query).expect("route exists");

    assert!(summary.crosses_antimeridian);
    // The short way across is well under a tenth of the circumference.
    assert!(
        summary.total_distance_km < 2_500.0,
        "route went the long way: {} km",
        summary.total_distance_km
    );
}

#[test]
fn dateline_route_unwraps_cleanly() {
    let graph = dateline_world();
    let query = RouteQuery::new(Coordinate::new(178.0, 2.0), Coordinate::new(-178.0, -2.0));
    let summary = plan_route(&graph, &query).expect("route exists");

    for pair in summary.coordinates.windows(2) {
        assert!(
            (pair[1][0] - pair[0][0]).abs() <= 180.0,
            "longitude wrap between {:?} and {:?}",
            pair[0],
            pair[1]
        );
    }
    // Split points pin the crossing to the dateline itself.
    assert!(summary
        .coordinates
        .iter()
        .any(|c| c[0].abs() == 180.0));
}

#[test]
fn connecting_twice_adds_nothing() {
    let mut graph = dateline_world();
    let before = graph.edge_count();
    let added = connect_antimeridian_default(&mut graph);
    assert_eq!(added, 0);
    assert_eq!(graph.edge_count(), before);
}
