//! End-to-end CLI tests: build a small world, inspect it, and route over it.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A small all-water square around the origin.
const POND_GEOJSON: &str = r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[-6,-6],[6,-6],[6,6],[-6,6],[-6,-6]]]}}]}"#;

struct TestEnv {
    _temp_dir: TempDir,
    ocean_path: PathBuf,
    graph_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let ocean_path = temp_dir.path().join("ocean.geojson");
        let graph_path = temp_dir.path().join("pond.graph");
        fs::write(&ocean_path, POND_GEOJSON).expect("write geometry fixture");
        Self {
            _temp_dir: temp_dir,
            ocean_path,
            graph_path,
        }
    }

    fn cli() -> Command {
        Command::cargo_bin("searoute-cli").expect("binary exists")
    }

    /// Build the pond graph. The default bounding box spans the globe, so a
    /// coarse spacing keeps the lattice tiny; passages are skipped because
    /// none of the built-in straits touch the pond.
    fn build_graph(&self) {
        Self::cli()
            .args([
                "build",
                "--ocean",
                self.ocean_path.to_str().unwrap(),
                "--spacing",
                "2",
                "--no-passages",
                "--output",
                self.graph_path.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Graph written to"));
    }
}

#[test]
fn no_arguments_prints_usage() {
    TestEnv::cli()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn info_fails_for_missing_graph() {
    TestEnv::cli()
        .args(["info", "/nonexistent/path.graph"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load graph"));
}

#[test]
fn build_info_route_round_trip() {
    let env = TestEnv::new();
    env.build_graph();

    TestEnv::cli()
        .args(["info", env.graph_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("nodes:"))
        .stdout(predicate::str::contains("passages applied: false"));

    TestEnv::cli()
        .args([
            "route",
            "--graph",
            env.graph_path.to_str().unwrap(),
            "--from",
            "-4,0",
            "--to",
            "4,0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total distance:"));
}

#[test]
fn route_emits_json_when_requested() {
    let env = TestEnv::new();
    env.build_graph();

    let output = TestEnv::cli()
        .args([
            "route",
            "--graph",
            env.graph_path.to_str().unwrap(),
            "--from",
            "-4,0",
            "--to",
            "4,0",
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert!(parsed["total_distance_km"].as_f64().unwrap() > 0.0);
    assert!(parsed["coordinates"].as_array().unwrap().len() >= 2);
}

#[test]
fn route_rejects_malformed_coordinates() {
    let env = TestEnv::new();
    env.build_graph();

    TestEnv::cli()
        .args([
            "route",
            "--graph",
            env.graph_path.to_str().unwrap(),
            "--from",
            "not-a-coordinate",
            "--to",
            "4,0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lon,lat"));
}

#[test]
fn route_reports_invalid_latitude() {
    let env = TestEnv::new();
    env.build_graph();

    TestEnv::cli()
        .args([
            "route",
            "--graph",
            env.graph_path.to_str().unwrap(),
            "--from",
            "-4,0",
            "--to",
            "4,95",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("latitude"));
}
