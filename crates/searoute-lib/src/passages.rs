//! Named maritime passage shortcuts (canals and straits).
//!
//! A passage becomes a single discounted edge between the graph nodes
//! nearest its two endpoints. The discount (< 1 multiplier) models the
//! navigational shortcut so the search prefers the passage over rounding a
//! landmass.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::geodesy::{distance_km, Coordinate};
use crate::graph::{Edge, Graph};
use crate::locate::{locate, LocateOptions, LocateOutcome};

/// Maximum snap distance from a passage endpoint to an existing node.
const ENDPOINT_MAX_DISTANCE_KM: f64 = 500.0;

/// A named navigable shortcut between two fixed endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub name: String,
    /// `[entry, exit]` coordinates; order does not matter for routing.
    pub endpoints: [Coordinate; 2],
    #[serde(default = "default_weight_multiplier")]
    pub weight_multiplier: f64,
}

fn default_weight_multiplier() -> f64 {
    0.8
}

/// Result of an augmentation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AugmentReport {
    pub added: usize,
    pub skipped: Vec<String>,
}

/// The built-in passage table used by the production world build.
pub fn builtin_passages() -> Vec<Passage> {
    let passage = |name: &str, a: [f64; 2], b: [f64; 2], multiplier: f64| Passage {
        name: name.to_string(),
        endpoints: [Coordinate::from(a), Coordinate::from(b)],
        weight_multiplier: multiplier,
    };

    vec![
        passage("Panama Canal", [-79.92, 9.38], [-79.57, 8.88], 0.5),
        passage("Suez Canal", [32.35, 31.23], [32.55, 29.93], 0.5),
        passage("Strait of Gibraltar", [-5.60, 35.97], [-5.03, 36.02], 0.8),
        passage("Strait of Malacca", [98.00, 6.00], [103.50, 1.43], 0.8),
        passage("Strait of Hormuz", [56.50, 26.57], [56.27, 26.20], 0.8),
        passage("Bab-el-Mandeb", [43.33, 12.58], [43.48, 12.38], 0.8),
        passage("Bosporus", [29.05, 41.22], [28.98, 41.00], 0.7),
        passage("English Channel", [-4.50, 49.50], [1.50, 51.00], 0.9),
    ]
}

/// Parse passage definitions from a JSON document of the form
/// `{"passages": [...]}` or a bare array.
pub fn passages_from_json(input: &str) -> crate::error::Result<Vec<Passage>> {
    #[derive(Deserialize)]
    struct Wrapper {
        passages: Vec<Passage>,
    }

    if let Ok(wrapper) = serde_json::from_str::<Wrapper>(input) {
        return Ok(wrapper.passages);
    }
    Ok(serde_json::from_str::<Vec<Passage>>(input)?)
}

/// Add a discounted shortcut edge per passage whose endpoints both snap to
/// existing nodes. Passages that cannot be anchored are skipped and
/// reported, never fatal. Sets the graph's `passages_applied` flag.
pub fn apply_passages(graph: &mut Graph, passages: &[Passage]) -> AugmentReport {
    let mut report = AugmentReport::default();
    let options = LocateOptions {
        allowed_kinds: None,
        max_distance_km: ENDPOINT_MAX_DISTANCE_KM,
        expand_radius: false,
        prefer_coastal: false,
    };

    for passage in passages {
        let entry = locate(graph, passage.endpoints[0], &options);
        let exit = locate(graph, passage.endpoints[1], &options);

        let (LocateOutcome::Found(entry), LocateOutcome::Found(exit)) = (entry, exit) else {
            warn!(passage = passage.name.as_str(), "no nearby node for passage endpoint, skipping");
            report.skipped.push(passage.name.clone());
            continue;
        };

        if entry.id == exit.id {
            warn!(passage = passage.name.as_str(), "passage endpoints snap to the same node, skipping");
            report.skipped.push(passage.name.clone());
            continue;
        }

        let weight = distance_km(passage.endpoints[0], passage.endpoints[1])
            * passage.weight_multiplier;
        let edge = Edge {
            target: exit.id,
            base_weight: weight,
            is_passage: true,
            is_antimeridian_crossing: false,
            is_temporary: false,
            passage_name: Some(passage.name.clone()),
        };
        if graph.add_edge(entry.id, exit.id, edge) {
            report.added += 1;
        }
    }

    graph.stats_mut().passages_applied = true;
    graph.sync_stats();
    info!(
        added = report.added,
        skipped = report.skipped.len(),
        "applied maritime passages"
    );
    report
}
