//! Ocean routing graph: water-restricted lattice nodes, port anchors, and
//! the augmented edges (passages, antimeridian crossings) layered on top.
//!
//! The graph is undirected: every logical edge is stored in both endpoints'
//! adjacency lists. Once built and augmented it is treated as read-mostly;
//! queries never mutate shared node or edge state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geodesy::Coordinate;

/// Stable node identifier within a single build run.
pub type NodeId = u32;

/// Classification of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Ocean,
    Port,
    Passage,
}

impl NodeKind {
    /// Water-capable nodes are eligible for traversal by the water-only
    /// weight function.
    pub fn is_water_capable(self) -> bool {
        matches!(self, NodeKind::Ocean | NodeKind::Port)
    }
}

/// Node within the routing graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub coordinates: Coordinate,
    pub kind: NodeKind,
    #[serde(default)]
    pub coastal: bool,
    /// Opaque key/value bag carried through from port source data.
    /// Always serialized: the persisted body is postcard, which cannot
    /// tolerate omitted fields.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl Node {
    pub fn ocean(id: NodeId, coordinates: Coordinate) -> Self {
        Self {
            id,
            coordinates,
            kind: NodeKind::Ocean,
            coastal: false,
            properties: HashMap::new(),
        }
    }

    pub fn port(id: NodeId, coordinates: Coordinate, properties: HashMap<String, String>) -> Self {
        Self {
            id,
            coordinates,
            kind: NodeKind::Port,
            coastal: true,
            properties,
        }
    }
}

/// Half-edge stored in a node's adjacency list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub target: NodeId,
    /// Geodesic length in kilometres; the persisted weight, never mutated
    /// by per-query adjustments.
    pub base_weight: f64,
    #[serde(default)]
    pub is_passage: bool,
    #[serde(default)]
    pub is_antimeridian_crossing: bool,
    #[serde(default)]
    pub is_temporary: bool,
    #[serde(default)]
    pub passage_name: Option<String>,
}

impl Edge {
    pub fn lattice(target: NodeId, base_weight: f64) -> Self {
        Self {
            target,
            base_weight,
            is_passage: false,
            is_antimeridian_crossing: false,
            is_temporary: false,
            passage_name: None,
        }
    }
}

/// Build parameters recorded with the graph for provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildParameters {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
    pub spacing_deg: f64,
    pub chunk_size_deg: f64,
}

impl Default for BuildParameters {
    fn default() -> Self {
        // Matches the production 1-degree world build: polar latitudes are
        // excluded because the lattice degenerates there.
        Self {
            lon_min: -180.0,
            lon_max: 180.0,
            lat_min: -60.0,
            lat_max: 60.0,
            spacing_deg: 1.0,
            chunk_size_deg: 20.0,
        }
    }
}

/// Derived statistics and idempotency flags persisted alongside the graph.
///
/// `passages_applied` and `antimeridian_connected` are not re-derivable from
/// structure alone; a reloaded graph relies on them to decide whether the
/// one-time augmentation passes still need to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub build_seconds: f64,
    pub built_at: chrono::DateTime<chrono::Utc>,
    pub passages_applied: bool,
    pub antimeridian_connected: bool,
    pub parameters: BuildParameters,
}

impl Default for GraphStats {
    fn default() -> Self {
        Self {
            node_count: 0,
            edge_count: 0,
            build_seconds: 0.0,
            built_at: chrono::Utc::now(),
            passages_applied: false,
            antimeridian_connected: false,
            parameters: BuildParameters::default(),
        }
    }
}

/// The ocean routing graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    nodes: HashMap<NodeId, Node>,
    adjacency: HashMap<NodeId, Vec<Edge>>,
    stats: GraphStats,
    /// Number of logical (undirected) edges.
    edge_count: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn stats(&self) -> &GraphStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut GraphStats {
        &mut self.stats
    }

    /// Refresh the derived counts in the stats record.
    pub fn sync_stats(&mut self) {
        self.stats.node_count = self.nodes.len();
        self.stats.edge_count = self.edge_count;
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Neighbours of a node; empty for unknown identifiers.
    pub fn neighbours(&self, id: NodeId) -> &[Edge] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Largest identifier currently in use, for allocating fresh ids after
    /// the chunked build assigned its ranges.
    pub fn max_node_id(&self) -> Option<NodeId> {
        self.nodes.keys().copied().max()
    }

    /// Insert a node, replacing any previous node with the same id.
    pub fn add_node(&mut self, node: Node) {
        self.adjacency.entry(node.id).or_default();
        self.nodes.insert(node.id, node);
    }

    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbours(a).iter().any(|edge| edge.target == b)
    }

    /// Add an undirected edge. Self-loops and duplicate pairs are rejected;
    /// returns whether the edge was inserted.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, edge: Edge) -> bool {
        if a == b || !self.nodes.contains_key(&a) || !self.nodes.contains_key(&b) {
            return false;
        }
        if self.has_edge(a, b) {
            return false;
        }

        let mut reverse = edge.clone();
        reverse.target = a;
        let mut forward = edge;
        forward.target = b;

        self.adjacency.entry(a).or_default().push(forward);
        self.adjacency.entry(b).or_default().push(reverse);
        self.edge_count += 1;
        true
    }

    /// Edge record between two nodes, if present.
    pub fn edge(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.neighbours(a).iter().find(|edge| edge.target == b)
    }

    /// Merge another graph's nodes and edges into this one. Node ids must
    /// already be globally unique (the chunked builder assigns offsets up
    /// front), so collisions indicate a builder bug and simply overwrite.
    pub fn merge(&mut self, other: Graph) {
        for (id, node) in other.nodes {
            self.adjacency.entry(id).or_default();
            self.nodes.insert(id, node);
        }
        // Re-add each logical edge once; adjacency carries both directions.
        for (source, edges) in other.adjacency {
            for edge in edges {
                if source < edge.target {
                    let target = edge.target;
                    self.add_edge(source, target, edge);
                }
            }
        }
    }
}
