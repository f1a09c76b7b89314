//! Chunked construction of the water-restricted lattice graph.
//!
//! The bounding box is partitioned into rectangular chunks that build
//! independently (and in parallel): each chunk enumerates its lattice
//! points, keeps the water ones as Ocean nodes, and connects intra-chunk
//! neighbours. Node-id ranges are assigned from each chunk's lattice
//! capacity *before* any chunk runs, so the per-chunk work shares nothing.
//!
//! Chunk-local adjacency cannot see across seams, so after merging a
//! batched full pair re-scan adds the boundary edges the chunks missed.
//! That pass is O(n²) by construction; the batch size bounds peak memory
//! and is a first-class parameter rather than a constant.

use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::geodesy::{distance_km, Coordinate};
use crate::geometry::WaterGeometry;
use crate::graph::{BuildParameters, Edge, Graph, Node, NodeId};

/// Slack factor on the lattice spacing when testing adjacency. Tolerates
/// floating-point jitter and keeps diagonal lattice neighbours connected.
const ADJACENCY_SLACK: f64 = 1.1;

/// Default boundary-stitching batch size (nodes per outer batch).
pub const DEFAULT_STITCH_BATCH_SIZE: usize = 500;

/// A port to anchor into the graph at its real-world coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub coordinates: Coordinate,
    #[serde(default)]
    pub properties: std::collections::HashMap<String, String>,
}

/// Summary of a build run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub chunks: usize,
    pub resumed_chunks: usize,
    pub lattice_points: usize,
    pub ocean_nodes: usize,
    pub ports_added: usize,
    pub intra_chunk_edges: usize,
    pub boundary_edges: usize,
    pub skipped_features: usize,
    pub duration_seconds: f64,
}

/// One rectangular cell of the build partition.
#[derive(Debug, Clone, Copy)]
struct Chunk {
    index: usize,
    lon_min: f64,
    lon_max: f64,
    lat_min: f64,
    lat_max: f64,
    /// First node id this chunk may assign.
    id_offset: NodeId,
}

/// Builds the lattice graph from water geometry and a port list.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    parameters: BuildParameters,
    stitch_batch_size: usize,
    /// When set, finished chunk graphs are checkpointed here so a crashed
    /// build resumes without redoing them.
    checkpoint_dir: Option<PathBuf>,
}

impl GridBuilder {
    pub fn new(parameters: BuildParameters) -> Self {
        Self {
            parameters,
            stitch_batch_size: DEFAULT_STITCH_BATCH_SIZE,
            checkpoint_dir: None,
        }
    }

    pub fn with_stitch_batch_size(mut self, batch_size: usize) -> Self {
        self.stitch_batch_size = batch_size.max(1);
        self
    }

    pub fn with_checkpoint_dir(mut self, dir: PathBuf) -> Self {
        self.checkpoint_dir = Some(dir);
        self
    }

    /// Build the full graph: parallel chunk phase, merge, global port
    /// assignment, then boundary stitching.
    pub fn build(&self, water: &WaterGeometry, ports: &[Port]) -> Result<(Graph, BuildReport)> {
        let started = Instant::now();
        let geometry_digest = water.fingerprint();
        let chunks = self.partition();
        info!(
            chunks = chunks.len(),
            spacing_deg = self.parameters.spacing_deg,
            "starting chunked graph build"
        );

        let mut report = BuildReport {
            chunks: chunks.len(),
            skipped_features: water.skipped_features(),
            ..BuildReport::default()
        };

        // Chunk phase: embarrassingly parallel, no shared mutable state.
        let chunk_results: Vec<(Graph, usize, bool)> = chunks
            .par_iter()
            .map(|chunk| self.build_or_resume_chunk(chunk, water, &geometry_digest))
            .collect();

        // Merge phase: single writer.
        let mut graph = Graph::new();
        for (chunk_graph, lattice_points, resumed) in chunk_results {
            report.lattice_points += lattice_points;
            report.intra_chunk_edges += chunk_graph.edge_count();
            if resumed {
                report.resumed_chunks += 1;
            }
            graph.merge(chunk_graph);
        }
        report.ocean_nodes = graph.node_count();
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "merged chunk graphs"
        );

        // Ports are global, assigned exactly once after chunk processing.
        let mut next_id = graph.max_node_id().map(|id| id + 1).unwrap_or(0);
        for port in ports {
            let coordinates = port.coordinates.normalized();
            let mut properties = port.properties.clone();
            properties.insert("name".to_string(), port.name.clone());
            graph.add_node(Node::port(next_id, coordinates, properties));
            next_id += 1;
            report.ports_added += 1;
        }

        report.boundary_edges = self.stitch_boundaries(&mut graph);

        graph.stats_mut().parameters = self.parameters.clone();
        graph.stats_mut().build_seconds = started.elapsed().as_secs_f64();
        graph.stats_mut().built_at = chrono::Utc::now();
        graph.sync_stats();
        report.duration_seconds = started.elapsed().as_secs_f64();

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            boundary_edges = report.boundary_edges,
            seconds = format!("{:.1}", report.duration_seconds).as_str(),
            "graph build finished"
        );
        Ok((graph, report))
    }

    /// Partition the bounding box into chunks and pre-assign id ranges from
    /// lattice capacity, independent of how many points turn out to be water.
    fn partition(&self) -> Vec<Chunk> {
        let p = &self.parameters;
        let mut chunks = Vec::new();
        let mut offset: NodeId = 0;
        let mut index = 0;

        let mut lat = p.lat_min;
        while lat < p.lat_max {
            let lat_max = (lat + p.chunk_size_deg).min(p.lat_max);
            let mut lon = p.lon_min;
            while lon < p.lon_max {
                let lon_max = (lon + p.chunk_size_deg).min(p.lon_max);
                let capacity = lattice_steps(lat, lat_max, p.spacing_deg)
                    * lattice_steps(lon, lon_max, p.spacing_deg);
                chunks.push(Chunk {
                    index,
                    lon_min: lon,
                    lon_max,
                    lat_min: lat,
                    lat_max,
                    id_offset: offset,
                });
                offset += capacity as NodeId;
                index += 1;
                lon = lon_max;
            }
            lat = lat_max;
        }
        chunks
    }

    fn build_or_resume_chunk(
        &self,
        chunk: &Chunk,
        water: &WaterGeometry,
        geometry_digest: &[u8; 32],
    ) -> (Graph, usize, bool) {
        if let Some(resumed) = self.load_checkpoint(chunk, geometry_digest) {
            debug!(chunk = chunk.index, "resumed chunk from checkpoint");
            return (resumed, 0, true);
        }

        let (graph, lattice_points) = self.build_chunk(chunk, water);
        self.save_checkpoint(chunk, geometry_digest, &graph);
        (graph, lattice_points, false)
    }

    /// Enumerate the chunk lattice, keep water points as Ocean nodes, and
    /// connect intra-chunk neighbours.
    fn build_chunk(&self, chunk: &Chunk, water: &WaterGeometry) -> (Graph, usize) {
        let spacing = self.parameters.spacing_deg;
        let lat_steps = lattice_steps(chunk.lat_min, chunk.lat_max, spacing);
        let lon_steps = lattice_steps(chunk.lon_min, chunk.lon_max, spacing);

        let mut graph = Graph::new();
        let mut lattice_points = 0;

        for lat_i in 0..lat_steps {
            for lon_i in 0..lon_steps {
                lattice_points += 1;
                let coord = Coordinate::new(
                    chunk.lon_min + lon_i as f64 * spacing,
                    chunk.lat_min + lat_i as f64 * spacing,
                );
                // Anything the water test rejects is treated as land.
                if !water.is_water(coord) {
                    continue;
                }
                let local_index = (lat_i * lon_steps + lon_i) as NodeId;
                graph.add_node(Node::ocean(chunk.id_offset + local_index, coord));
            }
        }

        let nodes: Vec<(NodeId, Coordinate)> = {
            let mut v: Vec<_> = graph.nodes().map(|n| (n.id, n.coordinates)).collect();
            v.sort_by_key(|(id, _)| *id);
            v
        };
        let threshold = spacing * ADJACENCY_SLACK;
        for (i, &(a, coord_a)) in nodes.iter().enumerate() {
            for &(b, coord_b) in &nodes[i + 1..] {
                if within_lattice_step(coord_a, coord_b, threshold) {
                    let weight = distance_km(coord_a, coord_b);
                    graph.add_edge(a, b, Edge::lattice(b, weight));
                }
            }
        }

        debug!(
            chunk = chunk.index,
            lattice_points,
            ocean_nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built chunk"
        );
        (graph, lattice_points)
    }

    /// Re-scan all node pairs for missing adjacency across chunk seams.
    /// Chunk-local passes already covered interior pairs, so only seam pairs
    /// actually insert; the scan is batched to bound peak memory.
    fn stitch_boundaries(&self, graph: &mut Graph) -> usize {
        let nodes: Vec<(NodeId, Coordinate)> = {
            let mut v: Vec<_> = graph.nodes().map(|n| (n.id, n.coordinates)).collect();
            v.sort_by_key(|(id, _)| *id);
            v
        };
        let threshold = self.parameters.spacing_deg * ADJACENCY_SLACK;
        let total = nodes.len();
        let mut added = 0;

        for batch_start in (0..total).step_by(self.stitch_batch_size) {
            let batch_end = (batch_start + self.stitch_batch_size).min(total);
            let mut pending: Vec<(NodeId, NodeId, f64)> = Vec::new();

            for j in batch_start..batch_end {
                let (a, coord_a) = nodes[j];
                for &(b, coord_b) in &nodes[j + 1..] {
                    if !within_lattice_step(coord_a, coord_b, threshold) {
                        continue;
                    }
                    if graph.has_edge(a, b) {
                        continue;
                    }
                    pending.push((a, b, distance_km(coord_a, coord_b)));
                }
            }

            for (a, b, weight) in pending {
                if graph.add_edge(a, b, Edge::lattice(b, weight)) {
                    added += 1;
                }
            }
            debug!(
                batch_start,
                batch_end, added, "boundary stitching progress"
            );
        }

        added
    }

    fn checkpoint_path(&self, chunk: &Chunk) -> Option<PathBuf> {
        self.checkpoint_dir
            .as_ref()
            .map(|dir| dir.join(format!("chunk_{:04}.bin", chunk.index)))
    }

    /// A checkpoint only counts when it was produced by the same parameters
    /// and the same water geometry; anything else gets rebuilt.
    fn load_checkpoint(&self, chunk: &Chunk, geometry_digest: &[u8; 32]) -> Option<Graph> {
        let path = self.checkpoint_path(chunk)?;
        let bytes = std::fs::read(&path).ok()?;
        match postcard::from_bytes::<(BuildParameters, [u8; 32], Graph)>(&bytes) {
            Ok((parameters, digest, graph))
                if parameters == self.parameters && digest == *geometry_digest =>
            {
                Some(graph)
            }
            Ok(_) => {
                warn!(
                    path = %path.display(),
                    "chunk checkpoint belongs to a different build; rebuilding chunk"
                );
                None
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring unreadable chunk checkpoint"
                );
                None
            }
        }
    }

    fn save_checkpoint(&self, chunk: &Chunk, geometry_digest: &[u8; 32], graph: &Graph) {
        let Some(path) = self.checkpoint_path(chunk) else {
            return;
        };
        let result = postcard::to_allocvec(&(&self.parameters, geometry_digest, graph))
            .map_err(|e| e.to_string())
            .and_then(|bytes| std::fs::write(&path, bytes).map_err(|e| e.to_string()));
        if let Err(e) = result {
            // Checkpoints are an optimization; a failed write never fails
            // the build.
            warn!(path = %path.display(), error = %e, "failed to write chunk checkpoint");
        }
    }
}

/// Number of lattice points in `[min, max)` at the given spacing.
fn lattice_steps(min: f64, max: f64, spacing: f64) -> usize {
    if max <= min || spacing <= 0.0 {
        return 0;
    }
    (((max - min) / spacing) - 1e-9).floor() as usize + 1
}

/// Lattice adjacency test: within the slacked spacing on both axes.
fn within_lattice_step(a: Coordinate, b: Coordinate, threshold: f64) -> bool {
    (a.lon - b.lon).abs() <= threshold && (a.lat - b.lat).abs() <= threshold
}
