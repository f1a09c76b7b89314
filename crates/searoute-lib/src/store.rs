//! On-disk graph container.
//!
//! The routing graph takes minutes to build at production spacing, so it is
//! built once and persisted. The format is a versioned binary container:
//!
//! ```text
//! 16-byte header:
//!   magic       b"SRGF"   (4 bytes)
//!   version     u8
//!   flags       u8        bit 0: passages applied
//!                         bit 1: antimeridian connected
//!   node count  u32 LE
//!   reserved    6 bytes
//! body:
//!   the postcard-encoded Graph, zstd-compressed
//! 32-byte footer:
//!   SHA-256 digest of the compressed body
//! ```
//!
//! The flag bits mirror the augmentation markers inside the graph stats so a
//! loader can tell whether passages and antimeridian edges are already in
//! place without decompressing the body.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::antimeridian::connect_antimeridian_default;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::passages::{apply_passages, Passage};

/// First four bytes of every graph file.
const GRAPH_MAGIC: &[u8; 4] = b"SRGF";

/// Container version this build reads and writes.
const GRAPH_VERSION: u8 = 1;

/// Flag: passage edges have been applied.
const FLAG_PASSAGES_APPLIED: u8 = 0x01;

/// Flag: antimeridian crossings have been connected.
const FLAG_ANTIMERIDIAN_CONNECTED: u8 = 0x02;

const HEADER_SIZE: usize = 16;

/// SHA-256 digest length.
const CHECKSUM_SIZE: usize = 32;

/// zstd level; higher buys little on postcard output.
const COMPRESSION_LEVEL: i32 = 3;

/// Write a graph to disk in the container format above.
///
/// The header mirrors the graph's augmentation flags and node count so a
/// loader can inspect a file without decompressing it; the trailing digest
/// catches torn writes and bit rot.
pub fn save_graph(graph: &Graph, path: &Path) -> Result<()> {
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "writing graph container"
    );

    let serialized = postcard::to_allocvec(graph).map_err(|e| Error::GraphStoreSerialize {
        message: format!("postcard serialization failed: {}", e),
    })?;

    let compressed =
        zstd::encode_all(serialized.as_slice(), COMPRESSION_LEVEL).map_err(|e| {
            Error::GraphStoreSerialize {
                message: format!("zstd compression failed: {}", e),
            }
        })?;

    let checksum = Sha256::digest(&compressed);

    let stats = graph.stats();
    let mut flags = 0u8;
    if stats.passages_applied {
        flags |= FLAG_PASSAGES_APPLIED;
    }
    if stats.antimeridian_connected {
        flags |= FLAG_ANTIMERIDIAN_CONNECTED;
    }
    let node_count = graph.node_count() as u32;

    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(GRAPH_MAGIC);
    header[4] = GRAPH_VERSION;
    header[5] = flags;
    header[6..10].copy_from_slice(&node_count.to_le_bytes());
    // bytes 10-15 reserved

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(&header)?;
    writer.write_all(&compressed)?;
    writer.write_all(&checksum)?;
    writer.flush()?;

    info!(
        file_size = HEADER_SIZE + compressed.len() + CHECKSUM_SIZE,
        compressed_size = compressed.len(),
        "graph container written"
    );

    Ok(())
}

/// Read a graph written by [`save_graph`].
///
/// The magic, version, and body digest are all checked before decoding;
/// any mismatch is a [`Error::GraphStoreLoad`], never a partial graph.
pub fn load_graph(path: &Path) -> Result<Graph> {
    debug!(path = %path.display(), "loading graph");

    let file = File::open(path).map_err(|e| Error::GraphStoreLoad {
        path: path.to_path_buf(),
        message: format!("failed to open file: {}", e),
    })?;
    let mut reader = BufReader::new(file);

    let mut header = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut header)
        .map_err(|e| Error::GraphStoreLoad {
            path: path.to_path_buf(),
            message: format!("failed to read header: {}", e),
        })?;

    if &header[0..4] != GRAPH_MAGIC {
        return Err(Error::GraphStoreLoad {
            path: path.to_path_buf(),
            message: "invalid magic bytes".to_string(),
        });
    }

    let version = header[4];
    if version != GRAPH_VERSION {
        return Err(Error::GraphStoreLoad {
            path: path.to_path_buf(),
            message: format!("unsupported version {} (expected {})", version, GRAPH_VERSION),
        });
    }

    let node_count = u32::from_le_bytes(header[6..10].try_into().unwrap());

    let metadata = std::fs::metadata(path)?;
    let total = metadata.len() as usize;
    if total < HEADER_SIZE + CHECKSUM_SIZE {
        return Err(Error::GraphStoreLoad {
            path: path.to_path_buf(),
            message: "file truncated".to_string(),
        });
    }
    let compressed_size = total - HEADER_SIZE - CHECKSUM_SIZE;

    let mut compressed = vec![0u8; compressed_size];
    reader
        .read_exact(&mut compressed)
        .map_err(|e| Error::GraphStoreLoad {
            path: path.to_path_buf(),
            message: format!("failed to read compressed data: {}", e),
        })?;

    let mut stored_checksum = [0u8; CHECKSUM_SIZE];
    reader
        .read_exact(&mut stored_checksum)
        .map_err(|e| Error::GraphStoreLoad {
            path: path.to_path_buf(),
            message: format!("failed to read checksum: {}", e),
        })?;

    let computed_checksum = Sha256::digest(&compressed);
    if computed_checksum.as_slice() != stored_checksum {
        return Err(Error::GraphStoreLoad {
            path: path.to_path_buf(),
            message: "checksum mismatch between body and footer".to_string(),
        });
    }

    let decompressed =
        zstd::decode_all(compressed.as_slice()).map_err(|e| Error::GraphStoreLoad {
            path: path.to_path_buf(),
            message: format!("zstd decompression failed: {}", e),
        })?;

    let graph: Graph = postcard::from_bytes(&decompressed).map_err(|e| Error::GraphStoreLoad {
        path: path.to_path_buf(),
        message: format!("postcard deserialization failed: {}", e),
    })?;

    if graph.node_count() != node_count as usize {
        warn!(
            expected = node_count,
            actual = graph.node_count(),
            "node count mismatch in graph file"
        );
    }

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        passages_applied = graph.stats().passages_applied,
        antimeridian_connected = graph.stats().antimeridian_connected,
        "graph loaded"
    );

    Ok(graph)
}

/// Best-effort load for callers that can rebuild: every failure is logged
/// and collapsed to `None`.
pub fn try_load_graph(path: &Path) -> Option<Graph> {
    if !path.exists() {
        return None;
    }

    match load_graph(path) {
        Ok(graph) => Some(graph),
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to load graph, will rebuild"
            );
            None
        }
    }
}

/// Bring a stored graph up to routing readiness.
///
/// A build may have skipped passage or antimeridian augmentation; this runs
/// whichever passes the persisted flags mark as missing, then writes the
/// graph back so the work happens once per file. Returns whether anything
/// changed.
pub fn ensure_augmented(graph: &mut Graph, passages: &[Passage], path: &Path) -> Result<bool> {
    let mut changed = false;

    if !graph.stats().passages_applied && !passages.is_empty() {
        let report = apply_passages(graph, passages);
        info!(
            added = report.added,
            skipped = report.skipped.len(),
            "applied passages to stored graph"
        );
        changed = true;
    }

    if !graph.stats().antimeridian_connected {
        let added = connect_antimeridian_default(graph);
        info!(added, "connected antimeridian bands on stored graph");
        changed = true;
    }

    if changed {
        graph.sync_stats();
        save_graph(graph, path)?;
    }

    Ok(changed)
}
