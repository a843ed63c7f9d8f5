//! The catalog: partition registry and query-time pruning.
//!
//! The catalog maps every sealed partition to its sketch and bounds and
//! resolves expression trees into candidate partition lists. Resolution is a
//! pure read over immutable sketches: it never fails, and degraded sketch
//! availability only ever widens the result.

use std::sync::Arc;

use crossbeam_skiplist::SkipMap;
use log::Level;

use crate::{
    config::SiftConfig,
    error::DecodeError,
    expr::Expr,
    logging::sift_log,
    sketch::{PartitionId, PartitionSketch},
    timestamp::Timestamp,
};

/// Bounds metadata supplied by storage management alongside a sketch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartitionInfo {
    /// Number of rows in the sealed partition.
    pub rows: u64,
    /// Inclusive event-time bounds, if known.
    pub time_range: Option<(Timestamp, Timestamp)>,
}

/// Query-time availability of a partition's sketch.
#[derive(Clone, Debug)]
enum SketchState {
    /// Decoded and resident; lookups delegate to it.
    Ready(Arc<PartitionSketch>),
    /// The blob failed to decode. The partition matches every expression.
    Corrupt,
}

#[derive(Clone, Debug)]
struct PartitionEntry {
    info: PartitionInfo,
    state: SketchState,
}

/// Result of resolving an expression against the catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Partitions that might contain matches, newest first.
    pub candidates: Vec<PartitionId>,
    /// Candidates included only because their sketch was unavailable.
    /// Always a subset of `candidates`; callers should monitor this.
    pub degraded: Vec<PartitionId>,
}

/// Process-wide registry of partition sketches.
///
/// Append-only: partitions are registered once, by a single writer path, and
/// never mutated or removed (deletion is an external operation). Readers may
/// call [`Catalog::resolve`] concurrently without locking; each call
/// snapshots the partition list first, so a concurrent append is either
/// fully visible or not at all.
#[derive(Debug, Default)]
pub struct Catalog {
    partitions: SkipMap<PartitionId, PartitionEntry>,
    config: SiftConfig,
}

impl Catalog {
    /// Create an empty catalog with the given configuration.
    pub fn new(config: SiftConfig) -> Self {
        Self {
            partitions: SkipMap::new(),
            config,
        }
    }

    /// Number of registered partitions.
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// Whether no partition was registered yet.
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Register an already-built sketch.
    pub fn add(&self, sketch: PartitionSketch, info: PartitionInfo) {
        let partition_id = sketch.partition_id();
        if let Some(limit) = self.config.max_sketch_bytes {
            let size = sketch.encoded_size();
            if size > limit {
                sift_log!(
                    Level::Warn,
                    "sketch_oversized",
                    "partition={} bytes={} limit={}",
                    partition_id,
                    size,
                    limit,
                );
            }
        }
        self.partitions.insert(
            partition_id,
            PartitionEntry {
                info,
                state: SketchState::Ready(Arc::new(sketch)),
            },
        );
    }

    /// Register a partition from its serialized sketch blob.
    ///
    /// A blob that fails to decode still registers the partition, degraded
    /// to "matches everything" rather than dropped. The decode error is
    /// returned so the caller can log and monitor it.
    pub fn add_sketch(
        &self,
        partition_id: PartitionId,
        blob: &[u8],
        info: PartitionInfo,
    ) -> Result<(), DecodeError> {
        match PartitionSketch::decode(blob) {
            Ok(sketch) => {
                self.partitions.insert(
                    partition_id,
                    PartitionEntry {
                        info,
                        state: SketchState::Ready(Arc::new(sketch)),
                    },
                );
                Ok(())
            }
            Err(err) => {
                sift_log!(
                    Level::Warn,
                    "sketch_corrupt",
                    "partition={} error={}",
                    partition_id,
                    err,
                );
                self.partitions.insert(
                    partition_id,
                    PartitionEntry {
                        info,
                        state: SketchState::Corrupt,
                    },
                );
                Err(err)
            }
        }
    }

    /// The resident sketch of a partition, if it decoded cleanly.
    pub fn get_sketch(&self, partition_id: PartitionId) -> Option<Arc<PartitionSketch>> {
        self.partitions
            .get(&partition_id)
            .and_then(|entry| match &entry.value().state {
                SketchState::Ready(sketch) => Some(Arc::clone(sketch)),
                SketchState::Corrupt => None,
            })
    }

    /// The bounds metadata of a partition.
    pub fn info(&self, partition_id: PartitionId) -> Option<PartitionInfo> {
        self.partitions
            .get(&partition_id)
            .map(|entry| entry.value().info)
    }

    /// Resolve an expression into the partitions that might contain matches.
    ///
    /// Soundness: a partition holding a true match is always in the result.
    /// Pruning failures only ever widen the candidate set. The output is
    /// ordered newest partition first and is stable across repeated calls on
    /// unchanged state.
    pub fn resolve(&self, expr: &Expr) -> Resolution {
        // Snapshot before evaluating so a concurrent append cannot produce a
        // partially evaluated view.
        let snapshot: Vec<(PartitionId, PartitionEntry)> = self
            .partitions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut resolution = Resolution::default();
        // ULIDs are time-ordered, so reverse iteration is newest-first.
        for (partition_id, entry) in snapshot.iter().rev() {
            match &entry.state {
                SketchState::Ready(sketch) => {
                    if sketch.matches(expr) {
                        resolution.candidates.push(*partition_id);
                    }
                }
                SketchState::Corrupt => {
                    resolution.candidates.push(*partition_id);
                    resolution.degraded.push(*partition_id);
                }
            }
        }
        sift_log!(
            Level::Debug,
            "catalog_resolve",
            "partitions={} candidates={} degraded={}",
            snapshot.len(),
            resolution.candidates.len(),
            resolution.degraded.len(),
        );
        resolution
    }
}
