//! Run statistics.
//!
//! Every worker keeps its own [`Statistics`] and the orchestrator folds them
//! together once the workers are done. `merge` is commutative and
//! associative, so the fold order never shows in the result.

use crate::coords::{ChunkPos, Dimension};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Named anomaly counters. Anything that is dropped or degraded during a run
/// bumps one of these instead of disappearing silently.
pub mod anomaly {
    pub const UNKNOWN_BLOCKS: &str = "unknown_blocks";
    pub const UNKNOWN_BIOMES: &str = "unknown_biomes";
    pub const UNKNOWN_ENTITIES: &str = "unknown_entities";
    pub const UNKNOWN_ITEMS: &str = "unknown_items";
    pub const UNKNOWN_BLOCK_ENTITIES: &str = "unknown_block_entities";
    pub const MALFORMED_BLOCK_ENTITIES: &str = "malformed_block_entities";
    pub const MALFORMED_ENTITIES: &str = "malformed_entities";
    pub const UNRESOLVED_LINKS: &str = "unresolved_links";
    pub const CONTAINER_OVERFLOW: &str = "container_overflow";
    pub const DROPPED_PORTAL_RECORDS: &str = "dropped_portal_records";
    pub const DROPPED_STRUCTURE_RECORDS: &str = "dropped_structure_records";
    pub const DROPPED_MAP_RECORDS: &str = "dropped_map_records";
    pub const DROPPED_PENDING_TICKS: &str = "dropped_pending_ticks";
    pub const DROPPED_ITEMS: &str = "dropped_items";
}

/// A chunk that could not be converted, or was converted with losses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkError {
    pub dimension: Dimension,
    pub pos: ChunkPos,
    pub message: String,
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} chunk {}: {}", self.dimension, self.pos, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    pub chunks_converted: u64,
    pub chunks_skipped: u64,
    pub chunks_failed: u64,
    pub block_entities: u64,
    pub entities: u64,
    pub terraformed_blocks: u64,
    /// Source data version (Java `DataVersion`, Bedrock chunk version) to chunk count.
    pub versions: BTreeMap<i32, u64>,
    pub anomalies: BTreeMap<String, u64>,
    /// Kept sorted so merged statistics compare equal regardless of merge order.
    pub errors: Vec<ChunkError>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&mut self, anomaly: &str) {
        self.count_n(anomaly, 1);
    }

    pub fn count_n(&mut self, anomaly: &str, n: u64) {
        if n > 0 {
            *self.anomalies.entry(anomaly.to_string()).or_default() += n;
        }
    }

    pub fn anomaly(&self, name: &str) -> u64 {
        self.anomalies.get(name).copied().unwrap_or(0)
    }

    pub fn record_version(&mut self, version: i32) {
        *self.versions.entry(version).or_default() += 1;
    }

    pub fn record_error(&mut self, dimension: Dimension, pos: ChunkPos, message: impl Into<String>) {
        let error = ChunkError {
            dimension,
            pos,
            message: message.into(),
        };
        let at = self.errors.partition_point(|e| *e <= error);
        self.errors.insert(at, error);
    }

    /// Folds `other` into `self`.
    pub fn merge(&mut self, other: Statistics) {
        self.chunks_converted += other.chunks_converted;
        self.chunks_skipped += other.chunks_skipped;
        self.chunks_failed += other.chunks_failed;
        self.block_entities += other.block_entities;
        self.entities += other.entities;
        self.terraformed_blocks += other.terraformed_blocks;
        for (version, n) in other.versions {
            *self.versions.entry(version).or_default() += n;
        }
        for (name, n) in other.anomalies {
            *self.anomalies.entry(name).or_default() += n;
        }
        self.errors.extend(other.errors);
        self.errors.sort();
    }

    pub fn merged(mut self, other: Statistics) -> Statistics {
        self.merge(other);
        self
    }
}

/// Per-chunk view of the worker's accumulators, handed to the chunk codecs.
pub struct ChunkLog<'a> {
    pub dimension: Dimension,
    pub pos: ChunkPos,
    stats: &'a mut Statistics,
    map_ids: &'a mut BTreeSet<i64>,
}

impl<'a> ChunkLog<'a> {
    pub fn new(
        dimension: Dimension,
        pos: ChunkPos,
        stats: &'a mut Statistics,
        map_ids: &'a mut BTreeSet<i64>,
    ) -> Self {
        Self {
            dimension,
            pos,
            stats,
            map_ids,
        }
    }

    pub fn count(&mut self, anomaly: &str) {
        self.stats.count(anomaly);
    }

    /// Records a loss that should be visible in the chunk error list.
    pub fn error(&mut self, message: impl Into<String>) {
        self.stats.record_error(self.dimension, self.pos, message);
    }

    /// Remembers a map item id so its map record gets converted at the end of the run.
    pub fn saw_map(&mut self, id: i64) {
        self.map_ids.insert(id);
    }

    pub fn stats(&mut self) -> &mut Statistics {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(seed: u64) -> Statistics {
        let mut stats = Statistics::new();
        stats.chunks_converted = seed * 3 + 1;
        stats.block_entities = seed;
        stats.entities = seed * 2;
        stats.record_version(3955);
        stats.record_version(3700 + seed as i32);
        stats.count_n(anomaly::UNKNOWN_BLOCKS, seed + 1);
        if seed % 2 == 0 {
            stats.count(anomaly::UNRESOLVED_LINKS);
        }
        stats.record_error(
            Dimension::Overworld,
            ChunkPos::new(seed as i32, -(seed as i32)),
            format!("failure {seed}"),
        );
        stats
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = sample(1);
        let b = sample(2);
        assert_eq!(a.clone().merged(b.clone()), b.merged(a));
    }

    #[test]
    fn test_merge_is_associative() {
        let (a, b, c) = (sample(1), sample(2), sample(3));
        let left = a.clone().merged(b.clone()).merged(c.clone());
        let right = a.merged(b.merged(c));
        assert_eq!(left, right);
        assert_eq!(left.versions[&3955], 3);
        assert_eq!(left.anomaly(anomaly::UNKNOWN_BLOCKS), 2 + 3 + 4);
        assert_eq!(left.errors.len(), 3);
    }

    #[test]
    fn test_empty_is_identity() {
        let a = sample(4);
        assert_eq!(a.clone().merged(Statistics::new()), a);
    }

    #[test]
    fn test_chunk_log_routes_to_statistics() {
        let mut stats = Statistics::new();
        let mut maps = BTreeSet::new();
        let mut log = ChunkLog::new(Dimension::Nether, ChunkPos::new(2, 3), &mut stats, &mut maps);
        log.count(anomaly::CONTAINER_OVERFLOW);
        log.error("slot 30 does not exist");
        log.saw_map(7);
        assert_eq!(stats.anomaly(anomaly::CONTAINER_OVERFLOW), 1);
        assert_eq!(stats.errors[0].to_string(), "nether chunk (2, 3): slot 30 does not exist");
        assert!(maps.contains(&7));
    }
}
