//! The seams between the orchestrator and the two save formats.
//!
//! A [`WorldSource`] hands out chunk readers and the world-level records, a
//! [`WorldSink`] hands out chunk writers and takes the world-level records at
//! the end of the run. Readers and writers are created per region task and
//! are never shared between workers.

use crate::context::Services;
use crate::coords::{ChunkPos, Dimension, Edition, RegionPos};
use crate::error::{ChunkFailure, ConvertError};
use crate::level::LevelInfo;
use crate::maps::MapData;
use crate::nbt_utils::Compound;
use crate::records::WorldRecords;
use crate::stats::ChunkLog;
use crate::world::Chunk;
use std::collections::BTreeMap;

pub trait ChunkReader {
    /// `Ok(None)` when the chunk does not exist.
    fn read_chunk(
        &mut self,
        pos: ChunkPos,
        services: Services<'_>,
        log: &mut ChunkLog<'_>,
    ) -> Result<Option<Chunk>, ChunkFailure>;
}

pub trait ChunkWriter {
    fn write_chunk(
        &mut self,
        chunk: &Chunk,
        services: Services<'_>,
        log: &mut ChunkLog<'_>,
    ) -> Result<(), ChunkFailure>;

    /// Flushes whatever the writer buffered.
    fn finish(self: Box<Self>) -> Result<(), ConvertError>;
}

pub trait WorldSource: Sync {
    fn edition(&self) -> Edition;

    /// Existing chunks of `dimension`, grouped by region.
    fn chunks(&self, dimension: Dimension) -> Result<BTreeMap<RegionPos, Vec<ChunkPos>>, ConvertError>;

    fn reader(&self, dimension: Dimension) -> Box<dyn ChunkReader + '_>;

    fn level(&self) -> Result<LevelInfo, ConvertError>;

    /// The local player as a Java-form compound.
    fn local_player(
        &self,
        uuid: Option<u128>,
        services: Services<'_>,
        log: &mut ChunkLog<'_>,
    ) -> Result<Option<Compound>, ConvertError>;

    /// Every map record in the world.
    fn maps(&self) -> Result<Vec<MapData>, ConvertError>;
}

/// World-level data handed to the sink once every chunk is written.
pub struct Finalize<'a> {
    pub level: &'a LevelInfo,
    /// Java-form local player.
    pub player: Option<&'a Compound>,
    pub maps: &'a [MapData],
    pub records: &'a WorldRecords,
    pub dimensions: &'a [Dimension],
}

pub trait WorldSink: Sync {
    fn edition(&self) -> Edition;

    fn writer(&self, dimension: Dimension, region: RegionPos) -> Result<Box<dyn ChunkWriter + '_>, ConvertError>;

    fn finalize(&self, world: &Finalize<'_>, log: &mut ChunkLog<'_>) -> Result<(), ConvertError>;

    /// Flushes and compacts. `progress` receives `(done, total)` steps.
    fn close(&self, progress: &mut dyn FnMut(u64, u64)) -> Result<(), ConvertError>;

    /// Gives up on the output after a fatal error or cancellation.
    fn abandon(&self);
}
