//! Read-only block lookups used by the terraform passes.

use super::chunk::Chunk;
use crate::block_definitions::BlockState;
use crate::coords::{BlockPos, ChunkPos};
use fnv::FnvHashMap;

pub trait BlockAccessor {
    /// Block at an absolute position, `None` when that position isn't loaded.
    fn block_at(&self, pos: BlockPos) -> Option<&BlockState>;

    fn block_entity_at(&self, _pos: BlockPos) -> Option<&crate::nbt_utils::Compound> {
        None
    }
}

/// Bounds-checked view of one chunk.
pub struct SingleChunkAccessor<'a> {
    chunk: &'a Chunk,
}

impl<'a> SingleChunkAccessor<'a> {
    pub fn new(chunk: &'a Chunk) -> Self {
        Self { chunk }
    }
}

impl BlockAccessor for SingleChunkAccessor<'_> {
    fn block_at(&self, pos: BlockPos) -> Option<&BlockState> {
        self.chunk.block_at(pos)
    }

    fn block_entity_at(&self, pos: BlockPos) -> Option<&crate::nbt_utils::Compound> {
        self.chunk.block_entities.get(&pos)
    }
}

/// View over an N×N neighbourhood of loaded chunks.
pub struct NeighborhoodAccessor<'a> {
    chunks: &'a FnvHashMap<ChunkPos, Chunk>,
    bounds: Option<(ChunkPos, ChunkPos)>,
}

impl<'a> NeighborhoodAccessor<'a> {
    /// Every chunk of `chunks` is visible.
    pub fn new(chunks: &'a FnvHashMap<ChunkPos, Chunk>) -> Self {
        Self {
            chunks,
            bounds: None,
        }
    }

    /// Only the `(2 * radius + 1)²` chunks around `center` are visible.
    pub fn around(chunks: &'a FnvHashMap<ChunkPos, Chunk>, center: ChunkPos, radius: i32) -> Self {
        Self {
            chunks,
            bounds: Some((center.offset(-radius, -radius), center.offset(radius, radius))),
        }
    }

    fn chunk(&self, pos: ChunkPos) -> Option<&'a Chunk> {
        if let Some((min, max)) = self.bounds {
            if pos.x < min.x || pos.x > max.x || pos.z < min.z || pos.z > max.z {
                return None;
            }
        }
        self.chunks.get(&pos)
    }
}

impl BlockAccessor for NeighborhoodAccessor<'_> {
    fn block_at(&self, pos: BlockPos) -> Option<&BlockState> {
        self.chunk(pos.chunk())?.block_at(pos)
    }

    fn block_entity_at(&self, pos: BlockPos) -> Option<&crate::nbt_utils::Compound> {
        self.chunk(pos.chunk())?.block_entities.get(&pos)
    }
}
