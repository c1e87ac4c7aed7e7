//! Neighbour-dependent block fix-ups.
//!
//! Raw translation can only look at one block at a time. Properties that
//! Java derives from neighbouring blocks (fence connections, snowy grass,
//! leaf distance, ...) are absent from Bedrock and have to be recomputed once
//! a region's chunks are all resident.
//!
//! Each pass plans its edits for every target chunk against an immutable view
//! of the working set, then the edits are applied. Passes run one after the
//! other in [`PASSES`] order, so later passes observe earlier passes' output.

pub mod beacon;
pub mod beds;
pub mod campfire;
pub mod chorus;
pub mod doors;
pub mod fences;
pub mod leaves;
pub mod pistons;
pub mod plants;
pub mod snowy;
pub mod stairs;
pub mod tripwire;
pub mod vines;

use crate::block_definitions::BlockState;
use crate::coords::{BlockPos, ChunkPos};
use crate::nbt_utils::Compound;
use crate::world::{BlockAccessor, Chunk, NeighborhoodAccessor};
use fnv::FnvHashMap;
use log::debug;

/// Bitmap of block families present in a chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FamilyMask(u32);

impl FamilyMask {
    pub const NONE: FamilyMask = FamilyMask(0);
    pub const SNOWY: FamilyMask = FamilyMask(1 << 0);
    pub const VINES: FamilyMask = FamilyMask(1 << 1);
    pub const PLANTS: FamilyMask = FamilyMask(1 << 2);
    pub const CAMPFIRE: FamilyMask = FamilyMask(1 << 3);
    pub const FENCES: FamilyMask = FamilyMask(1 << 4);
    pub const PISTONS: FamilyMask = FamilyMask(1 << 5);
    pub const LEAVES: FamilyMask = FamilyMask(1 << 6);
    pub const DOORS: FamilyMask = FamilyMask(1 << 7);
    pub const BEACON: FamilyMask = FamilyMask(1 << 8);
    pub const TRIPWIRE: FamilyMask = FamilyMask(1 << 9);
    pub const CHORUS: FamilyMask = FamilyMask(1 << 10);
    pub const BEDS: FamilyMask = FamilyMask(1 << 11);
    pub const STAIRS: FamilyMask = FamilyMask(1 << 12);

    pub fn of_block(block: &BlockState) -> FamilyMask {
        let name = block.short_name();
        if snowy::is_snowy_capable(name) {
            FamilyMask::SNOWY
        } else if name == "vine" {
            FamilyMask::VINES
        } else if plants::is_head_body_plant(name) {
            FamilyMask::PLANTS
        } else if name == "campfire" || name == "soul_campfire" {
            FamilyMask::CAMPFIRE
        } else if block.is_fence() || block.is_pane() {
            FamilyMask::FENCES
        } else if matches!(name, "piston" | "sticky_piston") {
            FamilyMask::PISTONS
        } else if block.is_leaves() {
            FamilyMask::LEAVES
        } else if block.is_door() {
            FamilyMask::DOORS
        } else if name == "beacon" {
            FamilyMask::BEACON
        } else if name == "tripwire" {
            FamilyMask::TRIPWIRE
        } else if name == "chorus_plant" {
            FamilyMask::CHORUS
        } else if block.is_bed() {
            FamilyMask::BEDS
        } else if block.is_stairs() {
            FamilyMask::STAIRS
        } else {
            FamilyMask::NONE
        }
    }

    pub fn of_chunk(chunk: &Chunk) -> FamilyMask {
        chunk
            .palette_blocks()
            .fold(FamilyMask::NONE, |mask, block| mask.union(FamilyMask::of_block(block)))
    }

    pub const fn union(self, other: FamilyMask) -> FamilyMask {
        FamilyMask(self.0 | other.0)
    }

    pub const fn intersects(self, other: FamilyMask) -> bool {
        self.0 & other.0 != 0
    }
}

/// Edits planned by one pass for one chunk.
#[derive(Debug, Default)]
pub struct Edits {
    blocks: Vec<(BlockPos, BlockState)>,
    block_entities: Vec<(BlockPos, Compound)>,
}

impl Edits {
    /// Queues a block change. No-op when the block is already `block`.
    pub fn set_block(&mut self, current: &BlockState, pos: BlockPos, block: BlockState) {
        if *current != block {
            self.blocks.push((pos, block));
        }
    }

    pub fn put_block_entity(&mut self, pos: BlockPos, tag: Compound) {
        self.block_entities.push((pos, tag));
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.block_entities.is_empty()
    }
}

/// One terraform pass.
pub trait TerraformPass: Sync {
    fn name(&self) -> &'static str;

    /// Families whose presence in a chunk makes this pass relevant.
    fn family(&self) -> FamilyMask;

    /// Plans edits for `chunk`. `world` can see the chunk and its loaded
    /// neighbours; positions it can't resolve must be left alone.
    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits);
}

/// Fixed pass order.
pub static PASSES: [&dyn TerraformPass; 13] = [
    &snowy::SnowyPass,
    &vines::VinesPass,
    &plants::PlantsPass,
    &campfire::CampfirePass,
    &fences::FencesPass,
    &stairs::StairsPass,
    &pistons::PistonsPass,
    &leaves::LeavesPass,
    &doors::DoorsPass,
    &beacon::BeaconPass,
    &tripwire::TripwirePass,
    &chorus::ChorusPass,
    &beds::BedsPass,
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TerraformReport {
    pub changed_blocks: u64,
    pub written_block_entities: u64,
}

/// Runs every pass over `targets`. Chunks in `working` but not in `targets`
/// are read-only neighbours.
pub fn terraform(
    working: &mut FnvHashMap<ChunkPos, Chunk>,
    targets: &[ChunkPos],
) -> TerraformReport {
    let mut report = TerraformReport::default();
    for pass in PASSES.iter() {
        let planned: Vec<(ChunkPos, Edits)> = {
            let view = NeighborhoodAccessor::new(working);
            targets
                .iter()
                .filter_map(|pos| working.get(pos))
                .filter(|chunk| FamilyMask::of_chunk(chunk).intersects(pass.family()))
                .map(|chunk| {
                    let mut edits = Edits::default();
                    pass.plan(chunk, &view, &mut edits);
                    (chunk.pos, edits)
                })
                .filter(|(_, edits)| !edits.is_empty())
                .collect()
        };

        for (pos, edits) in planned {
            let Some(chunk) = working.get_mut(&pos) else {
                continue;
            };
            debug!(
                "{} pass: {} block(s), {} block entit(ies) in chunk {}",
                pass.name(),
                edits.blocks.len(),
                edits.block_entities.len(),
                pos
            );
            for (block_pos, block) in edits.blocks {
                if chunk.set_block_at(block_pos, block) {
                    report.changed_blocks += 1;
                }
            }
            for (block_pos, tag) in edits.block_entities {
                if chunk.contains(block_pos) {
                    chunk.block_entities.insert(block_pos, tag);
                    report.written_block_entities += 1;
                }
            }
        }
    }
    report
}

/// Helpers shared by the passes.
pub(crate) fn for_each_block<'a>(
    chunk: &'a Chunk,
    filter: impl Fn(&BlockState) -> bool,
) -> impl Iterator<Item = (BlockPos, &'a BlockState)> {
    chunk
        .positions_where(filter)
        .into_iter()
        .filter_map(move |pos| chunk.block_at(pos).map(|b| (pos, b)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::coords::Dimension;

    pub fn chunk_at(x: i32, z: i32) -> Chunk {
        Chunk::new(Dimension::Overworld, ChunkPos::new(x, z))
    }

    pub fn single(chunk: Chunk) -> FnvHashMap<ChunkPos, Chunk> {
        let mut map = FnvHashMap::default();
        map.insert(chunk.pos, chunk);
        map
    }

    /// Runs one pass and returns the number of planned edits.
    pub fn run_pass(
        pass: &dyn TerraformPass,
        working: &mut FnvHashMap<ChunkPos, Chunk>,
        target: ChunkPos,
    ) -> usize {
        let edits = {
            let view = NeighborhoodAccessor::new(working);
            let mut edits = Edits::default();
            if let Some(chunk) = working.get(&target) {
                pass.plan(chunk, &view, &mut edits);
            }
            edits
        };
        let count = edits.blocks.len() + edits.block_entities.len();
        if let Some(chunk) = working.get_mut(&target) {
            for (pos, block) in edits.blocks {
                chunk.set_block_at(pos, block);
            }
            for (pos, tag) in edits.block_entities {
                chunk.block_entities.insert(pos, tag);
            }
        }
        count
    }

    pub fn block(working: &FnvHashMap<ChunkPos, Chunk>, pos: BlockPos) -> BlockState {
        working
            .get(&pos.chunk())
            .and_then(|c| c.block_at(pos))
            .cloned()
            .unwrap_or_else(|| crate::block_definitions::AIR.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn busy_chunk() -> Chunk {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(5, 64, 5, BlockState::new("grass_block").with("snowy", "false"));
        chunk.set_block(5, 65, 5, BlockState::new("snow").with("layers", "1"));
        chunk.set_block(1, 64, 1, BlockState::new("oak_fence"));
        chunk.set_block(2, 64, 1, BlockState::new("oak_fence"));
        chunk.set_block(8, 70, 8, BlockState::new("oak_log").with("axis", "y"));
        chunk.set_block(8, 71, 8, BlockState::new("oak_leaves"));
        chunk.set_block(9, 71, 8, BlockState::new("oak_leaves"));
        chunk.set_block(3, 60, 3, BlockState::new("kelp").with("age", "3"));
        chunk.set_block(3, 61, 3, BlockState::new("kelp").with("age", "4"));
        chunk.set_block(10, 64, 10, BlockState::new("red_bed").with("part", "foot").with("facing", "north"));
        chunk
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let mut working = single(busy_chunk());
        let first = terraform(&mut working, &[ChunkPos::new(0, 0)]);
        assert!(first.changed_blocks > 0);
        let second = terraform(&mut working, &[ChunkPos::new(0, 0)]);
        assert_eq!(second.changed_blocks, 0);
        assert_eq!(second.written_block_entities, 0);
    }

    #[test]
    fn test_family_mask_skips_unrelated_chunks() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(0, 0, 0, BlockState::new("stone"));
        assert_eq!(FamilyMask::of_chunk(&chunk), FamilyMask::NONE);
        chunk.set_block(0, 1, 0, BlockState::new("oak_fence"));
        assert!(FamilyMask::of_chunk(&chunk).intersects(FamilyMask::FENCES));
        assert!(!FamilyMask::of_chunk(&chunk).intersects(FamilyMask::LEAVES));
    }

    #[test]
    fn test_neighbours_are_not_modified() {
        let mut working = single(busy_chunk());
        let mut neighbour = chunk_at(1, 0);
        neighbour.set_block(0, 64, 0, BlockState::new("oak_fence"));
        working.insert(neighbour.pos, neighbour);
        terraform(&mut working, &[ChunkPos::new(0, 0)]);
        let untouched = block(&working, BlockPos::new(16, 64, 0));
        assert!(untouched.properties.is_empty());
    }
}
