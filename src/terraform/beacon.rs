//! Beacon pyramid level, stored in the beacon's block entity.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::coords::BlockPos;
use crate::nbt_utils::CompoundExt;
use crate::world::{BlockAccessor, Chunk};
use fastnbt::Value;

const BASE_BLOCKS: [&str; 5] = [
    "iron_block",
    "gold_block",
    "diamond_block",
    "emerald_block",
    "netherite_block",
];

/// Number of complete pyramid layers under `beacon`, `0..=4`. `None` when a
/// layer is only partly loaded and no loaded block of it breaks the pyramid.
pub fn pyramid_levels(world: &dyn BlockAccessor, beacon: BlockPos) -> Option<i32> {
    for level in 1..=4 {
        let y = beacon.y - level;
        let mut incomplete = false;
        for dx in -level..=level {
            for dz in -level..=level {
                match world.block_at(BlockPos::new(beacon.x + dx, y, beacon.z + dz)) {
                    Some(b) if BASE_BLOCKS.contains(&b.short_name()) => {}
                    Some(_) => return Some(level - 1),
                    None => incomplete = true,
                }
            }
        }
        if incomplete {
            return None;
        }
    }
    Some(4)
}

pub struct BeaconPass;

impl TerraformPass for BeaconPass {
    fn name(&self) -> &'static str {
        "beacon"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::BEACON
    }

    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, _) in for_each_block(chunk, |b| b.is("beacon")) {
            let Some(tag) = chunk.block_entities.get(&pos) else {
                continue;
            };
            let Some(levels) = pyramid_levels(world, pos) else {
                continue;
            };
            if tag.get_i32("Levels") != Some(levels) {
                let mut updated = tag.clone();
                updated.insert("Levels".to_string(), Value::Int(levels));
                edits.put_block_entity(pos, updated);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_definitions::BlockState;
    use crate::coords::ChunkPos;
    use crate::nbt_utils::CompoundBuilder;
    use crate::terraform::test_support::*;

    #[test]
    fn test_levels_follow_pyramid() {
        let mut chunk = chunk_at(0, 0);
        for dx in 0..5 {
            for dz in 0..5 {
                chunk.set_block(3 + dx, 60, 3 + dz, BlockState::new("iron_block"));
            }
        }
        for dx in 0..3 {
            for dz in 0..3 {
                chunk.set_block(4 + dx, 61, 4 + dz, BlockState::new("diamond_block"));
            }
        }
        let pos = BlockPos::new(5, 62, 5);
        chunk.set_block_at(pos, BlockState::new("beacon"));
        chunk.block_entities.insert(
            pos,
            CompoundBuilder::new()
                .string("id", "minecraft:beacon")
                .int("Levels", 0)
                .build(),
        );
        let mut working = single(chunk);
        assert_eq!(run_pass(&BeaconPass, &mut working, ChunkPos::new(0, 0)), 1);
        let tag = &working[&ChunkPos::new(0, 0)].block_entities[&pos];
        assert_eq!(tag.get_i32("Levels"), Some(2));
        assert_eq!(tag.get_str("id"), Some("minecraft:beacon"));
        assert_eq!(run_pass(&BeaconPass, &mut working, ChunkPos::new(0, 0)), 0);
    }

    #[test]
    fn test_beacon_without_block_entity_is_left_alone() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(1, 64, 1, BlockState::new("beacon"));
        let mut working = single(chunk);
        assert_eq!(run_pass(&BeaconPass, &mut working, ChunkPos::new(0, 0)), 0);
        assert!(working[&ChunkPos::new(0, 0)].block_entities.is_empty());
    }

    #[test]
    fn test_pyramid_reaching_unloaded_chunk_is_left_alone() {
        let mut chunk = chunk_at(0, 0);
        for x in 0..=1 {
            for z in 4..=6 {
                chunk.set_block(x, 63, z, BlockState::new("iron_block"));
            }
        }
        let pos = BlockPos::new(0, 64, 5);
        chunk.set_block_at(pos, BlockState::new("beacon"));
        chunk.block_entities.insert(
            pos,
            CompoundBuilder::new()
                .string("id", "minecraft:beacon")
                .int("Levels", 1)
                .build(),
        );
        let mut working = single(chunk);
        assert_eq!(run_pass(&BeaconPass, &mut working, ChunkPos::new(0, 0)), 0);
        let tag = &working[&ChunkPos::new(0, 0)].block_entities[&pos];
        assert_eq!(tag.get_i32("Levels"), Some(1));

        // A loaded block that breaks the first layer decides it anyway.
        working
            .get_mut(&ChunkPos::new(0, 0))
            .unwrap()
            .set_block(1, 63, 6, BlockState::new("stone"));
        assert_eq!(run_pass(&BeaconPass, &mut working, ChunkPos::new(0, 0)), 1);
        let tag = &working[&ChunkPos::new(0, 0)].block_entities[&pos];
        assert_eq!(tag.get_i32("Levels"), Some(0));
    }
}
