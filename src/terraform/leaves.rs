//! Leaf `distance`: steps through leaves to the nearest log, capped at 7.
//! Leaves at distance 7 decay unless persistent.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::block_definitions::BlockState;
use crate::coords::{BlockPos, Direction};
use crate::world::{BlockAccessor, Chunk};
use fnv::FnvHashSet;
use std::collections::VecDeque;

pub const MAX_DISTANCE: i32 = 7;

fn supports_leaves(block: &BlockState) -> bool {
    block.is_log() && !block.short_name().ends_with("melon_stem") && !block.short_name().ends_with("pumpkin_stem")
}

/// Breadth-first search for the nearest log. `None` when the search reaches
/// a block that is not loaded, since that block could be a closer log.
fn distance(world: &dyn BlockAccessor, start: BlockPos) -> Option<i32> {
    let mut seen = FnvHashSet::default();
    seen.insert(start);
    let mut queue = VecDeque::from([(start, 0)]);
    while let Some((pos, steps)) = queue.pop_front() {
        for direction in Direction::ALL {
            let next = pos.step(direction);
            match world.block_at(next)? {
                b if supports_leaves(b) => return Some((steps + 1).min(MAX_DISTANCE)),
                b if b.is_leaves() && steps + 1 < MAX_DISTANCE - 1 && seen.insert(next) => {
                    queue.push_back((next, steps + 1));
                }
                _ => {}
            }
        }
    }
    Some(MAX_DISTANCE)
}

pub struct LeavesPass;

impl TerraformPass for LeavesPass {
    fn name(&self) -> &'static str {
        "leaves"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::LEAVES
    }

    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, block) in for_each_block(chunk, BlockState::is_leaves) {
            let Some(d) = distance(world, pos) else {
                continue;
            };
            let mut wanted = block.with_property("distance", d);
            if wanted.property("persistent").is_none() {
                wanted = wanted.with("persistent", false);
            }
            edits.set_block(block, pos, wanted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ChunkPos;
    use crate::terraform::test_support::*;

    #[test]
    fn test_distance_counts_steps_through_leaves() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(0, 64, 0, BlockState::new("oak_log").with("axis", "y"));
        for x in 1..10 {
            chunk.set_block(x, 64, 0, BlockState::new("oak_leaves").with("persistent", "true"));
        }
        let mut working = single(chunk);
        run_pass(&LeavesPass, &mut working, ChunkPos::new(0, 0));
        let distances: Vec<String> = (1..10)
            .map(|x| {
                block(&working, BlockPos::new(x, 64, 0))
                    .property("distance")
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        assert_eq!(distances, vec!["1", "2", "3", "4", "5", "6", "7", "7", "7"]);
        assert_eq!(
            block(&working, BlockPos::new(1, 64, 0)).property("persistent"),
            Some("true")
        );
        assert_eq!(run_pass(&LeavesPass, &mut working, ChunkPos::new(0, 0)), 0);
    }

    #[test]
    fn test_leaf_next_to_unloaded_chunk_is_kept() {
        let mut chunk = chunk_at(0, 0);
        let pos = BlockPos::new(0, 64, 5);
        chunk.set_block_at(pos, BlockState::new("oak_leaves").with("distance", "1").with("persistent", "false"));
        let mut working = single(chunk);
        assert_eq!(run_pass(&LeavesPass, &mut working, ChunkPos::new(0, 0)), 0);
        assert_eq!(block(&working, pos).property("distance"), Some("1"));

        let mut west = chunk_at(-1, 0);
        west.set_block(15, 64, 5, BlockState::new("oak_log").with("axis", "y"));
        working.insert(west.pos, west);
        assert_eq!(run_pass(&LeavesPass, &mut working, ChunkPos::new(0, 0)), 0);
        assert_eq!(block(&working, pos).property("distance"), Some("1"));
    }
}
