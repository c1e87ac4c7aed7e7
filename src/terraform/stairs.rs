//! Stair `shape`: corners form where a stair meets another stair of the
//! same half turned a quarter. Bedrock does not store the shape.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::block_definitions::BlockState;
use crate::coords::{BlockPos, Direction};
use crate::world::{BlockAccessor, Chunk};

fn facing(block: &BlockState) -> Option<Direction> {
    block.property("facing").and_then(Direction::from_name)
}

fn same_axis(a: Direction, b: Direction) -> bool {
    a == b || a == b.opposite()
}

/// `false` when the stair at `pos + side` already continues this one.
fn free_side(
    stair: &BlockState,
    dir: Direction,
    world: &dyn BlockAccessor,
    pos: BlockPos,
    side: Direction,
) -> Option<bool> {
    let other = world.block_at(pos.step(side))?;
    Some(
        !other.is_stairs()
            || facing(other) != Some(dir)
            || other.property("half") != stair.property("half"),
    )
}

/// `None` when a block that decides the shape is not loaded.
fn shape(stair: &BlockState, world: &dyn BlockAccessor, pos: BlockPos) -> Option<&'static str> {
    let dir = facing(stair)?;
    let half = stair.property("half");

    let behind = world.block_at(pos.step(dir))?;
    if behind.is_stairs() && behind.property("half") == half {
        if let Some(turn) = facing(behind).filter(|d| !same_axis(*d, dir)) {
            if free_side(stair, dir, world, pos, turn.opposite())? {
                return Some(if turn == dir.counter_clockwise() { "outer_left" } else { "outer_right" });
            }
        }
    }

    let front = world.block_at(pos.step(dir.opposite()))?;
    if front.is_stairs() && front.property("half") == half {
        if let Some(turn) = facing(front).filter(|d| !same_axis(*d, dir)) {
            if free_side(stair, dir, world, pos, turn)? {
                return Some(if turn == dir.counter_clockwise() { "inner_left" } else { "inner_right" });
            }
        }
    }
    Some("straight")
}

pub struct StairsPass;

impl TerraformPass for StairsPass {
    fn name(&self) -> &'static str {
        "stairs"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::STAIRS
    }

    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, block) in for_each_block(chunk, BlockState::is_stairs) {
            let Some(shape) = shape(block, world, pos) else {
                continue;
            };
            edits.set_block(block, pos, block.with_property("shape", shape));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ChunkPos;
    use crate::terraform::test_support::*;

    fn stair(facing: &str) -> BlockState {
        BlockState::new("oak_stairs").with("facing", facing).with("half", "bottom")
    }

    #[test]
    fn test_lone_stair_is_straight() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(5, 64, 5, stair("west"));
        let mut working = single(chunk);
        run_pass(&StairsPass, &mut working, ChunkPos::new(0, 0));
        assert_eq!(block(&working, BlockPos::new(5, 64, 5)).property("shape"), Some("straight"));
        assert_eq!(run_pass(&StairsPass, &mut working, ChunkPos::new(0, 0)), 0);
    }

    #[test]
    fn test_corners() {
        // North-facing stair with an east-facing stair behind it.
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(5, 64, 5, stair("north"));
        chunk.set_block(5, 64, 4, stair("east"));
        // North-facing stair with a west-facing stair in front of it.
        chunk.set_block(10, 64, 5, stair("north"));
        chunk.set_block(10, 64, 6, stair("west"));
        let mut working = single(chunk);
        run_pass(&StairsPass, &mut working, ChunkPos::new(0, 0));
        assert_eq!(block(&working, BlockPos::new(5, 64, 5)).property("shape"), Some("outer_right"));
        assert_eq!(block(&working, BlockPos::new(10, 64, 5)).property("shape"), Some("inner_left"));
    }

    #[test]
    fn test_half_must_match() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(5, 64, 5, stair("north"));
        chunk.set_block(5, 64, 4, stair("east").with("half", "top"));
        let mut working = single(chunk);
        run_pass(&StairsPass, &mut working, ChunkPos::new(0, 0));
        assert_eq!(block(&working, BlockPos::new(5, 64, 5)).property("shape"), Some("straight"));
    }

    #[test]
    fn test_stair_on_unloaded_edge_is_left_alone() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(0, 64, 5, stair("west"));
        let mut working = single(chunk);
        assert_eq!(run_pass(&StairsPass, &mut working, ChunkPos::new(0, 0)), 0);
        assert_eq!(block(&working, BlockPos::new(0, 64, 5)).property("shape"), None);
    }
}
