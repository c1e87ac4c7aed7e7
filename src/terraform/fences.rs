//! Horizontal connections of fences, glass panes and iron bars.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::block_definitions::BlockState;
use crate::coords::Direction;
use crate::world::{BlockAccessor, Chunk};

fn axis_of(name: &str) -> char {
    match name {
        "east" | "west" => 'x',
        _ => 'z',
    }
}

fn fence_connects(fence: &BlockState, neighbour: &BlockState, towards: Direction) -> bool {
    if neighbour.is_full_solid() {
        return true;
    }
    if neighbour.is_fence() {
        // Nether brick fences only join each other; wooden fences join any wood.
        let nether = |b: &BlockState| b.is("nether_brick_fence");
        return nether(fence) == nether(neighbour);
    }
    if neighbour.is_fence_gate() {
        let gate_facing = neighbour.property("facing").unwrap_or("north");
        return axis_of(gate_facing) != axis_of(towards.name());
    }
    false
}

fn pane_connects(neighbour: &BlockState) -> bool {
    neighbour.is_full_solid() || neighbour.is_pane() || neighbour.is_wall()
}

pub struct FencesPass;

impl TerraformPass for FencesPass {
    fn name(&self) -> &'static str {
        "fences"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::FENCES
    }

    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, block) in for_each_block(chunk, |b| b.is_fence() || b.is_pane()) {
            let mut wanted = block.clone();
            for direction in Direction::HORIZONTAL {
                let Some(neighbour) = world.block_at(pos.step(direction)) else {
                    if wanted.property(direction.name()).is_none() {
                        wanted = wanted.with(direction.name(), false);
                    }
                    continue;
                };
                let connected = if block.is_fence() {
                    fence_connects(block, neighbour, direction)
                } else {
                    pane_connects(neighbour)
                };
                wanted = wanted.with(direction.name(), connected);
            }
            edits.set_block(block, pos, wanted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{BlockPos, ChunkPos};
    use crate::terraform::test_support::*;

    #[test]
    fn test_fence_row_connects_across_chunk_border() {
        let mut left = chunk_at(0, 0);
        left.set_block(15, 64, 0, BlockState::new("oak_fence"));
        left.set_block(15, 64, 1, BlockState::new("stone"));
        let mut right = chunk_at(1, 0);
        right.set_block(0, 64, 0, BlockState::new("spruce_fence"));
        let mut working = single(left);
        working.insert(right.pos, right);

        run_pass(&FencesPass, &mut working, ChunkPos::new(0, 0));
        let fence = block(&working, BlockPos::new(15, 64, 0));
        assert_eq!(fence.property("east"), Some("true"));
        assert_eq!(fence.property("south"), Some("true"));
        assert_eq!(fence.property("west"), Some("false"));
        assert_eq!(fence.property("north"), Some("false"));
        assert_eq!(run_pass(&FencesPass, &mut working, ChunkPos::new(0, 0)), 0);
    }

    #[test]
    fn test_unloaded_neighbour_keeps_property() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(15, 64, 0, BlockState::new("glass_pane").with("east", "true"));
        let mut working = single(chunk);
        run_pass(&FencesPass, &mut working, ChunkPos::new(0, 0));
        let pane = block(&working, BlockPos::new(15, 64, 0));
        assert_eq!(pane.property("east"), Some("true"));
        assert_eq!(pane.property("west"), Some("false"));
    }

    #[test]
    fn test_nether_fence_does_not_join_wood() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(0, 64, 0, BlockState::new("nether_brick_fence"));
        chunk.set_block(1, 64, 0, BlockState::new("oak_fence"));
        chunk.set_block(0, 64, 1, BlockState::new("oak_fence_gate").with("facing", "east"));
        let mut working = single(chunk);
        run_pass(&FencesPass, &mut working, ChunkPos::new(0, 0));
        let fence = block(&working, BlockPos::new(0, 64, 0));
        assert_eq!(fence.property("east"), Some("false"));
        assert_eq!(fence.property("south"), Some("true"));
    }
}
