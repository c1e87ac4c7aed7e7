//! Pistons are extended when their head sits in front of them.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::coords::Direction;
use crate::world::{BlockAccessor, Chunk};

pub struct PistonsPass;

impl TerraformPass for PistonsPass {
    fn name(&self) -> &'static str {
        "pistons"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::PISTONS
    }

    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, block) in for_each_block(chunk, |b| b.is("piston") || b.is("sticky_piston")) {
            let facing = block.property("facing").unwrap_or("up");
            let Some(direction) = Direction::from_name(facing) else {
                continue;
            };
            let Some(front) = world.block_at(pos.step(direction)) else {
                continue;
            };
            let extended = front.is("piston_head") && front.property("facing") == Some(facing);
            edits.set_block(block, pos, block.with_property("extended", extended));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_definitions::BlockState;
    use crate::coords::{BlockPos, ChunkPos};
    use crate::terraform::test_support::*;

    #[test]
    fn test_piston_with_head_is_extended() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(3, 64, 3, BlockState::new("sticky_piston").with("facing", "east"));
        chunk.set_block(
            4,
            64,
            3,
            BlockState::new("piston_head").with("facing", "east").with("type", "sticky"),
        );
        chunk.set_block(3, 66, 3, BlockState::new("piston").with("facing", "up"));
        let mut working = single(chunk);
        run_pass(&PistonsPass, &mut working, ChunkPos::new(0, 0));
        assert_eq!(block(&working, BlockPos::new(3, 64, 3)).property("extended"), Some("true"));
        assert_eq!(block(&working, BlockPos::new(3, 66, 3)).property("extended"), Some("false"));
    }
}
