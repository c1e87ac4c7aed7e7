//! Vines record whether they hang from the block above.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::world::{BlockAccessor, Chunk};

pub struct VinesPass;

impl TerraformPass for VinesPass {
    fn name(&self) -> &'static str {
        "vines"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::VINES
    }

    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, block) in for_each_block(chunk, |b| b.is("vine")) {
            let Some(above) = world.block_at(pos.up()) else {
                continue;
            };
            let up = above.is_full_solid() || above.is_leaves();
            edits.set_block(block, pos, block.with_property("up", up));
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
    fn test_vine_under_leaves_attaches_up() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(1, 70, 1, BlockState::new("jungle_leaves"));
        chunk.set_block(1, 69, 1, BlockState::new("vine").with("north", "true"));
        chunk.set_block(1, 68, 1, BlockState::new("vine").with("north", "true"));
        let mut working = single(chunk);
        run_pass(&VinesPass, &mut working, ChunkPos::new(0, 0));
        assert_eq!(block(&working, BlockPos::new(1, 69, 1)).property("up"), Some("true"));
        assert_eq!(block(&working, BlockPos::new(1, 68, 1)).property("up"), Some("false"));
        assert_eq!(block(&working, BlockPos::new(1, 68, 1)).property("north"), Some("true"));
    }
}
