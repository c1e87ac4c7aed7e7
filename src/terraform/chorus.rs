//! Chorus plant connections in all six directions.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::block_definitions::BlockState;
use crate::coords::Direction;
use crate::world::{BlockAccessor, Chunk};

fn connects(neighbour: &BlockState, towards: Direction) -> bool {
    neighbour.is("chorus_plant")
        || neighbour.is("chorus_flower")
        || (towards == Direction::Down && neighbour.is("end_stone"))
}

pub struct ChorusPass;

impl TerraformPass for ChorusPass {
    fn name(&self) -> &'static str {
        "chorus"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::CHORUS
    }

    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, block) in for_each_block(chunk, |b| b.is("chorus_plant")) {
            let mut wanted = block.clone();
            for direction in Direction::ALL {
                match world.block_at(pos.step(direction)) {
                    Some(neighbour) => {
                        wanted = wanted.with(direction.name(), connects(neighbour, direction));
                    }
                    None if wanted.property(direction.name()).is_none() => {
                        wanted = wanted.with(direction.name(), false);
                    }
                    None => {}
                }
            }
            edits.set_block(block, pos, wanted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{BlockPos, ChunkPos, Dimension};
    use crate::terraform::test_support::*;
    use crate::world::Chunk;

    #[test]
    fn test_stalk_on_end_stone() {
        let mut chunk = Chunk::new(Dimension::End, ChunkPos::new(0, 0));
        chunk.set_block(8, 60, 8, BlockState::new("end_stone"));
        chunk.set_block(8, 61, 8, BlockState::new("chorus_plant"));
        chunk.set_block(8, 62, 8, BlockState::new("chorus_plant"));
        chunk.set_block(9, 62, 8, BlockState::new("chorus_flower").with("age", "5"));
        chunk.set_block(7, 61, 8, BlockState::new("end_stone"));
        let mut working = single(chunk);
        run_pass(&ChorusPass, &mut working, ChunkPos::new(0, 0));

        let base = block(&working, BlockPos::new(8, 61, 8));
        assert_eq!(base.property("down"), Some("true"));
        assert_eq!(base.property("up"), Some("true"));
        assert_eq!(base.property("west"), Some("false"));
        let top = block(&working, BlockPos::new(8, 62, 8));
        assert_eq!(top.property("east"), Some("true"));
        assert_eq!(top.property("up"), Some("false"));
        assert_eq!(run_pass(&ChorusPass, &mut working, ChunkPos::new(0, 0)), 0);
    }
}
