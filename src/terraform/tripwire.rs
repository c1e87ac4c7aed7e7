//! Tripwire strings connect to each other and to hooks facing them.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::block_definitions::BlockState;
use crate::coords::Direction;
use crate::world::{BlockAccessor, Chunk};

fn connects(neighbour: &BlockState, towards: Direction) -> bool {
    neighbour.is("tripwire")
        || (neighbour.is("tripwire_hook")
            && neighbour.property("facing") == Some(towards.opposite().name()))
}

pub struct TripwirePass;

impl TerraformPass for TripwirePass {
    fn name(&self) -> &'static str {
        "tripwire"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::TRIPWIRE
    }

    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, block) in for_each_block(chunk, |b| b.is("tripwire")) {
            let mut wanted = block.clone();
            for direction in Direction::HORIZONTAL {
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
    use crate::coords::{BlockPos, ChunkPos};
    use crate::terraform::test_support::*;

    #[test]
    fn test_wire_between_hooks() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(2, 64, 4, BlockState::new("tripwire_hook").with("facing", "east"));
        chunk.set_block(3, 64, 4, BlockState::new("tripwire"));
        chunk.set_block(4, 64, 4, BlockState::new("tripwire"));
        chunk.set_block(5, 64, 4, BlockState::new("tripwire_hook").with("facing", "north"));
        let mut working = single(chunk);
        run_pass(&TripwirePass, &mut working, ChunkPos::new(0, 0));

        let first = block(&working, BlockPos::new(3, 64, 4));
        assert_eq!(first.property("west"), Some("true"));
        assert_eq!(first.property("east"), Some("true"));
        assert_eq!(first.property("north"), Some("false"));
        let second = block(&working, BlockPos::new(4, 64, 4));
        assert_eq!(second.property("west"), Some("true"));
        assert_eq!(second.property("east"), Some("false"));
    }
}
