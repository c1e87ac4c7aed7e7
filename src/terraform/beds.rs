//! Every bed half needs a block entity. Bedrock worlds sometimes lack one,
//! and Java renders a bed without it as invisible.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::nbt_utils::CompoundBuilder;
use crate::world::{BlockAccessor, Chunk};

pub struct BedsPass;

impl TerraformPass for BedsPass {
    fn name(&self) -> &'static str {
        "beds"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::BEDS
    }

    fn plan(&self, chunk: &Chunk, _world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, _) in for_each_block(chunk, |b| b.is_bed()) {
            if chunk.block_entities.contains_key(&pos) {
                continue;
            }
            let tag = CompoundBuilder::new()
                .string("id", "minecraft:bed")
                .int("x", pos.x)
                .int("y", pos.y)
                .int("z", pos.z)
                .build();
            edits.put_block_entity(pos, tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_definitions::BlockState;
    use crate::coords::{BlockPos, ChunkPos};
    use crate::nbt_utils::CompoundExt;
    use crate::terraform::test_support::*;

    #[test]
    fn test_missing_bed_entity_is_created_once() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(1, 64, 1, BlockState::new("blue_bed").with("part", "foot"));
        chunk.set_block(1, 64, 2, BlockState::new("blue_bed").with("part", "head"));
        let mut working = single(chunk);
        assert_eq!(run_pass(&BedsPass, &mut working, ChunkPos::new(0, 0)), 2);
        let tag = &working[&ChunkPos::new(0, 0)].block_entities[&BlockPos::new(1, 64, 2)];
        assert_eq!(tag.get_str("id"), Some("minecraft:bed"));
        assert_eq!(tag.get_i32("z"), Some(2));
        assert_eq!(run_pass(&BedsPass, &mut working, ChunkPos::new(0, 0)), 0);
    }
}
