//! `snowy` on grass, podzol and mycelium follows the block above.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::block_definitions::BlockState;
use crate::world::{BlockAccessor, Chunk};

pub fn is_snowy_capable(name: &str) -> bool {
    matches!(name, "grass_block" | "podzol" | "mycelium")
}

fn is_snow_cover(block: &BlockState) -> bool {
    matches!(block.short_name(), "snow" | "snow_block" | "powder_snow")
}

pub struct SnowyPass;

impl TerraformPass for SnowyPass {
    fn name(&self) -> &'static str {
        "snowy"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::SNOWY
    }

    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, block) in for_each_block(chunk, |b| is_snowy_capable(b.short_name())) {
            let Some(above) = world.block_at(pos.up()) else {
                continue;
            };
            let snowy = is_snow_cover(above);
            edits.set_block(block, pos, block.with_property("snowy", snowy));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{BlockPos, ChunkPos};
    use crate::terraform::test_support::*;

    #[test]
    fn test_snow_layer_above_makes_grass_snowy() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(5, 64, 0, BlockState::new("grass_block").with("snowy", "false"));
        chunk.set_block(5, 65, 0, BlockState::new("snow").with("layers", "1"));
        let mut working = single(chunk);
        run_pass(&SnowyPass, &mut working, ChunkPos::new(0, 0));
        let grass = block(&working, BlockPos::new(5, 64, 0));
        assert_eq!(grass.property("snowy"), Some("true"));
        assert_eq!(run_pass(&SnowyPass, &mut working, ChunkPos::new(0, 0)), 0);
    }

    #[test]
    fn test_without_snow_grass_is_not_snowy() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(5, 64, 0, BlockState::new("grass_block").with("snowy", "true"));
        let mut working = single(chunk);
        run_pass(&SnowyPass, &mut working, ChunkPos::new(0, 0));
        let grass = block(&working, BlockPos::new(5, 64, 0));
        assert_eq!(grass.property("snowy"), Some("false"));
    }

    #[test]
    fn test_top_of_world_is_left_alone() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(0, 319, 0, BlockState::new("podzol"));
        let mut working = single(chunk);
        assert_eq!(run_pass(&SnowyPass, &mut working, ChunkPos::new(0, 0)), 0);
    }
}
