//! Head/body plants: a plant block capped by another block of its kind is a
//! body ("_plant") block, the tip is the head.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::block_definitions::BlockState;
use crate::coords::Direction;
use crate::world::{BlockAccessor, Chunk};

/// (head, body, growth direction)
const PLANTS: [(&str, &str, Direction); 4] = [
    ("kelp", "kelp_plant", Direction::Up),
    ("twisting_vines", "twisting_vines_plant", Direction::Up),
    ("weeping_vines", "weeping_vines_plant", Direction::Down),
    ("cave_vines", "cave_vines_plant", Direction::Down),
];

fn family_of(name: &str) -> Option<(&'static str, &'static str, Direction)> {
    PLANTS
        .iter()
        .copied()
        .find(|(head, body, _)| *head == name || *body == name)
}

pub fn is_head_body_plant(name: &str) -> bool {
    family_of(name).is_some()
}

fn with_berries(mut block: BlockState, from: &BlockState) -> BlockState {
    if let Some(berries) = from.property("berries") {
        block = block.with("berries", berries);
    }
    block
}

pub struct PlantsPass;

impl TerraformPass for PlantsPass {
    fn name(&self) -> &'static str {
        "plants"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::PLANTS
    }

    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, block) in for_each_block(chunk, |b| is_head_body_plant(b.short_name())) {
            let Some((head, body, growth)) = family_of(block.short_name()) else {
                continue;
            };
            let Some(next) = world.block_at(pos.step(growth)) else {
                continue;
            };
            let capped = next.is(head) || next.is(body);
            let wanted = if capped {
                if block.is(body) {
                    continue;
                }
                with_berries(BlockState::new(body), block)
            } else {
                if block.is(head) {
                    continue;
                }
                with_berries(BlockState::new(head), block)
            };
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
    fn test_kelp_column_gets_body_blocks() {
        let mut chunk = chunk_at(0, 0);
        for y in 50..54 {
            chunk.set_block(0, y, 0, BlockState::new("kelp").with("age", "7"));
        }
        let mut working = single(chunk);
        run_pass(&PlantsPass, &mut working, ChunkPos::new(0, 0));
        for y in 50..53 {
            assert!(block(&working, BlockPos::new(0, y, 0)).is("kelp_plant"));
        }
        let top = block(&working, BlockPos::new(0, 53, 0));
        assert!(top.is("kelp"));
        assert_eq!(top.property("age"), Some("7"));
        assert_eq!(run_pass(&PlantsPass, &mut working, ChunkPos::new(0, 0)), 0);
    }

    #[test]
    fn test_weeping_vines_grow_down() {
        let mut chunk = chunk_at(0, 0);
        chunk.set_block(0, 40, 0, BlockState::new("weeping_vines"));
        chunk.set_block(0, 39, 0, BlockState::new("weeping_vines"));
        let mut working = single(chunk);
        run_pass(&PlantsPass, &mut working, ChunkPos::new(0, 0));
        assert!(block(&working, BlockPos::new(0, 40, 0)).is("weeping_vines_plant"));
        assert!(block(&working, BlockPos::new(0, 39, 0)).is("weeping_vines"));
    }
}
