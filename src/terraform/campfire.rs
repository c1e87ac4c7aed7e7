//! Campfires on hay bales are signal fires.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::world::{BlockAccessor, Chunk};

pub struct CampfirePass;

impl TerraformPass for CampfirePass {
    fn name(&self) -> &'static str {
        "campfire"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::CAMPFIRE
    }

    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, block) in for_each_block(chunk, |b| b.is("campfire") || b.is("soul_campfire")) {
            let Some(below) = world.block_at(pos.down()) else {
                continue;
            };
            let signal = below.is("hay_block");
            edits.set_block(block, pos, block.with_property("signal_fire", signal));
        }
    }
}
