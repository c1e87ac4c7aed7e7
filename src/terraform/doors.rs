//! Keeps both halves of a door in agreement.
//!
//! The lower half owns `facing`, `open` and `powered`; the upper half owns
//! `hinge`. Each half takes the other's fields.

use super::{for_each_block, Edits, FamilyMask, TerraformPass};
use crate::world::{BlockAccessor, Chunk};

pub struct DoorsPass;

impl TerraformPass for DoorsPass {
    fn name(&self) -> &'static str {
        "doors"
    }

    fn family(&self) -> FamilyMask {
        FamilyMask::DOORS
    }

    fn plan(&self, chunk: &Chunk, world: &dyn BlockAccessor, edits: &mut Edits) {
        for (pos, lower) in for_each_block(chunk, |b| b.is_door() && b.property("half") != Some("upper")) {
            let Some(upper) = world.block_at(pos.up()) else {
                continue;
            };
            if upper.name != lower.name || upper.property("half") != Some("upper") {
                continue;
            }

            let mut new_lower = lower.clone();
            if let Some(hinge) = upper.property("hinge") {
                new_lower = new_lower.with("hinge", hinge);
            }
            let mut new_upper = upper.clone();
            for key in ["facing", "open", "powered"] {
                if let Some(value) = lower.property(key) {
                    new_upper = new_upper.with(key, value);
                }
            }
            edits.set_block(lower, pos, new_lower);
            edits.set_block(upper, pos.up(), new_upper);
        }
    }
}
