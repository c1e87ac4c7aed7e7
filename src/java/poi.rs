//! Point-of-interest records (`poi/r.X.Z.mca`).
//!
//! Only nether portals are written; the game rebuilds every other kind of POI
//! from the blocks on load.

use super::chunk::DATA_VERSION;
use crate::error::ChunkFailure;
use crate::nbt_utils::CompoundBuilder;
use crate::world::Chunk;
use fastnbt::Value;
use std::collections::BTreeMap;

const PORTAL_POI: &str = "minecraft:nether_portal";

/// POI chunk for `chunk`, or `None` when it holds no portal blocks.
pub fn encode_poi(chunk: &Chunk) -> Result<Option<Vec<u8>>, ChunkFailure> {
    let portals = chunk.positions_where(|b| b.is("nether_portal"));
    if portals.is_empty() {
        return Ok(None);
    }
    let mut sections: BTreeMap<i32, Vec<Value>> = BTreeMap::new();
    for pos in portals {
        let record = CompoundBuilder::new()
            .int_array("pos", vec![pos.x, pos.y, pos.z])
            .int("free_tickets", 0)
            .string("type", PORTAL_POI)
            .into_value();
        sections.entry(pos.y.div_euclid(16)).or_default().push(record);
    }
    let sections = sections
        .into_iter()
        .fold(CompoundBuilder::new(), |b, (y, records)| {
            b.compound(
                &y.to_string(),
                CompoundBuilder::new().flag("Valid", true).list("Records", records).build(),
            )
        })
        .build();
    let root = CompoundBuilder::new()
        .int("DataVersion", DATA_VERSION)
        .compound("Sections", sections)
        .build();
    Ok(Some(fastnbt::to_bytes(&root)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_definitions::BlockState;
    use crate::coords::{ChunkPos, Dimension};
    use crate::nbt_utils::{as_compound, Compound, CompoundExt};

    #[test]
    fn test_portal_blocks_become_poi_records() {
        let mut chunk = Chunk::new(Dimension::Nether, ChunkPos::new(0, 0));
        assert!(encode_poi(&chunk).unwrap().is_none());

        let portal = BlockState::new("nether_portal").with("axis", "x");
        chunk.set_block(4, 31, 2, portal.clone());
        chunk.set_block(4, 32, 2, portal);
        let bytes = encode_poi(&chunk).unwrap().unwrap();
        let root: Compound = fastnbt::from_bytes(&bytes).unwrap();
        let sections = root.get_compound("Sections").unwrap();
        let lower = sections.get_compound("1").unwrap();
        let upper = sections.get_compound("2").unwrap();
        assert_eq!(lower.get_list("Records").unwrap().len(), 1);
        let record = as_compound(&upper.get_list("Records").unwrap()[0]).unwrap();
        assert_eq!(record.get_int_array("pos"), Some(&[4, 32, 2][..]));
        assert_eq!(record.get_str("type"), Some(PORTAL_POI));
    }
}
