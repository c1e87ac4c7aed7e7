//! LevelDB key layout.
//!
//! Chunk records are keyed `[x i32 LE][z i32 LE][dimension i32 LE][tag]` with
//! the dimension omitted for the overworld, and sub-chunks append their
//! signed section index.

use crate::coords::{ChunkPos, Dimension};
use crate::error::ConvertError;
use crate::storage::KeyValueStore;
use std::collections::BTreeSet;

pub mod tag {
    pub const DATA_3D: u8 = 0x2B;
    pub const CHUNK_VERSION: u8 = 0x2C;
    pub const SUB_CHUNK_PREFIX: u8 = 0x2F;
    pub const BLOCK_ENTITY: u8 = 0x31;
    pub const ENTITY: u8 = 0x32;
    pub const PENDING_TICKS: u8 = 0x33;
    pub const FINALIZED_STATE: u8 = 0x36;
    pub const HARDCODED_SPAWNERS: u8 = 0x39;
    /// Chunk version tag used before 1.16.100.
    pub const LEGACY_CHUNK_VERSION: u8 = 0x76;
}

pub const LOCAL_PLAYER: &[u8] = b"~local_player";
pub const PORTALS: &[u8] = b"portals";
pub const MAP_PREFIX: &[u8] = b"map_";
const DIGP_PREFIX: &[u8] = b"digp";
const ACTOR_PREFIX: &[u8] = b"actorprefix";

fn chunk_prefix(dimension: Dimension, pos: ChunkPos) -> Vec<u8> {
    let mut key = Vec::with_capacity(14);
    key.extend_from_slice(&pos.x.to_le_bytes());
    key.extend_from_slice(&pos.z.to_le_bytes());
    if dimension != Dimension::Overworld {
        key.extend_from_slice(&dimension.bedrock_id().to_le_bytes());
    }
    key
}

pub fn chunk_key(dimension: Dimension, pos: ChunkPos, tag: u8) -> Vec<u8> {
    let mut key = chunk_prefix(dimension, pos);
    key.push(tag);
    key
}

pub fn subchunk_key(dimension: Dimension, pos: ChunkPos, section_y: i8) -> Vec<u8> {
    let mut key = chunk_key(dimension, pos, tag::SUB_CHUNK_PREFIX);
    key.push(section_y as u8);
    key
}

pub fn digp_key(dimension: Dimension, pos: ChunkPos) -> Vec<u8> {
    let mut key = DIGP_PREFIX.to_vec();
    key.extend_from_slice(&chunk_prefix(dimension, pos));
    key
}

/// Storage key of one actor. `digp` lists the same eight bytes.
pub fn actor_storage_id(unique_id: i64) -> [u8; 8] {
    unique_id.to_le_bytes()
}

pub fn actor_key(storage_id: &[u8]) -> Vec<u8> {
    let mut key = ACTOR_PREFIX.to_vec();
    key.extend_from_slice(storage_id);
    key
}

pub fn map_key(id: i64) -> Vec<u8> {
    format!("map_{id}").into_bytes()
}

pub fn map_id_from_key(key: &[u8]) -> Option<i64> {
    std::str::from_utf8(key.strip_prefix(MAP_PREFIX)?).ok()?.parse().ok()
}

/// Decoded chunk record key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkKey {
    pub dimension: Dimension,
    pub pos: ChunkPos,
    pub tag: u8,
    pub section_y: Option<i8>,
}

pub fn parse_chunk_key(key: &[u8]) -> Option<ChunkKey> {
    let int = |at: usize| -> Option<i32> { Some(i32::from_le_bytes(key.get(at..at + 4)?.try_into().ok()?)) };
    let pos = ChunkPos::new(int(0)?, int(4)?);
    let (dimension, rest) = match key.len() {
        9 | 10 => (Dimension::Overworld, &key[8..]),
        13 | 14 => {
            let dimension = Dimension::from_bedrock_id(int(8)?).filter(|d| *d != Dimension::Overworld)?;
            (dimension, &key[12..])
        }
        _ => return None,
    };
    let tag = rest[0];
    let section_y = match (tag, rest.get(1)) {
        (tag::SUB_CHUNK_PREFIX, Some(y)) => Some(*y as i8),
        (_, None) => None,
        _ => return None,
    };
    if section_y.is_none() && tag == tag::SUB_CHUNK_PREFIX {
        return None;
    }
    Some(ChunkKey {
        dimension,
        pos,
        tag,
        section_y,
    })
}

/// Every chunk in `store` that has a version record.
pub fn list_chunks(store: &dyn KeyValueStore) -> Result<BTreeSet<(Dimension, ChunkPos)>, ConvertError> {
    Ok(store
        .keys_with_prefix(&[])?
        .iter()
        .filter_map(|key| parse_chunk_key(key))
        .filter(|k| k.tag == tag::CHUNK_VERSION || k.tag == tag::LEGACY_CHUNK_VERSION)
        .map(|k| (k.dimension, k.pos))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_parse_back() {
        let pos = ChunkPos::new(-3, 17);
        let key = subchunk_key(Dimension::Nether, pos, -4);
        assert_eq!(key.len(), 14);
        let parsed = parse_chunk_key(&key).unwrap();
        assert_eq!(parsed.dimension, Dimension::Nether);
        assert_eq!(parsed.pos, pos);
        assert_eq!(parsed.section_y, Some(-4));

        let version = chunk_key(Dimension::Overworld, pos, tag::CHUNK_VERSION);
        assert_eq!(version.len(), 9);
        assert_eq!(parse_chunk_key(&version).unwrap().tag, tag::CHUNK_VERSION);
    }

    #[test]
    fn test_named_keys_are_not_chunk_keys() {
        assert!(parse_chunk_key(LOCAL_PLAYER).is_none());
        assert!(parse_chunk_key(PORTALS).is_none());
        assert!(parse_chunk_key(&map_key(-12)).is_none());
        assert_eq!(map_id_from_key(&map_key(-12)), Some(-12));
    }
}
