//! Portal and hardcoded-spawner records.

use super::keys::{self, tag};
use crate::bedrock_nbt;
use crate::coords::{ChunkPos, Dimension};
use crate::error::ConvertError;
use crate::nbt_utils::CompoundBuilder;
use crate::records::{Axis, PortalRecord, StructureKind, StructureRecord, WorldRecords};
use crate::stats::{anomaly, ChunkLog, Statistics};
use crate::storage::KeyValueStore;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use std::collections::BTreeMap;
use std::io::Cursor;

const SPAWNER_SIZE: usize = 6 * 4 + 1;

/// Encodes one chunk's `0x39` record.
pub fn encode_spawners(records: &[StructureRecord]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + records.len() * SPAWNER_SIZE);
    let _ = out.write_i32::<LittleEndian>(records.len() as i32);
    for record in records {
        for v in record.bounds() {
            let _ = out.write_i32::<LittleEndian>(v);
        }
        out.push(record.kind.bedrock_id());
    }
    out
}

/// Decodes a `0x39` record. Entries of unknown type or with absurd bounds are
/// dropped and counted.
pub fn decode_spawners(dimension: Dimension, data: &[u8], log: &mut ChunkLog<'_>) -> Vec<StructureRecord> {
    let mut cursor = Cursor::new(data);
    let Ok(count) = cursor.read_i32::<LittleEndian>() else {
        log.count(anomaly::DROPPED_STRUCTURE_RECORDS);
        return Vec::new();
    };
    let mut out = Vec::new();
    for _ in 0..count.max(0) {
        let mut bounds = [0i32; 6];
        if cursor.read_i32_into::<LittleEndian>(&mut bounds).is_err() {
            log.count(anomaly::DROPPED_STRUCTURE_RECORDS);
            break;
        }
        let Ok(kind) = cursor.read_u8() else {
            log.count(anomaly::DROPPED_STRUCTURE_RECORDS);
            break;
        };
        match StructureKind::from_bedrock_id(kind)
            .and_then(|kind| StructureRecord::from_bounds(dimension, kind, bounds))
        {
            Some(record) => out.push(record),
            None => log.count(anomaly::DROPPED_STRUCTURE_RECORDS),
        }
    }
    out
}

/// The `portals` record for every dimension.
pub fn encode_portals(portals: &[PortalRecord]) -> Vec<u8> {
    let list = portals
        .iter()
        .map(|p| {
            CompoundBuilder::new()
                .int("DimId", p.dimension.bedrock_id())
                .byte("Span", p.width as i8)
                .int("TpX", p.origin.x)
                .int("TpY", p.origin.y)
                .int("TpZ", p.origin.z)
                .flag("Xa", p.axis == Axis::X)
                .flag("Za", p.axis == Axis::Z)
                .into_value()
        })
        .collect();
    let data = CompoundBuilder::new().list("PortalRecords", list).build();
    bedrock_nbt::to_le_bytes(&CompoundBuilder::new().compound("data", data).build())
}

/// Writes the `portals` key and the per-chunk spawner records.
///
/// Structure bounds go to every converted chunk they overlap. A structure that
/// overlaps no converted chunk is dropped and counted.
pub fn write_world_records(
    store: &dyn KeyValueStore,
    dimensions: &[Dimension],
    records: &WorldRecords,
    stats: &mut Statistics,
) -> Result<(), ConvertError> {
    let mut portals = Vec::new();
    for &dimension in dimensions {
        let (found, rejected) = records.portals(dimension);
        stats.count_n(anomaly::DROPPED_PORTAL_RECORDS, rejected as u64);
        portals.extend(found);
    }
    if !portals.is_empty() {
        debug!("Writing {} portal record(s)", portals.len());
        store.put(keys::PORTALS, &encode_portals(&portals))?;
    }

    let mut per_chunk: BTreeMap<(Dimension, ChunkPos), Vec<StructureRecord>> = BTreeMap::new();
    for record in records.structures.iter().filter(|r| dimensions.contains(&r.dimension)) {
        let mut placed = false;
        for pos in record.chunks() {
            if records.converted.contains(&(record.dimension, pos)) {
                per_chunk.entry((record.dimension, pos)).or_default().push(*record);
                placed = true;
            }
        }
        if !placed {
            stats.count(anomaly::DROPPED_STRUCTURE_RECORDS);
        }
    }
    for ((dimension, pos), list) in per_chunk {
        store.put(
            &keys::chunk_key(dimension, pos, tag::HARDCODED_SPAWNERS),
            &encode_spawners(&list),
        )?;
    }
    Ok(())
}
