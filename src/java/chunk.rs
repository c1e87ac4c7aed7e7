//! Java region chunk NBT to and from the canonical [`Chunk`].
//!
//! Only the 1.18+ layout (root-level sections, `block_states`/`biomes`
//! containers) is read. Older chunks fail with
//! [`ChunkFailure::UnsupportedVersion`].

use crate::block_definitions::{BlockState, AIR};
use crate::context::Services;
use crate::coords::{BlockPos, ChunkPos, Dimension};
use crate::entity::block_entities;
use crate::error::ChunkFailure;
use crate::nbt_utils::{Compound, CompoundBuilder, CompoundExt};
use crate::palette::{java_bits_per_entry, pack_java, unpack_java};
use crate::records::{StructureKind, StructureRecord};
use crate::stats::{anomaly, ChunkLog};
use crate::world::biome_grid::{BiomeGrid, CELLS};
use crate::world::section::SECTION_VOLUME;
use crate::world::{Chunk, PendingTick, Section};
use fastnbt::{IntArray, LongArray, Value};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Data version written to every chunk (1.21.1).
pub const DATA_VERSION: i32 = 3955;
/// First data version with the 1.18 chunk layout.
pub const MIN_DATA_VERSION: i32 = 2860;

#[derive(Deserialize)]
struct VersionHeader {
    #[serde(rename = "DataVersion", default)]
    data_version: i32,
}

#[derive(Serialize, Deserialize)]
struct ChunkNbt {
    #[serde(rename = "DataVersion")]
    data_version: i32,
    #[serde(rename = "xPos")]
    x_pos: i32,
    #[serde(rename = "yPos", default)]
    y_pos: i32,
    #[serde(rename = "zPos")]
    z_pos: i32,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(rename = "LastUpdate", default)]
    last_update: i64,
    #[serde(rename = "InhabitedTime", default)]
    inhabited_time: i64,
    #[serde(rename = "isLightOn", default)]
    is_light_on: i8,
    #[serde(default)]
    sections: Vec<SectionNbt>,
    #[serde(default)]
    block_entities: Vec<Compound>,
    #[serde(default)]
    block_ticks: Vec<TickNbt>,
    #[serde(default)]
    fluid_ticks: Vec<TickNbt>,
    #[serde(rename = "Heightmaps", default)]
    heightmaps: HashMap<String, LongArray>,
    #[serde(default)]
    structures: StructuresNbt,
}

#[derive(Serialize, Deserialize)]
struct SectionNbt {
    #[serde(rename = "Y")]
    y: i8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block_states: Option<Container<PaletteItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    biomes: Option<Container<String>>,
}

#[derive(Serialize, Deserialize)]
struct Container<T> {
    palette: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<LongArray>,
}

#[derive(Serialize, Deserialize, Clone)]
struct PaletteItem {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Properties", default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize)]
struct TickNbt {
    i: String,
    x: i32,
    y: i32,
    z: i32,
    t: i32,
    p: i32,
}

#[derive(Serialize, Deserialize, Default)]
struct StructuresNbt {
    #[serde(default)]
    starts: HashMap<String, Compound>,
    #[serde(rename = "References", default)]
    references: HashMap<String, LongArray>,
}

/// Entity region chunk (`entities/r.X.Z.mca`).
#[derive(Serialize, Deserialize)]
struct EntityChunkNbt {
    #[serde(rename = "DataVersion")]
    data_version: i32,
    #[serde(rename = "Position")]
    position: IntArray,
    #[serde(rename = "Entities", default)]
    entities: Vec<Compound>,
}

/// Java names outside the `minecraft` namespace become air.
fn canonical_block(item: &PaletteItem, log: &mut ChunkLog<'_>) -> BlockState {
    let block = BlockState::new(&item.name).with_properties(item.properties.clone());
    if block.namespace() != "minecraft" {
        log.count(anomaly::UNKNOWN_BLOCKS);
        return AIR.clone();
    }
    block
}

fn unpack(
    data: Option<&LongArray>,
    palette_len: usize,
    min_bits: u32,
    count: usize,
) -> Result<Vec<u16>, ChunkFailure> {
    if palette_len <= 1 {
        return Ok(vec![0; count]);
    }
    let bits = java_bits_per_entry(palette_len, min_bits);
    let data = data.ok_or_else(|| ChunkFailure::Malformed("paletted container without data".to_string()))?;
    unpack_java(data, bits, count)
        .ok_or_else(|| ChunkFailure::Malformed(format!("data array too short for {bits} bit entries")))
}

/// Starts of the kinds Bedrock records. A start without usable bounds is
/// dropped and counted.
fn decode_structures(chunk: &mut Chunk, structures: &StructuresNbt, log: &mut ChunkLog<'_>) {
    for (name, start) in &structures.starts {
        let Some(kind) = StructureKind::from_java_name(name) else {
            continue;
        };
        let mut bounds: Option<[i32; 6]> = None;
        let pieces = start.get_list("Children").map(Vec::as_slice).unwrap_or(&[]);
        for piece in pieces.iter().filter_map(crate::nbt_utils::as_compound) {
            let Some(&[a, b, c, d, e, f]) = piece.get_int_array("BB") else {
                continue;
            };
            bounds = Some(match bounds {
                None => [a, b, c, d, e, f],
                Some(o) => [o[0].min(a), o[1].min(b), o[2].min(c), o[3].max(d), o[4].max(e), o[5].max(f)],
            });
        }
        match bounds.and_then(|b| StructureRecord::from_bounds(chunk.dimension, kind, b)) {
            Some(record) => chunk.structures.push(record),
            None => log.count(anomaly::DROPPED_STRUCTURE_RECORDS),
        }
    }
}

fn decode_ticks(ticks: &[TickNbt], fluid: bool, out: &mut Vec<PendingTick>) {
    out.extend(ticks.iter().map(|t| PendingTick {
        pos: BlockPos::new(t.x, t.y, t.z),
        target: BlockState::new(&t.i).name,
        delay: t.t,
        priority: t.p,
        fluid,
    }));
}

/// Decodes one region chunk. `pos` is where the region header put it.
pub fn decode_chunk(
    data: &[u8],
    dimension: Dimension,
    pos: ChunkPos,
    _services: Services<'_>,
    log: &mut ChunkLog<'_>,
) -> Result<Chunk, ChunkFailure> {
    let header: VersionHeader = fastnbt::from_bytes(data)?;
    if header.data_version < MIN_DATA_VERSION {
        return Err(ChunkFailure::UnsupportedVersion(header.data_version));
    }
    let nbt: ChunkNbt = fastnbt::from_bytes(data)?;
    if ChunkPos::new(nbt.x_pos, nbt.z_pos) != pos {
        return Err(ChunkFailure::Malformed(format!(
            "chunk claims position ({}, {})",
            nbt.x_pos, nbt.z_pos
        )));
    }

    let mut chunk = Chunk::new(dimension, pos);
    chunk.source_version = nbt.data_version;
    chunk.inhabited_time = nbt.inhabited_time;
    chunk.last_update = nbt.last_update;

    let mut cache: FnvHashMap<(String, BTreeMap<String, String>), BlockState> = FnvHashMap::default();
    for section in &nbt.sections {
        if section.y < dimension.min_section() || section.y >= dimension.max_section() {
            continue;
        }
        if let Some(states) = &section.block_states {
            let palette: Vec<BlockState> = states
                .palette
                .iter()
                .map(|item| {
                    cache
                        .entry((item.name.clone(), item.properties.clone()))
                        .or_insert_with(|| canonical_block(item, log))
                        .clone()
                })
                .collect();
            if !palette.is_empty() {
                let indices = unpack(states.data.as_ref(), palette.len(), 4, SECTION_VOLUME)?;
                chunk.sections.insert(section.y, Section::from_parts(&palette, &indices));
            }
        }
        if let Some(biomes) = &section.biomes {
            if biomes.palette.is_empty() {
                continue;
            }
            let indices = unpack(biomes.data.as_ref(), biomes.palette.len(), 1, CELLS)?;
            for cy in 0..4 {
                for cz in 0..4 {
                    for cx in 0..4 {
                        let index = indices[BiomeGrid::cell_index(cx, cy, cz)];
                        let name = biomes.palette.get(usize::from(index)).unwrap_or(&biomes.palette[0]);
                        chunk.biomes.set_cell(section.y, cx, cy, cz, name);
                    }
                }
            }
        }
    }
    chunk.prune_empty_sections();

    for tag in nbt.block_entities {
        match block_entities::position(&tag).filter(|p| chunk.contains(*p)) {
            Some(at) => {
                chunk.block_entities.insert(at, tag);
            }
            None => log.count(anomaly::MALFORMED_BLOCK_ENTITIES),
        }
    }

    decode_ticks(&nbt.block_ticks, false, &mut chunk.pending_ticks);
    decode_ticks(&nbt.fluid_ticks, true, &mut chunk.pending_ticks);
    PendingTick::sort(&mut chunk.pending_ticks);

    decode_structures(&mut chunk, &nbt.structures, log);
    chunk.recompute_height_map();
    Ok(chunk)
}

/// Reads the entities of an entity region chunk.
pub fn decode_entities(data: &[u8]) -> Result<Vec<Compound>, ChunkFailure> {
    let nbt: EntityChunkNbt = fastnbt::from_bytes(data)?;
    Ok(nbt.entities)
}

fn encode_blocks(section: Option<&Section>) -> Container<PaletteItem> {
    let item = |b: &BlockState| PaletteItem {
        name: b.name.clone(),
        properties: b.properties.clone(),
    };
    let Some(section) = section else {
        return Container {
            palette: vec![item(&AIR)],
            data: None,
        };
    };
    let (palette, indices) = section.compacted();
    if indices.iter().all(|&i| i == indices[0]) {
        let only = palette.get(usize::from(indices[0])).unwrap_or(&AIR);
        return Container {
            palette: vec![item(only)],
            data: None,
        };
    }
    let bits = java_bits_per_entry(palette.len(), 4);
    Container {
        palette: palette.iter().map(item).collect(),
        data: Some(LongArray::new(pack_java(&indices, bits))),
    }
}

fn encode_biomes(grid: &BiomeGrid, section_y: i8) -> Container<String> {
    let (names, indices) = grid.section_palette(section_y);
    let palette: Vec<String> = names.into_iter().map(str::to_string).collect();
    if palette.len() <= 1 {
        return Container { palette, data: None };
    }
    let bits = java_bits_per_entry(palette.len(), 1);
    Container {
        palette,
        data: Some(LongArray::new(pack_java(&indices, bits))),
    }
}

fn encode_height_map(chunk: &Chunk) -> LongArray {
    let mut map = chunk.height_map.clone();
    map.offset(chunk.dimension.min_section());
    let range = (chunk.dimension.max_y() - chunk.dimension.min_y() + 2) as u32;
    let bits = u32::BITS - range.leading_zeros();
    LongArray::new(pack_java(map.raw(), bits))
}

fn encode_structures(chunk: &Chunk) -> StructuresNbt {
    let mut out = StructuresNbt::default();
    let packed = |pos: ChunkPos| (i64::from(pos.x) & 0xFFFF_FFFF) | (i64::from(pos.z) << 32);
    for record in &chunk.structures {
        let start = record.start_chunk();
        let name = record.kind.java_name().to_string();
        if start == chunk.pos {
            let piece = CompoundBuilder::new()
                .string("id", record.kind.java_piece())
                .int_array("BB", record.bounds().to_vec())
                .int("GD", 0)
                .int("O", 0)
                .into_value();
            let tag = CompoundBuilder::new()
                .string("id", name.clone())
                .int("ChunkX", start.x)
                .int("ChunkZ", start.z)
                .int("references", 0)
                .list("Children", vec![piece])
                .build();
            out.starts.insert(name.clone(), tag);
        }
        let mut refs: Vec<i64> = out
            .references
            .remove(&name)
            .map(|a| a.iter().copied().collect())
            .unwrap_or_default();
        if !refs.contains(&packed(start)) {
            refs.push(packed(start));
        }
        out.references.insert(name, LongArray::new(refs));
    }
    out
}

fn encode_ticks(ticks: &[PendingTick], fluid: bool) -> Vec<TickNbt> {
    ticks
        .iter()
        .filter(|t| t.fluid == fluid)
        .map(|t| TickNbt {
            i: t.target.clone(),
            x: t.pos.x,
            y: t.pos.y,
            z: t.pos.z,
            t: t.delay,
            p: t.priority,
        })
        .collect()
}

/// Encodes a canonical chunk as a region chunk. Entities are written
/// separately by [`encode_entities`].
pub fn encode_chunk(chunk: &Chunk, _services: Services<'_>, log: &mut ChunkLog<'_>) -> Result<Vec<u8>, ChunkFailure> {
    let dimension = chunk.dimension;
    let sections = (dimension.min_section()..dimension.max_section())
        .map(|y| SectionNbt {
            y,
            block_states: Some(encode_blocks(chunk.sections.get(&y))),
            biomes: Some(encode_biomes(&chunk.biomes, y)),
        })
        .collect();

    let mut block_entities = Vec::with_capacity(chunk.block_entities.len());
    for (at, tag) in &chunk.block_entities {
        let Some(id) = tag.get_str("id") else {
            log.count(anomaly::MALFORMED_BLOCK_ENTITIES);
            continue;
        };
        let mut tag = tag.clone();
        tag.insert("id".to_string(), Value::String(id.to_string()));
        tag.insert("x".to_string(), Value::Int(at.x));
        tag.insert("y".to_string(), Value::Int(at.y));
        tag.insert("z".to_string(), Value::Int(at.z));
        tag.entry("keepPacked".to_string()).or_insert(Value::Byte(0));
        block_entities.push(tag);
    }
    log.stats().block_entities += block_entities.len() as u64;

    let mut ticks = chunk.pending_ticks.clone();
    PendingTick::sort(&mut ticks);

    let height_map = encode_height_map(chunk);
    let nbt = ChunkNbt {
        data_version: DATA_VERSION,
        x_pos: chunk.pos.x,
        y_pos: i32::from(dimension.min_section()),
        z_pos: chunk.pos.z,
        status: "minecraft:full".to_string(),
        last_update: chunk.last_update,
        inhabited_time: chunk.inhabited_time,
        is_light_on: 0,
        sections,
        block_entities,
        block_ticks: encode_ticks(&ticks, false),
        fluid_ticks: encode_ticks(&ticks, true),
        heightmaps: HashMap::from([
            ("MOTION_BLOCKING".to_string(), height_map.clone()),
            ("WORLD_SURFACE".to_string(), height_map),
        ]),
        structures: encode_structures(chunk),
    };
    Ok(fastnbt::to_bytes(&nbt)?)
}

/// Encodes a chunk's entities for the entity region, or `None` when it has none.
pub fn encode_entities(chunk: &Chunk, log: &mut ChunkLog<'_>) -> Result<Option<Vec<u8>>, ChunkFailure> {
    if chunk.entities.is_empty() {
        return Ok(None);
    }
    log.stats().entities += chunk.entities.len() as u64;
    let nbt = EntityChunkNbt {
        data_version: DATA_VERSION,
        position: IntArray::new(vec![chunk.pos.x, chunk.pos.z]),
        entities: chunk.entities.clone(),
    };
    Ok(Some(fastnbt::to_bytes(&nbt)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{IdRegistry, VanillaBlockEntities};
    use crate::translation::Translator;
    use std::collections::BTreeSet;

    struct Harness {
        stats: crate::stats::Statistics,
        maps: BTreeSet<i64>,
        translator: Translator,
        registry: IdRegistry,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                stats: Default::default(),
                maps: BTreeSet::new(),
                translator: Translator::new(),
                registry: IdRegistry::new(),
            }
        }

        fn run<T>(&mut self, f: impl FnOnce(Services<'_>, &mut ChunkLog<'_>) -> T) -> T {
            let services = Services {
                translator: &self.translator,
                registry: &self.registry,
                block_entities: &VanillaBlockEntities,
            };
            let mut log = ChunkLog::new(Dimension::Overworld, ChunkPos::new(2, -1), &mut self.stats, &mut self.maps);
            f(services, &mut log)
        }
    }

    fn sample() -> Chunk {
        let pos = ChunkPos::new(2, -1);
        let mut chunk = Chunk::new(Dimension::Overworld, pos);
        for x in 0..16 {
            for z in 0..16 {
                chunk.set_block(x, -64, z, BlockState::new("bedrock"));
            }
        }
        chunk.set_block(3, 70, 4, BlockState::new("oak_stairs").with("facing", "east").with("half", "bottom"));
        chunk.biomes.set_cell(4, 1, 2, 3, "minecraft:desert");
        let chest = BlockPos::new(33, 10, -12);
        chunk.set_block_at(chest, BlockState::new("chest").with("facing", "north"));
        chunk.block_entities.insert(
            chest,
            CompoundBuilder::new().string("id", "minecraft:chest").build(),
        );
        chunk.pending_ticks.push(PendingTick {
            pos: BlockPos::new(33, 11, -12),
            target: "minecraft:water".to_string(),
            delay: 5,
            priority: 0,
            fluid: true,
        });
        chunk.recompute_height_map();
        chunk
    }

    #[test]
    fn test_chunk_survives_region_encoding() {
        let mut h = Harness::new();
        let chunk = sample();
        let bytes = h.run(|s, log| encode_chunk(&chunk, s, log)).unwrap();
        let back = h
            .run(|s, log| decode_chunk(&bytes, Dimension::Overworld, chunk.pos, s, log))
            .unwrap();

        assert_eq!(back.source_version, DATA_VERSION);
        assert_eq!(back.block(3, 70, 4), chunk.block(3, 70, 4));
        assert_eq!(back.block(9, -64, 9).name, "minecraft:bedrock");
        assert_eq!(back.biomes.cell(4, 1, 2, 3), "minecraft:desert");
        assert_eq!(back.biomes.cell(4, 0, 0, 0), "minecraft:plains");
        assert_eq!(back.block_entities.len(), 1);
        assert_eq!(back.pending_ticks, chunk.pending_ticks);
        assert_eq!(back.height_map, chunk.height_map);
        assert_eq!(h.stats.block_entities, 1);
    }

    #[test]
    fn test_pre_caves_and_cliffs_chunks_are_unsupported() {
        let mut h = Harness::new();
        let old = CompoundBuilder::new()
            .int("DataVersion", 2586)
            .compound("Level", CompoundBuilder::new().int("xPos", 2).int("zPos", -1).build())
            .build();
        let bytes = fastnbt::to_bytes(&old).unwrap();
        let result = h.run(|s, log| decode_chunk(&bytes, Dimension::Overworld, ChunkPos::new(2, -1), s, log));
        assert!(matches!(result, Err(ChunkFailure::UnsupportedVersion(2586))));
    }

    #[test]
    fn test_structure_start_round_trip() {
        let mut h = Harness::new();
        let mut chunk = sample();
        let record = StructureRecord::from_bounds(
            Dimension::Overworld,
            StructureKind::SwampHut,
            [32, 60, -16, 38, 68, -9],
        )
        .unwrap();
        chunk.structures.push(record);
        let bytes = h.run(|s, log| encode_chunk(&chunk, s, log)).unwrap();
        let back = h
            .run(|s, log| decode_chunk(&bytes, Dimension::Overworld, chunk.pos, s, log))
            .unwrap();
        assert_eq!(back.structures, vec![record]);
    }

    #[test]
    fn test_unusable_structure_starts_are_counted() {
        let mut h = Harness::new();
        let start = |bb: Option<Vec<i32>>| {
            let mut piece = CompoundBuilder::new().string("id", "minecraft:jigsaw");
            if let Some(bb) = bb {
                piece = piece.int_array("BB", bb);
            }
            CompoundBuilder::new()
                .string("id", "minecraft:pillager_outpost")
                .list("Children", vec![piece.into_value()])
                .build()
        };
        let mut structures = StructuresNbt::default();
        structures.starts.insert(
            "minecraft:pillager_outpost".to_string(),
            start(Some(vec![32, 60, -16, 632, 80, -9])),
        );
        structures.starts.insert("minecraft:monument".to_string(), start(None));
        structures
            .starts
            .insert("minecraft:swamp_hut".to_string(), start(Some(vec![32, 60, -16, 38, 68, -9])));

        let mut chunk = Chunk::new(Dimension::Overworld, ChunkPos::new(2, -1));
        h.run(|_, log| decode_structures(&mut chunk, &structures, log));
        assert_eq!(chunk.structures.len(), 1);
        assert_eq!(chunk.structures[0].kind, StructureKind::SwampHut);
        assert_eq!(h.stats.anomaly(anomaly::DROPPED_STRUCTURE_RECORDS), 2);
    }

    #[test]
    fn test_modded_blocks_become_air() {
        let mut h = Harness::new();
        let block = h.run(|_, log| {
            canonical_block(
                &PaletteItem {
                    name: "mymod:widget".to_string(),
                    properties: BTreeMap::new(),
                },
                log,
            )
        });
        assert!(block.is_air());
        assert_eq!(h.stats.anomaly(anomaly::UNKNOWN_BLOCKS), 1);
    }
}
