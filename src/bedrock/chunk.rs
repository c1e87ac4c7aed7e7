//! Bedrock chunk records to and from the canonical [`Chunk`].

use super::keys::{self, tag};
use super::subchunk::{self, Data3d, Layer, VOLUME};
use crate::bedrock_nbt;
use crate::block_definitions::{BlockState, AIR};
use crate::context::Services;
use crate::coords::{BlockPos, ChunkPos, Dimension};
use crate::entity::{block_entities, entities_to_bedrock, entities_to_java};
use crate::error::ChunkFailure;
use crate::nbt_utils::{as_compound, Compound, CompoundBuilder, CompoundExt};
use crate::palette::BlockPalette;
use crate::stats::{anomaly, ChunkLog};
use crate::storage::KeyValueStore;
use crate::translation::bedrock_block_map::{BedrockBlock, BedrockBlockStateValue};
use crate::world::biome_grid::BiomeGrid;
use crate::world::{Chunk, PendingTick, Section};
use fnv::FnvHashMap;

/// Chunk format version written to the version record (1.21).
pub const CHUNK_VERSION: u8 = 40;

/// `FinalizedState` value of a fully generated chunk.
const FINALIZED: i32 = 2;

const WATER_NAMES: [&str; 2] = ["minecraft:water", "minecraft:flowing_water"];

/// A chunk's records, ready to be put into the store.
pub type Records = Vec<(Vec<u8>, Vec<u8>)>;

fn water_entry() -> BedrockBlock {
    let mut water = BedrockBlock::simple("water");
    water
        .states
        .insert("liquid_depth".to_string(), BedrockBlockStateValue::Int(0));
    water
}

fn translate_entry(entry: &Compound, services: Services<'_>, log: &mut ChunkLog<'_>) -> BlockState {
    let Some(block) = BedrockBlock::from_palette_entry(entry) else {
        log.count(anomaly::UNKNOWN_BLOCKS);
        return AIR.clone();
    };
    let java = services.translator.block_to_java(&block);
    if !java.known {
        log.count(anomaly::UNKNOWN_BLOCKS);
    }
    java.value
}

fn decode_section(layers: &[Layer], services: Services<'_>, log: &mut ChunkLog<'_>) -> Option<Section> {
    let blocks = layers.first()?;
    if blocks.palette.is_empty() {
        return None;
    }
    let translated: Vec<BlockState> = blocks
        .palette
        .iter()
        .map(|entry| translate_entry(entry, services, log))
        .collect();

    let water: Vec<bool> = match layers.get(1) {
        Some(layer) => {
            let is_water: Vec<bool> = layer
                .palette
                .iter()
                .map(|e| e.get_str("name").is_some_and(|n| WATER_NAMES.contains(&n)))
                .collect();
            layer
                .indices
                .iter()
                .map(|&i| is_water.get(usize::from(i)).copied().unwrap_or(false))
                .collect()
        }
        None => Vec::new(),
    };

    let mut palette = translated.clone();
    let mut waterlogged: FnvHashMap<u16, u16> = FnvHashMap::default();
    let mut indices = vec![0u16; VOLUME];
    for (xzy, &raw) in blocks.indices.iter().enumerate() {
        let mut index = raw;
        let block = translated.get(usize::from(raw));
        let submerged = water.get(xzy).copied().unwrap_or(false);
        if let Some(block) = block.filter(|b| submerged && b.is_waterloggable()) {
            index = *waterlogged.entry(raw).or_insert_with(|| {
                palette.push(block.with_property("waterlogged", "true"));
                (palette.len() - 1) as u16
            });
        }
        indices[subchunk::to_yzx(xzy)] = index;
    }
    Some(Section::from_parts(&palette, &indices))
}

fn decode_biomes(
    chunk: &mut Chunk,
    data: &Data3d,
    services: Services<'_>,
    log: &mut ChunkLog<'_>,
) {
    let mut names: FnvHashMap<u32, String> = FnvHashMap::default();
    let min_section = chunk.dimension.min_section();
    for (offset, ids) in data.biomes.iter().enumerate() {
        let section_y = min_section + offset as i8;
        if section_y >= chunk.dimension.max_section() {
            break;
        }
        for cy in 0..4 {
            for cz in 0..4 {
                for cx in 0..4 {
                    // Sample the centre of each 4×4×4 cell.
                    let xzy = ((cx * 4 + 2) << 8) | ((cz * 4 + 2) << 4) | (cy * 4 + 2);
                    let id = ids.get(xzy).copied().unwrap_or(0);
                    let name = names.entry(id).or_insert_with(|| {
                        let java = services.translator.biome_to_java(id);
                        if !java.known {
                            log.count(anomaly::UNKNOWN_BIOMES);
                        }
                        java.value
                    });
                    chunk.biomes.set_cell(section_y, cx, cy, cz, name);
                }
            }
        }
    }
}

/// Renames blocks whose Java identity lives in the Bedrock block entity.
fn apply_block_entity_identity(chunk: &mut Chunk, pos: BlockPos, bedrock: &Compound) {
    let Some(block) = chunk.block_at(pos).cloned() else {
        return;
    };
    let updated = if block.is_bed() {
        block_entities::bed_color(bedrock).map(|color| block.renamed(&format!("{color}_bed")))
    } else if block.short_name().ends_with("_wall_banner") {
        block_entities::banner_color(bedrock).map(|color| block.renamed(&format!("{color}_wall_banner")))
    } else if block.short_name().ends_with("_banner") {
        block_entities::banner_color(bedrock).map(|color| block.renamed(&format!("{color}_banner")))
    } else if block.is("chest") || block.is("trapped_chest") {
        let facing = block.property("facing").unwrap_or("north");
        let kind = block_entities::chest_type(bedrock, facing).unwrap_or("single");
        Some(block.with_property("type", kind))
    } else {
        None
    };
    if let Some(updated) = updated {
        chunk.set_block_at(pos, updated);
    }
}

fn read_actors(
    store: &dyn KeyValueStore,
    dimension: Dimension,
    pos: ChunkPos,
    log: &mut ChunkLog<'_>,
) -> Result<Vec<Compound>, ChunkFailure> {
    let mut actors = Vec::new();
    if let Some(legacy) = store.get(&keys::chunk_key(dimension, pos, tag::ENTITY))? {
        actors.extend(bedrock_nbt::read_all(&legacy)?);
    }
    if let Some(digp) = store.get(&keys::digp_key(dimension, pos))? {
        for storage_id in digp.chunks_exact(8) {
            match store.get(&keys::actor_key(storage_id))? {
                Some(data) => match bedrock_nbt::from_le_bytes(&data) {
                    Ok(actor) => actors.push(actor),
                    Err(e) => {
                        log.count(anomaly::MALFORMED_ENTITIES);
                        log.error(format!("unreadable actor record: {e}"));
                    }
                },
                None => log.count(anomaly::UNRESOLVED_LINKS),
            }
        }
    }
    Ok(actors)
}

fn decode_pending_ticks(
    data: &[u8],
    services: Services<'_>,
    log: &mut ChunkLog<'_>,
) -> Result<Vec<PendingTick>, ChunkFailure> {
    let root = bedrock_nbt::from_le_bytes(data)?;
    let current = root.get_i64("currentTick").unwrap_or(0);
    let mut ticks = Vec::new();
    for tick in root
        .get_list("tickList")
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .filter_map(as_compound)
    {
        let (Some(state), Some(x), Some(y), Some(z)) = (
            tick.get_compound("blockState"),
            tick.get_i32("x"),
            tick.get_i32("y"),
            tick.get_i32("z"),
        ) else {
            log.count(anomaly::DROPPED_PENDING_TICKS);
            continue;
        };
        let block = translate_entry(state, services, log);
        let delay = (tick.get_i64("time").unwrap_or(current) - current).clamp(0, i64::from(i32::MAX));
        ticks.push(PendingTick {
            pos: BlockPos::new(x, y, z),
            fluid: block.is_liquid(),
            target: block.name,
            delay: delay as i32,
            priority: tick.get_i32("priority").unwrap_or(0),
        });
    }
    PendingTick::sort(&mut ticks);
    Ok(ticks)
}

/// Reads one chunk. `Ok(None)` when the chunk has no version record.
pub fn decode_chunk(
    store: &dyn KeyValueStore,
    dimension: Dimension,
    pos: ChunkPos,
    services: Services<'_>,
    log: &mut ChunkLog<'_>,
) -> Result<Option<Chunk>, ChunkFailure> {
    let version = match store.get(&keys::chunk_key(dimension, pos, tag::CHUNK_VERSION))? {
        Some(v) => v,
        None => match store.get(&keys::chunk_key(dimension, pos, tag::LEGACY_CHUNK_VERSION))? {
            Some(v) => v,
            None => return Ok(None),
        },
    };
    let mut chunk = Chunk::new(dimension, pos);
    chunk.source_version = version.first().copied().map(i32::from).unwrap_or(0);

    for section_y in dimension.min_section()..dimension.max_section() {
        let Some(data) = store.get(&keys::subchunk_key(dimension, pos, section_y))? else {
            continue;
        };
        let layers = subchunk::decode_subchunk(&data)?;
        if let Some(section) = decode_section(&layers, services, log) {
            chunk.sections.insert(section_y, section);
        }
    }
    chunk.prune_empty_sections();

    if let Some(data) = store.get(&keys::chunk_key(dimension, pos, tag::DATA_3D))? {
        let sections = (dimension.max_section() - dimension.min_section()) as usize;
        let data3d = subchunk::decode_data3d(&data, sections)?;
        decode_biomes(&mut chunk, &data3d, services, log);
    }

    if let Some(data) = store.get(&keys::chunk_key(dimension, pos, tag::BLOCK_ENTITY))? {
        for tag in bedrock_nbt::read_all(&data)? {
            let Some(at) = block_entities::position(&tag).filter(|p| chunk.contains(*p)) else {
                log.count(anomaly::MALFORMED_BLOCK_ENTITIES);
                continue;
            };
            apply_block_entity_identity(&mut chunk, at, &tag);
            let block = chunk.block_at(at).cloned().unwrap_or_else(|| AIR.clone());
            if let Some(java) = services.block_entities.to_java(&tag, &block, log) {
                chunk.block_entities.insert(at, java);
            }
        }
    }

    if let Some(data) = store.get(&keys::chunk_key(dimension, pos, tag::PENDING_TICKS))? {
        chunk.pending_ticks = decode_pending_ticks(&data, services, log)?;
    }

    if let Some(data) = store.get(&keys::chunk_key(dimension, pos, tag::HARDCODED_SPAWNERS))? {
        chunk.structures = super::records::decode_spawners(dimension, &data, log);
    }

    let actors = read_actors(store, dimension, pos, log)?;
    chunk.entities = entities_to_java(&actors, services.registry, services.translator, log);

    chunk.recompute_height_map();
    Ok(Some(chunk))
}

fn encode_sections(chunk: &Chunk, services: Services<'_>, log: &mut ChunkLog<'_>, out: &mut Records) {
    let mut cache: FnvHashMap<BlockState, (BedrockBlock, bool)> = FnvHashMap::default();
    for (&section_y, section) in &chunk.sections {
        if section.is_empty() {
            continue;
        }
        let (palette, indices) = section.compacted();
        let mut blocks = BlockPalette::new(BedrockBlock::air());
        let mut water = BlockPalette::new(BedrockBlock::air());
        let water_index = water.insert(water_entry());
        let mut any_water = false;

        let remap: Vec<(u16, bool)> = palette
            .iter()
            .map(|block| {
                let (bedrock, waterlogged) = cache
                    .entry(block.clone())
                    .or_insert_with(|| {
                        let translated = services.translator.block_to_bedrock(block);
                        if !translated.known {
                            log.count(anomaly::UNKNOWN_BLOCKS);
                        }
                        (translated.value, block.is_waterlogged())
                    })
                    .clone();
                (blocks.insert(bedrock), waterlogged)
            })
            .collect();

        let mut layer0 = vec![0u16; VOLUME];
        let mut layer1 = vec![0u16; VOLUME];
        for (yzx, &index) in indices.iter().enumerate() {
            let xzy = subchunk::to_xzy(yzx);
            let (target, waterlogged) = remap.get(usize::from(index)).copied().unwrap_or((0, false));
            layer0[xzy] = target;
            if waterlogged {
                layer1[xzy] = water_index;
                any_water = true;
            }
        }

        let mut layers = vec![Layer {
            palette: blocks.entries().iter().map(BedrockBlock::to_palette_entry).collect(),
            indices: layer0,
        }];
        if any_water {
            layers.push(Layer {
                palette: water.entries().iter().map(BedrockBlock::to_palette_entry).collect(),
                indices: layer1,
            });
        }
        out.push((
            keys::subchunk_key(chunk.dimension, chunk.pos, section_y),
            subchunk::encode_subchunk(section_y, &layers),
        ));
    }
}

fn encode_data3d(chunk: &Chunk, services: Services<'_>, log: &mut ChunkLog<'_>) -> Vec<u8> {
    let mut heights = [0i16; 256];
    let mut height_map = chunk.height_map.clone();
    height_map.offset(chunk.dimension.min_section());
    for (slot, &raw) in heights.iter_mut().zip(height_map.raw().iter()) {
        *slot = raw.min(i16::MAX as u16) as i16;
    }

    let mut ids: FnvHashMap<String, u32> = FnvHashMap::default();
    let mut biome_id = |name: &str, log: &mut ChunkLog<'_>| -> u32 {
        if let Some(id) = ids.get(name) {
            return *id;
        }
        let translated = services.translator.biome_to_bedrock(name);
        if !translated.known {
            log.count(anomaly::UNKNOWN_BIOMES);
        }
        ids.insert(name.to_string(), translated.value);
        translated.value
    };

    let mut biomes = Vec::new();
    for section_y in chunk.dimension.min_section()..chunk.dimension.max_section() {
        let mut cells = [0u32; 64];
        for cy in 0..4 {
            for cz in 0..4 {
                for cx in 0..4 {
                    cells[BiomeGrid::cell_index(cx, cy, cz)] =
                        biome_id(chunk.biomes.cell(section_y, cx, cy, cz), log);
                }
            }
        }
        let section: Vec<u32> = (0..VOLUME)
            .map(|xzy| {
                let (x, z, y) = (xzy >> 8, (xzy >> 4) & 15, xzy & 15);
                cells[BiomeGrid::cell_index(x / 4, y / 4, z / 4)]
            })
            .collect();
        biomes.push(section);
    }
    subchunk::encode_data3d(&Data3d { heights, biomes })
}

fn encode_pending_ticks(ticks: &[PendingTick], services: Services<'_>, log: &mut ChunkLog<'_>) -> Vec<u8> {
    let mut ordered = ticks.to_vec();
    PendingTick::sort(&mut ordered);
    let list = ordered
        .iter()
        .map(|tick| {
            let block = services.translator.block_to_bedrock(&BlockState::new(&tick.target));
            if !block.known {
                log.count(anomaly::UNKNOWN_BLOCKS);
            }
            CompoundBuilder::new()
                .compound("blockState", block.value.to_palette_entry())
                .long("time", i64::from(tick.delay))
                .int("priority", tick.priority)
                .int("x", tick.pos.x)
                .int("y", tick.pos.y)
                .int("z", tick.pos.z)
                .into_value()
        })
        .collect();
    let root = CompoundBuilder::new()
        .int("currentTick", 0)
        .list("tickList", list)
        .build();
    bedrock_nbt::to_le_bytes(&root)
}

/// Encodes a canonical chunk into its Bedrock records.
pub fn encode_chunk(chunk: &Chunk, services: Services<'_>, log: &mut ChunkLog<'_>) -> Result<Records, ChunkFailure> {
    let (dimension, pos) = (chunk.dimension, chunk.pos);
    let mut out: Records = vec![(keys::chunk_key(dimension, pos, tag::CHUNK_VERSION), vec![CHUNK_VERSION])];

    encode_sections(chunk, services, log, &mut out);
    out.push((
        keys::chunk_key(dimension, pos, tag::DATA_3D),
        encode_data3d(chunk, services, log),
    ));
    out.push((
        keys::chunk_key(dimension, pos, tag::FINALIZED_STATE),
        FINALIZED.to_le_bytes().to_vec(),
    ));

    let mut block_entities = Vec::with_capacity(chunk.block_entities.len());
    for (at, java) in &chunk.block_entities {
        let block = chunk.block_at(*at).unwrap_or(&AIR);
        if let Some(bedrock) = services.block_entities.to_bedrock(java, block, log) {
            block_entities.push(bedrock);
        }
    }
    if !block_entities.is_empty() {
        log.stats().block_entities += block_entities.len() as u64;
        out.push((
            keys::chunk_key(dimension, pos, tag::BLOCK_ENTITY),
            bedrock_nbt::to_le_bytes_many(&block_entities),
        ));
    }

    if !chunk.pending_ticks.is_empty() {
        out.push((
            keys::chunk_key(dimension, pos, tag::PENDING_TICKS),
            encode_pending_ticks(&chunk.pending_ticks, services, log),
        ));
    }

    let actors = entities_to_bedrock(&chunk.entities, services.registry, services.translator, log);
    if !actors.is_empty() {
        log.stats().entities += actors.len() as u64;
        let mut digp = Vec::with_capacity(actors.len() * 8);
        for actor in &actors {
            let Some(unique_id) = actor.get_i64("UniqueID") else {
                continue;
            };
            let storage_id = keys::actor_storage_id(unique_id);
            digp.extend_from_slice(&storage_id);
            out.push((keys::actor_key(&storage_id), bedrock_nbt::to_le_bytes(actor)));
        }
        out.push((keys::digp_key(dimension, pos), digp));
    }
    Ok(out)
}

/// Writes encoded records.
pub fn put_records(store: &dyn KeyValueStore, records: &Records) -> Result<(), crate::error::ConvertError> {
    for (key, value) in records {
        store.put(key, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{IdRegistry, VanillaBlockEntities};
    use crate::stats::Statistics;
    use crate::storage::MemoryStore;
    use crate::translation::Translator;
    use std::collections::BTreeSet;

    fn round_trip(chunk: &Chunk) -> (Chunk, Statistics) {
        let translator = Translator::new();
        let registry = IdRegistry::new();
        let services = Services {
            translator: &translator,
            registry: &registry,
            block_entities: &VanillaBlockEntities,
        };
        let mut stats = Statistics::new();
        let mut maps = BTreeSet::new();
        let store = MemoryStore::new();
        {
            let mut log = ChunkLog::new(chunk.dimension, chunk.pos, &mut stats, &mut maps);
            let records = encode_chunk(chunk, services, &mut log).unwrap();
            put_records(&store, &records).unwrap();
        }
        let mut log = ChunkLog::new(chunk.dimension, chunk.pos, &mut stats, &mut maps);
        let back = decode_chunk(&store, chunk.dimension, chunk.pos, services, &mut log)
            .unwrap()
            .unwrap();
        (back, stats)
    }

    #[test]
    fn test_blocks_and_waterlogging_survive() {
        let mut chunk = Chunk::new(Dimension::Overworld, ChunkPos::new(2, -1));
        chunk.set_block(0, -64, 0, BlockState::new("bedrock"));
        chunk.set_block(3, 10, 4, BlockState::new("stone"));
        chunk.set_block(
            3,
            11,
            4,
            BlockState::new("oak_slab").with("type", "bottom").with("waterlogged", "true"),
        );
        chunk.set_block(5, 11, 4, BlockState::new("oak_slab").with("type", "bottom"));
        let (back, stats) = round_trip(&chunk);
        assert_eq!(
            back.block(5, 11, 4),
            &BlockState::new("oak_slab").with("type", "bottom")
        );
        assert_eq!(back.block(3, 10, 4), &BlockState::new("stone"));
        assert_eq!(back.block(3, 11, 4).property("waterlogged"), Some("true"));
        assert_eq!(back.block(0, -64, 0), &BlockState::new("bedrock"));
        assert_eq!(back.height_map.get(0, 0), Some(-64));
        assert_eq!(stats.anomaly(anomaly::UNKNOWN_BLOCKS), 0);
    }

    #[test]
    fn test_bed_colour_travels_through_block_entity() {
        let mut chunk = Chunk::new(Dimension::Overworld, ChunkPos::new(0, 0));
        let bed = BlockState::new("lime_bed")
            .with("facing", "north")
            .with("part", "head")
            .with("occupied", "false");
        chunk.set_block(1, 64, 1, bed);
        chunk.block_entities.insert(
            BlockPos::new(1, 64, 1),
            CompoundBuilder::new()
                .string("id", "minecraft:bed")
                .int("x", 1)
                .int("y", 64)
                .int("z", 1)
                .build(),
        );
        let (back, _) = round_trip(&chunk);
        assert!(back.block(1, 64, 1).is("lime_bed"));
        assert!(back.block_entities.contains_key(&BlockPos::new(1, 64, 1)));
    }

    #[test]
    fn test_pending_ticks_keep_their_order() {
        let mut chunk = Chunk::new(Dimension::Overworld, ChunkPos::new(0, 0));
        chunk.set_block(0, 70, 0, BlockState::new("water").with("level", "0"));
        for (delay, x) in [(4, 1), (2, 2), (4, 3)] {
            chunk.pending_ticks.push(PendingTick {
                pos: BlockPos::new(x, 70, 0),
                target: "minecraft:water".to_string(),
                delay,
                priority: 0,
                fluid: true,
            });
        }
        let (back, _) = round_trip(&chunk);
        let xs: Vec<i32> = back.pending_ticks.iter().map(|t| t.pos.x).collect();
        assert_eq!(xs, vec![2, 1, 3]);
        assert!(back.pending_ticks.iter().all(|t| t.fluid));
    }
}
