//! Java world I/O: anvil region files, `level.dat`, player and map data.
//!
//! A dimension keeps its chunks in `region/`, its entities in `entities/` and
//! its points of interest in `poi/`, each as 32×32-chunk region files.

pub mod chunk;
pub mod level_dat;
pub mod poi;

use crate::context::Services;
use crate::coords::{ChunkPos, Dimension, Edition, RegionPos};
use crate::entity::id_registry::{format_uuid, read_java_uuid};
use crate::error::{ChunkFailure, ConvertError};
use crate::level::LevelInfo;
use crate::maps::MapData;
use crate::nbt_utils::{Compound, CompoundBuilder};
use crate::stats::ChunkLog;
use crate::world::Chunk;
use crate::world_io::{ChunkReader, ChunkWriter, Finalize, WorldSink, WorldSource};
use byteorder::{BigEndian, ReadBytesExt};
use fastanvil::Region;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use fnv::FnvHashMap;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const REGION_DIR: &str = "region";
const ENTITIES_DIR: &str = "entities";
const POI_DIR: &str = "poi";
const REGION_HEADER_ENTRIES: usize = 1024;

/// Reads a gzipped big-endian NBT file.
pub fn read_gzip_nbt(path: &Path) -> Result<Compound, ConvertError> {
    let bytes = fs::read(path)
        .map_err(|e| ConvertError::metadata(format!("cannot read {}: {e}", path.display())))?;
    let mut decoder = GzDecoder::new(bytes.as_slice());
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| ConvertError::metadata(format!("cannot decompress {}: {e}", path.display())))?;
    fastnbt::from_bytes(&decompressed)
        .map_err(|e| ConvertError::metadata(format!("cannot parse {}: {e}", path.display())))
}

pub fn write_gzip_nbt(path: &Path, root: &Compound) -> Result<(), ConvertError> {
    let serialized = fastnbt::to_bytes(root)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&serialized)?;
    fs::write(path, encoder.finish()?)?;
    Ok(())
}

/// Chunks present in a region file, read from its location table.
fn region_chunks(path: &Path, region: RegionPos) -> Result<Vec<ChunkPos>, ConvertError> {
    let mut file = File::open(path)?;
    let mut chunks = Vec::new();
    for index in 0..REGION_HEADER_ENTRIES {
        let location = match file.read_u32::<BigEndian>() {
            Ok(location) => location,
            // Empty or truncated files hold no chunks.
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        if location != 0 {
            let (lx, lz) = ((index % 32) as i32, (index / 32) as i32);
            chunks.push(ChunkPos::new(region.x * 32 + lx, region.z * 32 + lz));
        }
    }
    Ok(chunks)
}

fn anvil_failure(err: fastanvil::Error) -> ChunkFailure {
    ChunkFailure::Malformed(format!("region file: {err}"))
}

/// Lazily opened region files of one kind, keyed by region.
struct RegionCache {
    dir: PathBuf,
    open: FnvHashMap<RegionPos, Option<Region<File>>>,
}

impl RegionCache {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            open: FnvHashMap::default(),
        }
    }

    fn read(&mut self, pos: ChunkPos) -> Result<Option<Vec<u8>>, ChunkFailure> {
        let region_pos = pos.region();
        let region = match self.open.entry(region_pos) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => {
                let path = self.dir.join(region_pos.file_name());
                let region = match File::open(&path) {
                    Ok(file) => Some(Region::from_stream(file).map_err(anvil_failure)?),
                    Err(_) => None,
                };
                e.insert(region)
            }
        };
        let Some(region) = region else {
            return Ok(None);
        };
        let (lx, lz) = pos.local_in_region();
        region.read_chunk(lx, lz).map_err(anvil_failure)
    }
}

/// A Java world folder, used as either source or target.
pub struct JavaWorld {
    dir: PathBuf,
}

impl JavaWorld {
    /// Opens an existing world. Fails when there is no `level.dat`.
    pub fn open(dir: &Path) -> Result<Self, ConvertError> {
        if !dir.join("level.dat").is_file() {
            return Err(ConvertError::metadata(format!(
                "{} is not a Java world (no level.dat)",
                dir.display()
            )));
        }
        Ok(Self { dir: dir.to_path_buf() })
    }

    /// Prepares an output world folder.
    pub fn create(dir: &Path) -> Result<Self, ConvertError> {
        fs::create_dir_all(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn player_path(&self, uuid: u128) -> PathBuf {
        self.dir.join("playerdata").join(format!("{}.dat", format_uuid(uuid)))
    }
}

struct JavaReader {
    dimension: Dimension,
    chunks: RegionCache,
    entities: RegionCache,
}

impl ChunkReader for JavaReader {
    fn read_chunk(
        &mut self,
        pos: ChunkPos,
        services: Services<'_>,
        log: &mut ChunkLog<'_>,
    ) -> Result<Option<Chunk>, ChunkFailure> {
        let Some(data) = self.chunks.read(pos)? else {
            return Ok(None);
        };
        let mut chunk = chunk::decode_chunk(&data, self.dimension, pos, services, log)?;
        if let Some(data) = self.entities.read(pos)? {
            chunk.entities.extend(chunk::decode_entities(&data)?);
        }
        Ok(Some(chunk))
    }
}

impl WorldSource for JavaWorld {
    fn edition(&self) -> Edition {
        Edition::Java
    }

    fn chunks(&self, dimension: Dimension) -> Result<BTreeMap<RegionPos, Vec<ChunkPos>>, ConvertError> {
        let dir = dimension.java_folder(&self.dir).join(REGION_DIR);
        let mut out = BTreeMap::new();
        let Ok(entries) = fs::read_dir(&dir) else {
            return Ok(out);
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(region) = name.to_str().and_then(RegionPos::from_file_name) else {
                continue;
            };
            let chunks = region_chunks(&entry.path(), region)?;
            if !chunks.is_empty() {
                out.insert(region, chunks);
            }
        }
        debug!("{dimension}: {} region file(s) with chunks", out.len());
        Ok(out)
    }

    fn reader(&self, dimension: Dimension) -> Box<dyn ChunkReader + '_> {
        let folder = dimension.java_folder(&self.dir);
        Box::new(JavaReader {
            dimension,
            chunks: RegionCache::new(folder.join(REGION_DIR)),
            entities: RegionCache::new(folder.join(ENTITIES_DIR)),
        })
    }

    fn level(&self) -> Result<LevelInfo, ConvertError> {
        Ok(level_dat::read_level_dat(&self.dir)?.0)
    }

    fn local_player(
        &self,
        uuid: Option<u128>,
        _services: Services<'_>,
        _log: &mut ChunkLog<'_>,
    ) -> Result<Option<Compound>, ConvertError> {
        if let Some(uuid) = uuid {
            let path = self.player_path(uuid);
            if path.is_file() {
                return read_gzip_nbt(&path).map(Some);
            }
            warn!("No player data for {}, falling back to level.dat", format_uuid(uuid));
        }
        Ok(level_dat::read_level_dat(&self.dir)?.1)
    }

    fn maps(&self) -> Result<Vec<MapData>, ConvertError> {
        let mut maps = Vec::new();
        let Ok(entries) = fs::read_dir(self.dir.join("data")) else {
            return Ok(maps);
        };
        for entry in entries {
            let path = entry?.path();
            let Some(id) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix("map_")?.strip_suffix(".dat")?.parse::<i64>().ok())
            else {
                continue;
            };
            match read_gzip_nbt(&path).map(|root| MapData::from_java(id, &root)) {
                Ok(Some(map)) => maps.push(map),
                Ok(None) => warn!("Skipping malformed map record {}", path.display()),
                Err(e) => warn!("Skipping unreadable map record: {e}"),
            }
        }
        maps.sort_by_key(|m| m.id);
        Ok(maps)
    }
}

struct JavaWriter {
    region: RegionPos,
    folder: PathBuf,
    chunks: Option<Region<File>>,
    entities: Option<Region<File>>,
    poi: Option<Region<File>>,
}

impl JavaWriter {
    fn write(
        slot: &mut Option<Region<File>>,
        path: PathBuf,
        pos: ChunkPos,
        data: &[u8],
    ) -> Result<(), ChunkFailure> {
        let region = match slot {
            Some(region) => region,
            None => {
                let storage = |e: std::io::Error| ChunkFailure::Storage(format!("{}: {e}", path.display()));
                let file = File::options()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(&path)
                    .map_err(storage)?;
                // A region another writer already started is extended, not replaced.
                let region = if file.metadata().map_err(storage)?.len() == 0 {
                    Region::create(file)
                } else {
                    Region::from_stream(file)
                };
                slot.insert(region.map_err(|e| ChunkFailure::Storage(e.to_string()))?)
            }
        };
        let (lx, lz) = pos.local_in_region();
        region
            .write_chunk(lx, lz, data)
            .map_err(|e| ChunkFailure::Storage(format!("{}: {e}", path.display())))
    }
}

impl ChunkWriter for JavaWriter {
    fn write_chunk(
        &mut self,
        chunk: &Chunk,
        services: Services<'_>,
        log: &mut ChunkLog<'_>,
    ) -> Result<(), ChunkFailure> {
        let file_name = self.region.file_name();
        let data = chunk::encode_chunk(chunk, services, log)?;
        let entities = chunk::encode_entities(chunk, log)?;
        let poi = poi::encode_poi(chunk)?;

        let path = self.folder.join(REGION_DIR).join(&file_name);
        Self::write(&mut self.chunks, path, chunk.pos, &data)?;
        if let Some(entities) = entities {
            let path = self.folder.join(ENTITIES_DIR).join(&file_name);
            Self::write(&mut self.entities, path, chunk.pos, &entities)?;
        }
        if let Some(poi) = poi {
            let path = self.folder.join(POI_DIR).join(&file_name);
            Self::write(&mut self.poi, path, chunk.pos, &poi)?;
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), ConvertError> {
        for region in [self.chunks, self.entities, self.poi].into_iter().flatten() {
            let file = region
                .into_inner()
                .map_err(|e| ConvertError::storage(format!("region {}: {e}", self.region.file_name())))?;
            file.sync_all()?;
        }
        Ok(())
    }
}

impl WorldSink for JavaWorld {
    fn edition(&self) -> Edition {
        Edition::Java
    }

    fn writer(&self, dimension: Dimension, region: RegionPos) -> Result<Box<dyn ChunkWriter + '_>, ConvertError> {
        let folder = dimension.java_folder(&self.dir);
        for sub in [REGION_DIR, ENTITIES_DIR, POI_DIR] {
            fs::create_dir_all(folder.join(sub))?;
        }
        Ok(Box::new(JavaWriter {
            region,
            folder,
            chunks: None,
            entities: None,
            poi: None,
        }))
    }

    fn finalize(&self, world: &Finalize<'_>, _log: &mut ChunkLog<'_>) -> Result<(), ConvertError> {
        level_dat::write_level_dat(&self.dir, world.level, world.player)?;

        if let Some(player) = world.player {
            if let Some(uuid) = read_java_uuid(player, "UUID") {
                fs::create_dir_all(self.dir.join("playerdata"))?;
                write_gzip_nbt(&self.player_path(uuid), player)?;
            }
        }

        if !world.maps.is_empty() {
            let data_dir = self.dir.join("data");
            fs::create_dir_all(&data_dir)?;
            let mut highest = 0;
            for map in world.maps {
                let id = map.target_id();
                highest = highest.max(id);
                write_gzip_nbt(
                    &data_dir.join(format!("map_{id}.dat")),
                    &map.to_java(chunk::DATA_VERSION),
                )?;
            }
            let counts = CompoundBuilder::new()
                .int("DataVersion", chunk::DATA_VERSION)
                .compound(
                    "data",
                    CompoundBuilder::new().int("map", highest as i32).build(),
                )
                .build();
            write_gzip_nbt(&data_dir.join("idcounts.dat"), &counts)?;
        }
        Ok(())
    }

    fn close(&self, progress: &mut dyn FnMut(u64, u64)) -> Result<(), ConvertError> {
        progress(1, 1);
        Ok(())
    }

    fn abandon(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_definitions::BlockState;
    use crate::entity::{IdRegistry, VanillaBlockEntities};
    use crate::nbt_utils::CompoundExt;
    use crate::stats::Statistics;
    use crate::translation::Translator;
    use std::collections::BTreeSet;

    #[test]
    fn test_written_chunks_are_listed_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let world = JavaWorld::create(dir.path()).unwrap();
        let translator = Translator::new();
        let registry = IdRegistry::new();
        let services = Services {
            translator: &translator,
            registry: &registry,
            block_entities: &VanillaBlockEntities,
        };
        let mut stats = Statistics::new();
        let mut maps = BTreeSet::new();

        let pos = ChunkPos::new(-1, 33);
        let mut chunk = Chunk::new(Dimension::Nether, pos);
        chunk.set_block(5, 40, 5, BlockState::new("netherrack"));
        chunk.set_block(6, 41, 5, BlockState::new("nether_portal").with("axis", "x"));
        chunk.entities.push(
            CompoundBuilder::new()
                .string("id", "minecraft:zombified_piglin")
                .build(),
        );
        {
            let mut log = ChunkLog::new(Dimension::Nether, pos, &mut stats, &mut maps);
            let mut writer = world.writer(Dimension::Nether, pos.region()).unwrap();
            writer.write_chunk(&chunk, services, &mut log).unwrap();
            writer.finish().unwrap();
        }
        let nether = dir.path().join("DIM-1");
        assert!(nether.join("poi").join(pos.region().file_name()).is_file());

        let listed = WorldSource::chunks(&world, Dimension::Nether).unwrap();
        assert_eq!(listed.get(&pos.region()), Some(&vec![pos]));
        assert!(WorldSource::chunks(&world, Dimension::Overworld).unwrap().is_empty());

        let mut reader = world.reader(Dimension::Nether);
        let mut log = ChunkLog::new(Dimension::Nether, pos, &mut stats, &mut maps);
        let back = reader.read_chunk(pos, services, &mut log).unwrap().unwrap();
        assert_eq!(back.block(5, 40, 5).name, "minecraft:netherrack");
        assert_eq!(back.entities.len(), 1);
        assert!(reader
            .read_chunk(ChunkPos::new(0, 33), services, &mut log)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_second_writer_extends_region() {
        let dir = tempfile::tempdir().unwrap();
        let world = JavaWorld::create(dir.path()).unwrap();
        let translator = Translator::new();
        let registry = IdRegistry::new();
        let services = Services {
            translator: &translator,
            registry: &registry,
            block_entities: &VanillaBlockEntities,
        };
        let mut stats = Statistics::new();
        let mut maps = BTreeSet::new();

        let positions = [ChunkPos::new(0, 0), ChunkPos::new(3, 1)];
        for pos in positions {
            let mut chunk = Chunk::new(Dimension::Overworld, pos);
            chunk.set_block(0, 0, 0, BlockState::new("stone"));
            let mut log = ChunkLog::new(Dimension::Overworld, pos, &mut stats, &mut maps);
            let mut writer = world.writer(Dimension::Overworld, pos.region()).unwrap();
            writer.write_chunk(&chunk, services, &mut log).unwrap();
            writer.finish().unwrap();
        }

        let listed = WorldSource::chunks(&world, Dimension::Overworld).unwrap();
        assert_eq!(listed.get(&RegionPos::new(0, 0)), Some(&positions.to_vec()));
    }

    #[test]
    fn test_finalize_writes_level_player_and_maps() {
        let dir = tempfile::tempdir().unwrap();
        let world = JavaWorld::create(dir.path()).unwrap();
        let uuid = 0xdead_beef_0000_0000_0000_0000_0000_0001u128;
        let player = CompoundBuilder::new()
            .value("UUID", crate::entity::id_registry::java_uuid_value(uuid))
            .int("playerGameType", 1)
            .build();
        let map = MapData {
            id: 4,
            scale: 0,
            dimension: Dimension::Overworld,
            x_center: 0,
            z_center: 0,
            locked: false,
            unlimited_tracking: false,
            tracking_position: true,
            colors: vec![0; 128 * 128],
        };
        let level = LevelInfo::default();
        let records = crate::records::WorldRecords::new();
        let mut stats = Statistics::new();
        let mut seen = BTreeSet::new();
        let mut log = ChunkLog::new(Dimension::Overworld, ChunkPos::new(0, 0), &mut stats, &mut seen);
        world
            .finalize(
                &Finalize {
                    level: &level,
                    player: Some(&player),
                    maps: std::slice::from_ref(&map),
                    records: &records,
                    dimensions: &Dimension::ALL,
                },
                &mut log,
            )
            .unwrap();

        let source = JavaWorld::open(dir.path()).unwrap();
        assert_eq!(source.level().unwrap(), level);
        assert_eq!(source.maps().unwrap(), vec![map]);
        let translator = Translator::new();
        let registry = IdRegistry::new();
        let services = Services {
            translator: &translator,
            registry: &registry,
            block_entities: &VanillaBlockEntities,
        };
        let from_file = source.local_player(Some(uuid), services, &mut log).unwrap().unwrap();
        assert_eq!(from_file.get_i32("playerGameType"), Some(1));
        let counts = read_gzip_nbt(&dir.path().join("data").join("idcounts.dat")).unwrap();
        assert_eq!(counts.get_compound("data").unwrap().get_i32("map"), Some(4));
    }
}
