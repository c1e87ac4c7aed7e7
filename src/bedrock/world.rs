//! A Bedrock world folder (`db/`, `level.dat`, `levelname.txt`) as a source or sink.

use super::keys::{self, LOCAL_PLAYER, MAP_PREFIX};
use super::{level_dat, records};
use crate::bedrock_nbt;
use crate::context::Services;
use crate::coords::{ChunkPos, Dimension, Edition, RegionPos};
use crate::entity::id_registry::LOCAL_PLAYER_ID;
use crate::entity::{player_to_bedrock, player_to_java};
use crate::error::{ChunkFailure, ConvertError};
use crate::level::LevelInfo;
use crate::maps::{ColorMatcher, MapData};
use crate::nbt_utils::{Compound, CompoundExt};
use crate::stats::ChunkLog;
use crate::storage::{KeyValueStore, LevelDbStore};
use crate::world::Chunk;
use crate::world_io::{ChunkReader, ChunkWriter, Finalize, WorldSink, WorldSource};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct BedrockWorld {
    dir: PathBuf,
    store: Arc<dyn KeyValueStore>,
}

impl BedrockWorld {
    /// Opens the LevelDB of an existing world folder.
    pub fn open(dir: &Path) -> Result<Self, ConvertError> {
        let db = dir.join("db");
        if !db.is_dir() {
            return Err(ConvertError::metadata(format!(
                "{} is not a Bedrock world (no db folder)",
                dir.display()
            )));
        }
        Ok(Self::with_store(dir, Arc::new(LevelDbStore::open(&db, false)?)))
    }

    /// Creates the world folder and an empty database in it.
    pub fn create(dir: &Path) -> Result<Self, ConvertError> {
        let db = dir.join("db");
        fs::create_dir_all(&db)?;
        Ok(Self::with_store(dir, Arc::new(LevelDbStore::open(&db, true)?)))
    }

    /// A world whose records live in `store` and whose metadata files live in `dir`.
    pub fn with_store(dir: &Path, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            store,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }
}

struct BedrockReader<'a> {
    store: &'a dyn KeyValueStore,
    dimension: Dimension,
}

impl ChunkReader for BedrockReader<'_> {
    fn read_chunk(
        &mut self,
        pos: ChunkPos,
        services: Services<'_>,
        log: &mut ChunkLog<'_>,
    ) -> Result<Option<Chunk>, ChunkFailure> {
        super::decode_chunk(self.store, self.dimension, pos, services, log)
    }
}

impl WorldSource for BedrockWorld {
    fn edition(&self) -> Edition {
        Edition::Bedrock
    }

    fn chunks(&self, dimension: Dimension) -> Result<BTreeMap<RegionPos, Vec<ChunkPos>>, ConvertError> {
        let mut out: BTreeMap<RegionPos, Vec<ChunkPos>> = BTreeMap::new();
        for (d, pos) in keys::list_chunks(self.store())? {
            if d == dimension {
                out.entry(pos.region()).or_default().push(pos);
            }
        }
        debug!("{dimension}: {} region(s) with chunks", out.len());
        Ok(out)
    }

    fn reader(&self, dimension: Dimension) -> Box<dyn ChunkReader + '_> {
        Box::new(BedrockReader {
            store: self.store(),
            dimension,
        })
    }

    fn level(&self) -> Result<LevelInfo, ConvertError> {
        level_dat::read_level_dat(&self.dir)
    }

    fn local_player(
        &self,
        uuid: Option<u128>,
        services: Services<'_>,
        log: &mut ChunkLog<'_>,
    ) -> Result<Option<Compound>, ConvertError> {
        let Some(data) = self.store.get(LOCAL_PLAYER)? else {
            return Ok(None);
        };
        let bedrock = bedrock_nbt::from_le_bytes(&data)
            .map_err(|e| ConvertError::metadata(format!("~local_player: {e}")))?;
        let uuid = uuid.unwrap_or_else(|| {
            services
                .registry
                .uuid_for(bedrock.get_i64("UniqueID").unwrap_or(LOCAL_PLAYER_ID))
        });
        Ok(Some(player_to_java(&bedrock, uuid, log)))
    }

    fn maps(&self) -> Result<Vec<MapData>, ConvertError> {
        let mut matcher = ColorMatcher::new();
        let mut maps = Vec::new();
        for key in self.store.keys_with_prefix(MAP_PREFIX)? {
            if keys::map_id_from_key(&key).is_none() {
                continue;
            }
            let Some(data) = self.store.get(&key)? else {
                continue;
            };
            let parsed = bedrock_nbt::from_le_bytes(&data)
                .ok()
                .and_then(|tag| MapData::from_bedrock(&tag, &mut matcher));
            match parsed {
                Some(map) => maps.push(map),
                None => warn!("Skipping malformed map record {}", String::from_utf8_lossy(&key)),
            }
        }
        maps.sort_by_key(|m| m.id);
        Ok(maps)
    }
}

struct BedrockWriter<'a> {
    store: &'a dyn KeyValueStore,
}

impl ChunkWriter for BedrockWriter<'_> {
    fn write_chunk(
        &mut self,
        chunk: &Chunk,
        services: Services<'_>,
        log: &mut ChunkLog<'_>,
    ) -> Result<(), ChunkFailure> {
        let records = super::encode_chunk(chunk, services, log)?;
        super::put_records(self.store, &records)?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), ConvertError> {
        Ok(())
    }
}

impl WorldSink for BedrockWorld {
    fn edition(&self) -> Edition {
        Edition::Bedrock
    }

    fn writer(&self, _dimension: Dimension, _region: RegionPos) -> Result<Box<dyn ChunkWriter + '_>, ConvertError> {
        Ok(Box::new(BedrockWriter { store: self.store() }))
    }

    fn finalize(&self, world: &Finalize<'_>, log: &mut ChunkLog<'_>) -> Result<(), ConvertError> {
        records::write_world_records(self.store(), world.dimensions, world.records, log.stats())?;

        for map in world.maps {
            let tag = map.to_bedrock();
            self.store
                .put(&keys::map_key(map.target_id()), &bedrock_nbt::to_le_bytes(&tag))?;
        }

        if let Some(player) = world.player {
            let bedrock = player_to_bedrock(player, log);
            self.store.put(LOCAL_PLAYER, &bedrock_nbt::to_le_bytes(&bedrock))?;
        }

        level_dat::write_level_dat(&self.dir, world.level)
    }

    fn close(&self, progress: &mut dyn FnMut(u64, u64)) -> Result<(), ConvertError> {
        self.store.close(progress)
    }

    fn abandon(&self) {
        self.store.abandon();
    }
}
