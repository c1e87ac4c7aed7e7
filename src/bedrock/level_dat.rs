//! Bedrock `level.dat` and `levelname.txt`.
//!
//! The file is an 8 byte header (storage version, payload length, both u32
//! LE) followed by a little-endian NBT compound.

use crate::bedrock_nbt;
use crate::error::ConvertError;
use crate::level::{bedrock_game_type, canonical_rule, java_game_type, GameRule, LevelInfo};
use crate::nbt_utils::{Compound, CompoundBuilder, CompoundExt};
use crate::coords::BlockPos;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use fastnbt::Value;
use std::fs;
use std::io::Cursor;
use std::path::Path;

pub const STORAGE_VERSION: u32 = 10;
/// Protocol version of Bedrock 1.21.0.
const NETWORK_VERSION: i32 = 685;
const GAME_VERSION: [i32; 5] = [1, 21, 0, 0, 0];

fn version_list() -> Value {
    Value::List(GAME_VERSION.iter().map(|v| Value::Int(*v)).collect())
}

fn level_dat_compound(info: &LevelInfo) -> Compound {
    let mut builder = CompoundBuilder::new()
        // Version information
        .int("StorageVersion", STORAGE_VERSION as i32)
        .int("NetworkVersion", NETWORK_VERSION)
        .int("WorldVersion", 1)
        .string("InventoryVersion", "1.21.0")
        .value("lastOpenedWithVersion", version_list())
        .value("MinimumCompatibleClientVersion", version_list())
        // World identity
        .string("LevelName", info.name.clone())
        .long("RandomSeed", info.seed)
        .int("SpawnX", info.spawn.x)
        .int("SpawnY", info.spawn.y)
        .int("SpawnZ", info.spawn.z)
        // Infinite world with the vanilla generator
        .int("Generator", 1)
        .flag("spawnMobs", true)
        // Game settings
        .int("GameType", bedrock_game_type(info.game_type))
        .int("Difficulty", info.difficulty)
        .flag("ForceGameType", false)
        .flag("IsHardcore", info.hardcore)
        // Time
        .long("LastPlayed", info.last_played)
        .long("Time", info.day_time)
        .long("currentTick", info.time)
        // Cheats and commands
        .flag("commandsEnabled", info.allow_commands)
        .flag("cheatsEnabled", info.allow_commands)
        .flag("commandblocksenabled", true)
        // Multiplayer
        .flag("MultiplayerGame", true)
        .flag("MultiplayerGameIntent", true)
        .flag("LANBroadcast", true)
        .flag("LANBroadcastIntent", true)
        .int("XBLBroadcastIntent", 3)
        .int("PlatformBroadcastIntent", 3)
        .int("Platform", 2)
        // Weather
        .float("rainLevel", if info.raining { 1.0 } else { 0.0 })
        .int("rainTime", info.rain_time)
        .float("lightningLevel", if info.thundering { 1.0 } else { 0.0 })
        .int("lightningTime", 100_000)
        // Misc settings
        .int("NetherScale", 8)
        .int("serverChunkTickRange", 4)
        .long("worldStartCount", 0xFFFF_FFFE_u64 as i64)
        .flag("hasBeenLoadedInCreative", info.game_type == 1)
        .flag("recipesunlock", true)
        .flag("showtags", true)
        .flag("pvp", true)
        .flag("tntexplodes", true)
        .int("permissionsLevel", 0)
        .int("playerPermissionsLevel", 1)
        .string("BiomeOverride", "")
        .string("prid", "");
    for (name, rule) in &info.game_rules {
        let key = name.to_ascii_lowercase();
        builder = match rule {
            GameRule::Bool(v) => builder.flag(&key, *v),
            GameRule::Int(v) => builder.int(&key, *v),
        };
    }
    builder.build()
}

/// Writes `level.dat` and `levelname.txt` into `world_dir`.
pub fn write_level_dat(world_dir: &Path, info: &LevelInfo) -> Result<(), ConvertError> {
    let nbt_bytes = bedrock_nbt::to_le_bytes(&level_dat_compound(info));
    let mut out = Vec::with_capacity(nbt_bytes.len() + 8);
    out.write_u32::<LittleEndian>(STORAGE_VERSION)?;
    out.write_u32::<LittleEndian>(nbt_bytes.len() as u32)?;
    out.extend_from_slice(&nbt_bytes);
    fs::write(world_dir.join("level.dat"), out)?;
    fs::write(world_dir.join("levelname.txt"), &info.name)?;
    Ok(())
}

fn parse(data: &[u8]) -> Result<Compound, ConvertError> {
    let mut cursor = Cursor::new(data);
    let _version = cursor.read_u32::<LittleEndian>()?;
    let length = cursor.read_u32::<LittleEndian>()? as usize;
    let body = data
        .get(8..8 + length)
        .ok_or_else(|| ConvertError::metadata("level.dat is shorter than its header says"))?;
    bedrock_nbt::from_le_bytes(body).map_err(|e| ConvertError::metadata(format!("level.dat: {e}")))
}

/// Reads `level.dat`. `levelname.txt` wins over the stored name when present.
pub fn read_level_dat(world_dir: &Path) -> Result<LevelInfo, ConvertError> {
    let path = world_dir.join("level.dat");
    let data = fs::read(&path)
        .map_err(|e| ConvertError::metadata(format!("cannot read {}: {e}", path.display())))?;
    let root = parse(&data)?;

    let mut info = LevelInfo::default();
    if let Some(name) = root.get_str("LevelName") {
        info.name = name.to_string();
    }
    if let Ok(name) = fs::read_to_string(world_dir.join("levelname.txt")) {
        let name = name.trim();
        if !name.is_empty() {
            info.name = name.to_string();
        }
    }
    info.seed = root.get_i64("RandomSeed").unwrap_or(0);
    info.spawn = BlockPos::new(
        root.get_i32("SpawnX").unwrap_or(0),
        root.get_i32("SpawnY").unwrap_or(64),
        root.get_i32("SpawnZ").unwrap_or(0),
    );
    // Bedrock stores an out-of-range Y when spawn should be picked at the surface.
    if !(-64..=320).contains(&info.spawn.y) {
        info.spawn.y = 64;
    }
    info.time = root.get_i64("currentTick").unwrap_or(0);
    info.day_time = root.get_i64("Time").unwrap_or(0);
    info.game_type = java_game_type(root.get_i32("GameType").unwrap_or(0));
    info.difficulty = root.get_i32("Difficulty").unwrap_or(2);
    info.hardcore = root.get_bool("IsHardcore").unwrap_or(false);
    info.allow_commands = root.get_bool("commandsEnabled").unwrap_or(false);
    info.last_played = root.get_i64("LastPlayed").unwrap_or(0);
    info.raining = root.get_f32("rainLevel").is_some_and(|v| v > 0.0);
    info.thundering = root.get_f32("lightningLevel").is_some_and(|v| v > 0.0);
    info.rain_time = root.get_i32("rainTime").unwrap_or(0);
    for (key, value) in &root {
        let Some(rule) = canonical_rule(key) else {
            continue;
        };
        let value = match value {
            Value::Byte(v) => GameRule::Bool(*v != 0),
            Value::Int(v) => GameRule::Int(*v),
            _ => continue,
        };
        info.game_rules.insert(rule.to_string(), value);
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_dat_header_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut info = LevelInfo {
            name: "Island".to_string(),
            seed: -42,
            spawn: BlockPos::new(10, 70, -5),
            game_type: 3,
            last_played: 1_700_000_000,
            ..LevelInfo::default()
        };
        info.game_rules.insert("keepInventory".to_string(), GameRule::Bool(true));
        info.game_rules.insert("randomTickSpeed".to_string(), GameRule::Int(5));
        write_level_dat(dir.path(), &info).unwrap();

        let bytes = fs::read(dir.path().join("level.dat")).unwrap();
        assert_eq!(&bytes[..4], &10u32.to_le_bytes());
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize, bytes.len() - 8);
        let root = parse(&bytes).unwrap();
        assert_eq!(root.get_i32("GameType"), Some(6));
        assert_eq!(root.get_i8("keepinventory"), Some(1));
        assert_eq!(fs::read_to_string(dir.path().join("levelname.txt")).unwrap(), "Island");

        assert_eq!(read_level_dat(dir.path()).unwrap(), info);
    }

    #[test]
    fn test_missing_level_dat_is_a_metadata_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_level_dat(dir.path()),
            Err(ConvertError::Metadata { .. })
        ));
    }
}
