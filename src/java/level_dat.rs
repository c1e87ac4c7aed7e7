//! Java `level.dat`: a gzipped big-endian NBT file with everything under `Data`.

use super::chunk::DATA_VERSION;
use super::{read_gzip_nbt, write_gzip_nbt};
use crate::coords::{BlockPos, Dimension};
use crate::error::ConvertError;
use crate::level::{canonical_rule, GameRule, LevelInfo};
use crate::nbt_utils::{Compound, CompoundBuilder, CompoundExt};
use fastnbt::Value;
use std::path::Path;

/// Anvil format marker every modern `level.dat` carries.
const ANVIL_VERSION: i32 = 19133;
const GAME_VERSION_NAME: &str = "1.21.1";

fn dimension_generator(dimension: Dimension) -> Value {
    let (settings, biome_source) = match dimension {
        Dimension::Overworld => (
            "minecraft:overworld",
            CompoundBuilder::new()
                .string("type", "minecraft:multi_noise")
                .string("preset", "minecraft:overworld"),
        ),
        Dimension::Nether => (
            "minecraft:nether",
            CompoundBuilder::new()
                .string("type", "minecraft:multi_noise")
                .string("preset", "minecraft:nether"),
        ),
        Dimension::End => (
            "minecraft:end",
            CompoundBuilder::new().string("type", "minecraft:the_end"),
        ),
    };
    CompoundBuilder::new()
        .string("type", dimension.java_name())
        .compound(
            "generator",
            CompoundBuilder::new()
                .string("type", "minecraft:noise")
                .string("settings", settings)
                .compound("biome_source", biome_source.build())
                .build(),
        )
        .into_value()
}

fn world_gen_settings(seed: i64) -> Compound {
    let mut dimensions = CompoundBuilder::new();
    for dimension in Dimension::ALL {
        dimensions = dimensions.value(dimension.java_name(), dimension_generator(dimension));
    }
    CompoundBuilder::new()
        .long("seed", seed)
        .flag("generate_features", true)
        .flag("bonus_chest", false)
        .compound("dimensions", dimensions.build())
        .build()
}

fn data_compound(info: &LevelInfo, player: Option<&Compound>) -> Compound {
    let rules = info
        .game_rules
        .iter()
        .fold(CompoundBuilder::new(), |b, (name, rule)| b.string(name, rule.java_value()));
    let mut data = CompoundBuilder::new()
        .int("DataVersion", DATA_VERSION)
        .int("version", ANVIL_VERSION)
        .string("LevelName", info.name.clone())
        .compound("WorldGenSettings", world_gen_settings(info.seed))
        .int("SpawnX", info.spawn.x)
        .int("SpawnY", info.spawn.y)
        .int("SpawnZ", info.spawn.z)
        .float("SpawnAngle", 0.0)
        .long("Time", info.time)
        .long("DayTime", info.day_time)
        .int("GameType", info.game_type)
        .byte("Difficulty", info.difficulty.clamp(0, 3) as i8)
        .flag("hardcore", info.hardcore)
        .flag("allowCommands", info.allow_commands)
        .long("LastPlayed", info.last_played.saturating_mul(1000))
        .flag("raining", info.raining)
        .int("rainTime", info.rain_time)
        .flag("thundering", info.thundering)
        .int("thunderTime", 0)
        .int("clearWeatherTime", 0)
        .flag("initialized", true)
        .flag("WasModded", false)
        .compound("GameRules", rules.build())
        .compound(
            "Version",
            CompoundBuilder::new()
                .int("Id", DATA_VERSION)
                .string("Name", GAME_VERSION_NAME)
                .string("Series", "main")
                .flag("Snapshot", false)
                .build(),
        )
        .compound(
            "DataPacks",
            CompoundBuilder::new()
                .list("Enabled", vec![Value::String("vanilla".to_string())])
                .list("Disabled", Vec::new())
                .build(),
        )
        .list(
            "ServerBrands",
            vec![Value::String(env!("CARGO_PKG_NAME").to_string())],
        );
    if let Some(player) = player {
        data = data.compound("Player", player.clone());
    }
    data.build()
}

/// Writes `level.dat`. `player` is embedded as the single-player `Player`.
pub fn write_level_dat(
    world_dir: &Path,
    info: &LevelInfo,
    player: Option<&Compound>,
) -> Result<(), ConvertError> {
    let root = CompoundBuilder::new()
        .compound("Data", data_compound(info, player))
        .build();
    write_gzip_nbt(&world_dir.join("level.dat"), &root)
}

/// Reads `level.dat`, returning the level and the embedded player, if any.
pub fn read_level_dat(world_dir: &Path) -> Result<(LevelInfo, Option<Compound>), ConvertError> {
    let root = read_gzip_nbt(&world_dir.join("level.dat"))?;
    let data = root
        .get_compound("Data")
        .ok_or_else(|| ConvertError::metadata("level.dat has no Data compound"))?;

    if data.get_compound("WorldGenSettings").is_none() && data.get_i32("DataVersion").unwrap_or(0) < super::chunk::MIN_DATA_VERSION {
        return Err(ConvertError::metadata(
            "level.dat predates 1.18 and cannot be converted",
        ));
    }

    let mut info = LevelInfo::default();
    if let Some(name) = data.get_str("LevelName") {
        info.name = name.to_string();
    }
    info.seed = data
        .get_compound("WorldGenSettings")
        .and_then(|w| w.get_i64("seed"))
        .or_else(|| data.get_i64("RandomSeed"))
        .unwrap_or(0);
    info.spawn = BlockPos::new(
        data.get_i32("SpawnX").unwrap_or(0),
        data.get_i32("SpawnY").unwrap_or(64),
        data.get_i32("SpawnZ").unwrap_or(0),
    );
    info.time = data.get_i64("Time").unwrap_or(0);
    info.day_time = data.get_i64("DayTime").unwrap_or(0);
    info.game_type = data.get_i32("GameType").unwrap_or(0);
    info.difficulty = data.get_i32("Difficulty").unwrap_or(2);
    info.hardcore = data.get_bool("hardcore").unwrap_or(false);
    info.allow_commands = data.get_bool("allowCommands").unwrap_or(false);
    info.last_played = data.get_i64("LastPlayed").unwrap_or(0) / 1000;
    info.raining = data.get_bool("raining").unwrap_or(false);
    info.thundering = data.get_bool("thundering").unwrap_or(false);
    info.rain_time = data.get_i32("rainTime").unwrap_or(0);
    if let Some(rules) = data.get_compound("GameRules") {
        for (key, value) in rules {
            let (Some(name), Value::String(value)) = (canonical_rule(key), value) else {
                continue;
            };
            if let Some(rule) = GameRule::parse(value) {
                info.game_rules.insert(name.to_string(), rule);
            }
        }
    }
    Ok((info, data.get_compound("Player").cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_round_trip_keeps_millisecond_clock() {
        let dir = tempfile::tempdir().unwrap();
        let mut info = LevelInfo {
            name: "Valley".to_string(),
            seed: 1234,
            spawn: BlockPos::new(-8, 72, 16),
            time: 24_000,
            day_time: 6_000,
            game_type: 1,
            allow_commands: true,
            last_played: 1_650_000_000,
            raining: true,
            rain_time: 300,
            ..LevelInfo::default()
        };
        info.game_rules.insert("doDaylightCycle".to_string(), GameRule::Bool(false));
        info.game_rules.insert("spawnRadius".to_string(), GameRule::Int(4));
        let player = CompoundBuilder::new().int("playerGameType", 1).build();
        write_level_dat(dir.path(), &info, Some(&player)).unwrap();

        let root = read_gzip_nbt(&dir.path().join("level.dat")).unwrap();
        let data = root.get_compound("Data").unwrap();
        assert_eq!(data.get_i64("LastPlayed"), Some(1_650_000_000_000));
        assert_eq!(
            data.get_compound("GameRules").unwrap().get_str("doDaylightCycle"),
            Some("false")
        );
        assert!(data
            .get_compound("WorldGenSettings")
            .and_then(|w| w.get_compound("dimensions"))
            .unwrap()
            .contains_key("minecraft:the_nether"));

        let (back, back_player) = read_level_dat(dir.path()).unwrap();
        assert_eq!(back, info);
        assert_eq!(back_player, Some(player));
    }

    #[test]
    fn test_legacy_level_dat_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = CompoundBuilder::new()
            .compound(
                "Data",
                CompoundBuilder::new()
                    .int("DataVersion", 2230)
                    .long("RandomSeed", 5)
                    .build(),
            )
            .build();
        write_gzip_nbt(&dir.path().join("level.dat"), &root).unwrap();
        assert!(matches!(
            read_level_dat(dir.path()),
            Err(ConvertError::Metadata { .. })
        ));
    }
}
