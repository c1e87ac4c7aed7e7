//! Level metadata shared by both editions' `level.dat`.

use crate::coords::BlockPos;
use std::collections::BTreeMap;

/// Game rules both editions understand, by their Java name. Bedrock spells
/// them in lower case.
pub const GAME_RULES: [&str; 25] = [
    "commandBlockOutput",
    "doDaylightCycle",
    "doEntityDrops",
    "doFireTick",
    "doImmediateRespawn",
    "doInsomnia",
    "doLimitedCrafting",
    "doMobLoot",
    "doMobSpawning",
    "doTileDrops",
    "doWeatherCycle",
    "drowningDamage",
    "fallDamage",
    "fireDamage",
    "freezeDamage",
    "functionCommandLimit",
    "keepInventory",
    "maxCommandChainLength",
    "mobGriefing",
    "naturalRegeneration",
    "playersSleepingPercentage",
    "randomTickSpeed",
    "sendCommandFeedback",
    "showDeathMessages",
    "spawnRadius",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameRule {
    Bool(bool),
    Int(i32),
}

impl GameRule {
    /// Parses a Java rule value, which is always stored as a string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "true" => Some(GameRule::Bool(true)),
            "false" => Some(GameRule::Bool(false)),
            other => other.parse().ok().map(GameRule::Int),
        }
    }

    pub fn java_value(self) -> String {
        match self {
            GameRule::Bool(v) => v.to_string(),
            GameRule::Int(v) => v.to_string(),
        }
    }
}

/// Java name of a rule given its name in either edition.
pub fn canonical_rule(name: &str) -> Option<&'static str> {
    GAME_RULES.iter().copied().find(|r| r.eq_ignore_ascii_case(name))
}

/// Edition-neutral `level.dat` contents.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelInfo {
    pub name: String,
    pub seed: i64,
    pub spawn: BlockPos,
    /// Total ticks the world has run.
    pub time: i64,
    /// Time of day in ticks.
    pub day_time: i64,
    /// Java numbering (0 survival, 1 creative, 2 adventure, 3 spectator).
    pub game_type: i32,
    pub difficulty: i32,
    pub hardcore: bool,
    pub allow_commands: bool,
    /// Seconds since the Unix epoch.
    pub last_played: i64,
    pub raining: bool,
    pub thundering: bool,
    pub rain_time: i32,
    /// Keyed by Java rule name.
    pub game_rules: BTreeMap<String, GameRule>,
}

impl Default for LevelInfo {
    fn default() -> Self {
        Self {
            name: "Converted World".to_string(),
            seed: 0,
            spawn: BlockPos::new(0, 64, 0),
            time: 0,
            day_time: 0,
            game_type: 0,
            difficulty: 2,
            hardcore: false,
            allow_commands: false,
            last_played: 0,
            raining: false,
            thundering: false,
            rain_time: 0,
            game_rules: BTreeMap::new(),
        }
    }
}

/// Bedrock game type for a Java one.
pub fn bedrock_game_type(java: i32) -> i32 {
    match java {
        3 => 6,
        other => other.clamp(0, 2),
    }
}

pub fn java_game_type(bedrock: i32) -> i32 {
    match bedrock {
        6 => 3,
        0..=2 => bedrock,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_names_match_either_spelling() {
        assert_eq!(canonical_rule("dodaylightcycle"), Some("doDaylightCycle"));
        assert_eq!(canonical_rule("randomTickSpeed"), Some("randomTickSpeed"));
        assert_eq!(canonical_rule("pvp"), None);
        assert_eq!(GameRule::parse("3"), Some(GameRule::Int(3)));
        assert_eq!(GameRule::parse("nope"), None);
    }

    #[test]
    fn test_spectator_mode_maps_across() {
        assert_eq!(bedrock_game_type(3), 6);
        assert_eq!(java_game_type(6), 3);
        for mode in 0..3 {
            assert_eq!(java_game_type(bedrock_game_type(mode)), mode);
        }
    }
}
