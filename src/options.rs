//! Conversion options.

use crate::coords::{ChunkPos, Dimension, Edition};
use crate::entity::id_registry::parse_uuid;
use crate::error::ConvertError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterOptions {
    pub source: Edition,
    pub target: Edition,
    /// Dimensions to convert. Empty converts all of them.
    pub dimensions: BTreeSet<Dimension>,
    /// Chunks to convert, in every selected dimension. Empty converts all of them.
    pub chunks: BTreeSet<ChunkPos>,
    /// Where the `.mcworld` working directory is created.
    pub temp_dir: Option<PathBuf>,
    /// UUID of the player whose data becomes the single-player player.
    #[serde(deserialize_with = "deserialize_uuid", serialize_with = "serialize_uuid")]
    pub local_player_uuid: Option<u128>,
    /// Seconds since the Unix epoch. `None` stamps the time of conversion.
    pub last_played: Option<i64>,
    /// Worker threads. 0 uses the detected hardware parallelism.
    pub concurrency: usize,
    /// Replaces the source world's name.
    pub level_name: Option<String>,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            source: Edition::Java,
            target: Edition::Bedrock,
            dimensions: BTreeSet::new(),
            chunks: BTreeSet::new(),
            temp_dir: None,
            local_player_uuid: None,
            last_played: None,
            concurrency: 0,
            level_name: None,
        }
    }
}

fn deserialize_uuid<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u128>, D::Error> {
    let text: Option<String> = Option::deserialize(deserializer)?;
    text.map(|t| {
        parse_uuid(&t).ok_or_else(|| serde::de::Error::custom(format!("invalid UUID {t:?}")))
    })
    .transpose()
}

fn serialize_uuid<S: serde::Serializer>(uuid: &Option<u128>, serializer: S) -> Result<S::Ok, S::Error> {
    uuid.map(crate::entity::id_registry::format_uuid)
        .serialize(serializer)
}

impl ConverterOptions {
    pub fn from_json_file(path: &Path) -> Result<Self, ConvertError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Selected dimensions, in id order.
    pub fn selected_dimensions(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|d| self.dimensions.is_empty() || self.dimensions.contains(d))
            .collect()
    }

    pub fn wants_chunk(&self, pos: ChunkPos) -> bool {
        self.chunks.is_empty() || self.chunks.contains(&pos)
    }

    pub fn last_played_or_now(&self) -> i64 {
        self.last_played.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0)
        })
    }

    pub fn threads(&self) -> usize {
        worker_count(self.concurrency)
    }
}

/// Worker count for a requested concurrency. A request is taken as given;
/// 0 means one worker per hardware thread.
pub fn worker_count(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        fs::write(
            &path,
            r#"{
                "source": "bedrock",
                "target": "java",
                "dimensions": ["nether"],
                "chunks": [{"x": 0, "z": 0}, {"x": -1, "z": 2}],
                "local_player_uuid": "01234567-89ab-cdef-0011-223344556677",
                "last_played": 1700000000,
                "concurrency": 2
            }"#,
        )
        .unwrap();
        let options = ConverterOptions::from_json_file(&path).unwrap();
        assert_eq!(options.source, Edition::Bedrock);
        assert_eq!(options.selected_dimensions(), vec![Dimension::Nether]);
        assert!(options.wants_chunk(ChunkPos::new(-1, 2)));
        assert!(!options.wants_chunk(ChunkPos::new(1, 1)));
        assert_eq!(
            options.local_player_uuid,
            Some(0x0123_4567_89ab_cdef_0011_2233_4455_6677)
        );
        assert_eq!(options.last_played_or_now(), 1_700_000_000);
        assert!(options.level_name.is_none());
    }

    #[test]
    fn test_empty_filters_select_everything() {
        let options = ConverterOptions::default();
        assert_eq!(options.selected_dimensions(), Dimension::ALL.to_vec());
        assert!(options.wants_chunk(ChunkPos::new(1_000, -1_000)));
        assert!(options.last_played_or_now() > 1_600_000_000);
    }

    #[test]
    fn test_bad_uuid_is_rejected() {
        let result: Result<ConverterOptions, _> =
            serde_json::from_str(r#"{"local_player_uuid": "nope"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_worker_count() {
        let hardware = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        assert_eq!(worker_count(0), hardware);
        assert_eq!(worker_count(1), 1);
        assert_eq!(worker_count(hardware + 3), hardware + 3);
        let options = ConverterOptions {
            concurrency: 4,
            ..ConverterOptions::default()
        };
        assert_eq!(options.threads(), 4);
    }
}
