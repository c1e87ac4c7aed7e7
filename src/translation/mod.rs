//! Identifier translation between the canonical vocabulary and Bedrock.
//!
//! Everything in here is a pure table lookup. Lookups never fail: absent keys
//! fall back to a placeholder and report `known == false` so the caller can
//! count the anomaly.

pub mod bedrock_block_map;
pub mod bimap;
pub mod biomes;
pub mod commands;
pub mod identifiers;
pub mod items;

use crate::block_definitions::BlockState;
use bedrock_block_map::BedrockBlock;
use fnv::FnvHashSet;
use log::warn;
use std::sync::Mutex;

/// Result of a lookup that degrades gracefully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated<T> {
    pub value: T,
    /// `false` when `value` is a placeholder or an untranslated pass-through.
    pub known: bool,
}

impl<T> Translated<T> {
    pub fn known(value: T) -> Self {
        Self { value, known: true }
    }

    pub fn unknown(value: T) -> Self {
        Self {
            value,
            known: false,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Translated<U> {
        Translated {
            value: f(self.value),
            known: self.known,
        }
    }
}

/// Shared translation service for one run.
///
/// The tables are static; the only state is the set of identifiers already
/// reported as unknown, so each one is logged once per run instead of once
/// per palette.
#[derive(Default)]
pub struct Translator {
    reported: Mutex<FnvHashSet<String>>,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_to_bedrock(&self, block: &BlockState) -> Translated<BedrockBlock> {
        let out = bedrock_block_map::to_bedrock_block(block);
        if !out.known {
            self.report("block", &block.name);
        }
        out
    }

    pub fn block_to_java(&self, block: &BedrockBlock) -> Translated<BlockState> {
        let out = bedrock_block_map::to_java_block(block);
        if !out.known {
            self.report("block", &block.name);
        }
        out
    }

    pub fn biome_to_bedrock(&self, java: &str) -> Translated<u32> {
        let out = biomes::to_bedrock_id(java);
        if !out.known {
            self.report("biome", java);
        }
        out
    }

    pub fn biome_to_java(&self, id: u32) -> Translated<String> {
        let out = biomes::to_java_name(id);
        if !out.known {
            self.report("biome", &id.to_string());
        }
        out
    }

    pub fn entity_to_bedrock(&self, java: &str) -> Translated<String> {
        identifiers::entity_to_bedrock(java)
    }

    pub fn entity_to_java(&self, bedrock: &str) -> Translated<String> {
        identifiers::entity_to_java(bedrock)
    }

    fn report(&self, kind: &str, identifier: &str) {
        let Ok(mut reported) = self.reported.lock() else {
            return;
        };
        if reported.insert(format!("{kind}:{identifier}")) {
            warn!("No translation for {kind} {identifier}, using a placeholder");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_block_is_reported_once() {
        let translator = Translator::new();
        let modded = BlockState::new("othermod:gizmo");
        assert!(!translator.block_to_bedrock(&modded).known);
        assert!(!translator.block_to_bedrock(&modded).known);
        assert_eq!(translator.reported.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_translated_map_keeps_flag() {
        let t = Translated::unknown(3).map(|v| v * 2);
        assert_eq!(t.value, 6);
        assert!(!t.known);
    }
}
