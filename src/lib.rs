//! Converts Minecraft worlds between Java Edition (anvil region files) and
//! Bedrock Edition (LevelDB).
//!
//! [`convert_world`] is the entry point. Chunks are decoded into one
//! edition-neutral [`world::Chunk`], fixed up by the [`terraform`] passes and
//! encoded for the target edition.

pub mod bedrock;
pub mod bedrock_nbt;
pub mod block_definitions;
pub mod context;
pub mod converter;
pub mod coords;
pub mod entity;
pub mod error;
pub mod fs_guard;
pub mod java;
pub mod level;
pub mod maps;
pub mod nbt_utils;
pub mod options;
pub mod palette;
pub mod progress;
pub mod records;
pub mod stats;
pub mod storage;
pub mod terraform;
pub mod translation;
pub mod world;
pub mod world_io;

pub use converter::{convert_with, convert_world, ConversionOutcome};
pub use coords::{ChunkPos, Dimension, Edition};
pub use error::ConvertError;
pub use options::ConverterOptions;
pub use progress::{ConsoleProgress, NoProgress, Phase, Progress};
pub use stats::Statistics;
