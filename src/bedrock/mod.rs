//! Bedrock world I/O: LevelDB records, `level.dat` and `.mcworld` archives.

pub mod chunk;
pub mod keys;
pub mod level_dat;
pub mod mcworld;
pub mod records;
pub mod subchunk;
pub mod world;

pub use chunk::{decode_chunk, encode_chunk, put_records, Records};
pub use keys::list_chunks;
pub use world::BedrockWorld;
