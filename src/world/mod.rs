//! In-memory chunk model shared by every reader, writer and terraform pass.

pub mod accessor;
pub mod biome_grid;
pub mod chunk;
pub mod height_map;
pub mod section;

pub use accessor::{BlockAccessor, NeighborhoodAccessor, SingleChunkAccessor};
pub use biome_grid::BiomeGrid;
pub use chunk::{Chunk, PendingTick};
pub use height_map::HeightMap;
pub use section::Section;
