use super::biome_grid::BiomeGrid;
use super::height_map::HeightMap;
use super::section::Section;
use crate::block_definitions::{light_properties, BlockState, AIR};
use crate::coords::{BlockPos, ChunkPos, Dimension};
use crate::nbt_utils::Compound;
use crate::records::StructureRecord;
use std::collections::BTreeMap;

/// A scheduled block or fluid update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTick {
    pub pos: BlockPos,
    /// Canonical block or fluid identifier the tick targets.
    pub target: String,
    pub delay: i32,
    pub priority: i32,
    pub fluid: bool,
}

impl PendingTick {
    /// Stable order by delay, then priority; equal ticks keep their original order.
    pub fn sort(ticks: &mut [PendingTick]) {
        ticks.sort_by_key(|t| (t.delay, t.priority));
    }
}

/// One chunk in the canonical vocabulary.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub dimension: Dimension,
    pub pos: ChunkPos,
    pub sections: BTreeMap<i8, Section>,
    pub biomes: BiomeGrid,
    pub height_map: HeightMap,
    /// Java-form block-entity compounds keyed by absolute position.
    pub block_entities: BTreeMap<BlockPos, Compound>,
    pub pending_ticks: Vec<PendingTick>,
    /// Java-form entity compounds.
    pub entities: Vec<Compound>,
    /// Structure bounds known to overlap this chunk.
    pub structures: Vec<StructureRecord>,
    /// Data version the chunk was read with, for the statistics histogram.
    pub source_version: i32,
    pub inhabited_time: i64,
    pub last_update: i64,
}

impl Chunk {
    pub fn new(dimension: Dimension, pos: ChunkPos) -> Self {
        let default_biome = match dimension {
            Dimension::Overworld => "minecraft:plains",
            Dimension::Nether => "minecraft:nether_wastes",
            Dimension::End => "minecraft:the_end",
        };
        Self {
            dimension,
            pos,
            sections: BTreeMap::new(),
            biomes: BiomeGrid::new(default_biome),
            height_map: HeightMap::new(dimension.min_section()),
            block_entities: BTreeMap::new(),
            pending_ticks: Vec::new(),
            entities: Vec::new(),
            structures: Vec::new(),
            source_version: 0,
            inhabited_time: 0,
            last_update: 0,
        }
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.chunk() == self.pos
    }

    /// Block at local `x`/`z` and absolute `y`. Missing sections read as air.
    pub fn block(&self, x: usize, y: i32, z: usize) -> &BlockState {
        let section_y = y.div_euclid(16) as i8;
        match self.sections.get(&section_y) {
            Some(section) => section.block(x, y.rem_euclid(16) as usize, z),
            None => &AIR,
        }
    }

    /// Block at an absolute position, `None` outside this chunk's footprint
    /// or the dimension's height range.
    pub fn block_at(&self, pos: BlockPos) -> Option<&BlockState> {
        if !self.contains(pos) || pos.y < self.dimension.min_y() || pos.y > self.dimension.max_y() {
            return None;
        }
        Some(self.block(
            pos.x.rem_euclid(16) as usize,
            pos.y,
            pos.z.rem_euclid(16) as usize,
        ))
    }

    pub fn set_block(&mut self, x: usize, y: i32, z: usize, block: BlockState) {
        let section_y = y.div_euclid(16) as i8;
        self.sections
            .entry(section_y)
            .or_default()
            .set_block(x, y.rem_euclid(16) as usize, z, block);
    }

    /// Sets the block at an absolute position inside this chunk.
    /// Returns `false` if the position belongs to another chunk.
    pub fn set_block_at(&mut self, pos: BlockPos, block: BlockState) -> bool {
        if !self.contains(pos) {
            return false;
        }
        self.set_block(
            pos.x.rem_euclid(16) as usize,
            pos.y,
            pos.z.rem_euclid(16) as usize,
            block,
        );
        true
    }

    /// Absolute position of local coordinates.
    pub fn world_pos(&self, x: usize, y: i32, z: usize) -> BlockPos {
        BlockPos::new(self.pos.min_block_x() + x as i32, y, self.pos.min_block_z() + z as i32)
    }

    /// Every distinct block present in any section palette.
    pub fn palette_blocks(&self) -> impl Iterator<Item = &BlockState> {
        self.sections.values().flat_map(|s| s.palette().iter())
    }

    /// Visits every block position whose block satisfies `filter`.
    pub fn positions_where(&self, filter: impl Fn(&BlockState) -> bool) -> Vec<BlockPos> {
        let mut out = Vec::new();
        for (&section_y, section) in &self.sections {
            if !section.palette().iter().any(&filter) {
                continue;
            }
            for index in 0..super::section::SECTION_VOLUME {
                if filter(section.block_by_index(index)) {
                    let x = index & 15;
                    let z = (index >> 4) & 15;
                    let y = i32::from(section_y) * 16 + (index >> 8) as i32;
                    out.push(self.world_pos(x, y, z));
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(Section::is_empty)
            && self.block_entities.is_empty()
            && self.entities.is_empty()
    }

    /// Recomputes the height map from block opacity.
    pub fn recompute_height_map(&mut self) {
        let mut map = HeightMap::new(self.dimension.min_section());
        let top_sections: Vec<(i8, &Section)> =
            self.sections.iter().rev().map(|(y, s)| (*y, s)).collect();
        for z in 0..16 {
            for x in 0..16 {
                'column: for (section_y, section) in &top_sections {
                    for local_y in (0..16).rev() {
                        let block = section.block(x, local_y, z);
                        if !block.is_air() && light_properties(block).blocks_height_map() {
                            map.set(x, z, i32::from(*section_y) * 16 + local_y as i32);
                            break 'column;
                        }
                    }
                }
            }
        }
        self.height_map = map;
    }

    /// Drops sections that hold only air.
    pub fn prune_empty_sections(&mut self) {
        self.sections.retain(|_, s| !s.is_empty());
    }
}
