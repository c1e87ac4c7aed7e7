//! 16×16×16 block sections.

use crate::block_definitions::{BlockState, AIR};
use crate::palette::BlockPalette;

pub const SECTION_VOLUME: usize = 4096;

/// Block storage strategy for a 16×16×16 section.
///
/// Entries are palette indices. `Uniform` covers the very common all-air and
/// all-stone sections without a 4096-entry allocation.
#[derive(Debug, Clone)]
pub(crate) enum BlockStorage {
    Uniform(u16),
    Full(Vec<u16>),
}

impl BlockStorage {
    #[inline(always)]
    pub fn get(&self, index: usize) -> u16 {
        match self {
            BlockStorage::Uniform(b) => *b,
            BlockStorage::Full(v) => v[index],
        }
    }

    /// Promotes `Uniform` to `Full` on the first differing write.
    #[inline]
    pub fn set(&mut self, index: usize, value: u16) {
        match self {
            BlockStorage::Uniform(b) if *b == value => {}
            BlockStorage::Uniform(base) => {
                let mut v = vec![*base; SECTION_VOLUME];
                v[index] = value;
                *self = BlockStorage::Full(v);
            }
            BlockStorage::Full(v) => v[index] = value,
        }
    }

    pub fn to_vec(&self) -> Vec<u16> {
        match self {
            BlockStorage::Uniform(b) => vec![*b; SECTION_VOLUME],
            BlockStorage::Full(v) => v.clone(),
        }
    }

    /// Collapses a `Full` vec back to `Uniform` if every entry is the same.
    pub fn try_compact(&mut self) {
        if let BlockStorage::Full(v) = self {
            if let Some(&first) = v.first() {
                if v.iter().all(|&b| b == first) {
                    *self = BlockStorage::Uniform(first);
                }
            }
        }
    }
}

/// One section of canonical blocks, palette index 0 is air.
#[derive(Debug, Clone)]
pub struct Section {
    palette: BlockPalette<BlockState>,
    storage: BlockStorage,
}

impl Default for Section {
    fn default() -> Self {
        Self::new()
    }
}

impl Section {
    pub fn new() -> Self {
        Self {
            palette: BlockPalette::new(AIR.clone()),
            storage: BlockStorage::Uniform(0),
        }
    }

    /// Builds a section from a decoded palette and YZX-ordered indices.
    ///
    /// Equal palette entries are merged, so two source entries that translate
    /// to the same canonical block share one index. Out-of-range indices read
    /// as air.
    pub fn from_parts(palette: &[BlockState], indices: &[u16]) -> Self {
        let mut section = Section::new();
        let remap: Vec<u16> = palette
            .iter()
            .map(|block| section.palette.insert(block.clone()))
            .collect();
        if remap.len() == 1 {
            section.storage = BlockStorage::Uniform(remap[0]);
            return section;
        }
        let data: Vec<u16> = (0..SECTION_VOLUME)
            .map(|i| {
                indices
                    .get(i)
                    .and_then(|&idx| remap.get(usize::from(idx)))
                    .copied()
                    .unwrap_or(0)
            })
            .collect();
        section.storage = BlockStorage::Full(data);
        section.storage.try_compact();
        section
    }

    /// Flat YZX index.
    #[inline(always)]
    pub fn index(x: usize, y: usize, z: usize) -> usize {
        (y << 8) | (z << 4) | x
    }

    pub fn block(&self, x: usize, y: usize, z: usize) -> &BlockState {
        self.block_by_index(Self::index(x, y, z))
    }

    pub fn block_by_index(&self, index: usize) -> &BlockState {
        self.palette
            .get(self.storage.get(index))
            .unwrap_or_else(|| self.palette.default_entry())
    }

    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block: BlockState) {
        let index = self.palette.insert(block);
        self.storage.set(Self::index(x, y, z), index);
    }

    pub fn is_empty(&self) -> bool {
        match &self.storage {
            BlockStorage::Uniform(i) => self.palette.get(*i).map_or(true, BlockState::is_air),
            BlockStorage::Full(v) => v
                .iter()
                .all(|&i| self.palette.get(i).map_or(true, BlockState::is_air)),
        }
    }

    /// Every palette entry, including ones no longer referenced.
    pub fn palette(&self) -> &[BlockState] {
        self.palette.entries()
    }

    /// Palette restricted to the entries in use, with air kept at index 0,
    /// plus the matching YZX index array.
    pub fn compacted(&self) -> (Vec<BlockState>, Vec<u16>) {
        let indices = self.storage.to_vec();
        let mut used = vec![false; self.palette.len()];
        used[0] = true;
        for &i in &indices {
            if let Some(slot) = used.get_mut(usize::from(i)) {
                *slot = true;
            }
        }
        let mut remap = vec![0u16; self.palette.len()];
        let mut palette = Vec::new();
        for (old, entry) in self.palette.entries().iter().enumerate() {
            if used[old] {
                remap[old] = palette.len() as u16;
                palette.push(entry.clone());
            }
        }
        let indices = indices
            .into_iter()
            .map(|i| remap.get(usize::from(i)).copied().unwrap_or(0))
            .collect();
        (palette, indices)
    }
}
