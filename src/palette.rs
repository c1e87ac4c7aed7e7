//! De-duplicating palettes and the two index packing schemes.
//!
//! Java packs palette indices into `i64` words without letting an entry
//! straddle two words (1.16+). Bedrock packs into little-endian `u32` words
//! with the same no-straddle rule but only allows a fixed set of widths.

use fnv::FnvHashMap;
use std::hash::Hash;

/// Ordered set of distinct entries addressed by a 16-bit index.
///
/// Index 0 is always the default entry the palette was created with.
#[derive(Debug, Clone)]
pub struct BlockPalette<T> {
    entries: Vec<T>,
    lookup: FnvHashMap<T, u16>,
}

impl<T: Clone + Eq + Hash> BlockPalette<T> {
    pub fn new(default: T) -> Self {
        let mut lookup = FnvHashMap::default();
        lookup.insert(default.clone(), 0);
        Self {
            entries: vec![default],
            lookup,
        }
    }

    /// Returns the index of `entry`, appending it if no equal entry exists.
    pub fn insert(&mut self, entry: T) -> u16 {
        if let Some(&index) = self.lookup.get(&entry) {
            return index;
        }
        let index = self.entries.len() as u16;
        self.entries.push(entry.clone());
        self.lookup.insert(entry, index);
        index
    }

    pub fn get(&self, index: u16) -> Option<&T> {
        self.entries.get(usize::from(index))
    }

    pub fn default_entry(&self) -> &T {
        &self.entries[0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        // Never true: index 0 always exists.
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }
}

/// Minimum bits needed for `count` palette entries, never below `min_bits`.
pub fn java_bits_per_entry(count: usize, min_bits: u32) -> u32 {
    let mut bits = min_bits;
    while (1usize << bits) < count {
        bits += 1;
    }
    bits
}

/// Packs indices into Java's long-array layout.
pub fn pack_java(indices: &[u16], bits: u32) -> Vec<i64> {
    let per_word = (64 / bits) as usize;
    let mut data = Vec::with_capacity(indices.len().div_ceil(per_word));
    for chunk in indices.chunks(per_word) {
        let mut word: u64 = 0;
        for (i, &index) in chunk.iter().enumerate() {
            word |= u64::from(index) << (i as u32 * bits);
        }
        data.push(word as i64);
    }
    data
}

/// Unpacks `count` indices from Java's long-array layout.
///
/// Returns `None` if the array is too short for the given width.
pub fn unpack_java(data: &[i64], bits: u32, count: usize) -> Option<Vec<u16>> {
    if bits == 0 || bits > 16 {
        return None;
    }
    let per_word = (64 / bits) as usize;
    if data.len() < count.div_ceil(per_word) {
        return None;
    }
    let mask = (1u64 << bits) - 1;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let word = data[i / per_word] as u64;
        let shift = (i % per_word) as u32 * bits;
        out.push(((word >> shift) & mask) as u16);
    }
    Some(out)
}

/// Bedrock's legal index widths.
pub const BEDROCK_VALID_BITS: [u8; 8] = [1, 2, 3, 4, 5, 6, 8, 16];

/// Bits per block using valid Bedrock widths.
pub fn bedrock_bits_per_block(palette_count: usize) -> u8 {
    for &bits in &BEDROCK_VALID_BITS {
        if palette_count <= (1usize << bits) {
            return bits;
        }
    }
    16
}

/// Number of `u32` words needed for 4096 entries at `bits` width.
pub fn bedrock_word_count(bits: u8) -> usize {
    let per_word = 32 / usize::from(bits);
    4096usize.div_ceil(per_word)
}

/// Packs indices into Bedrock words (no entry spans two words).
pub fn pack_bedrock(indices: &[u16], bits: u8) -> Vec<u32> {
    let per_word = 32 / usize::from(bits);
    let mask = (1u32 << bits) - 1;
    indices
        .chunks(per_word)
        .map(|chunk| {
            chunk.iter().enumerate().fold(0u32, |word, (i, &index)| {
                word | ((u32::from(index) & mask) << (i as u32 * u32::from(bits)))
            })
        })
        .collect()
}

pub fn unpack_bedrock(words: &[u32], bits: u8, count: usize) -> Vec<u16> {
    let per_word = 32 / usize::from(bits);
    let mask = (1u32 << bits) - 1;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let word = words.get(i / per_word).copied().unwrap_or(0);
        let shift = (i % per_word) as u32 * u32::from(bits);
        out.push(((word >> shift) & mask) as u16);
    }
    out
}
