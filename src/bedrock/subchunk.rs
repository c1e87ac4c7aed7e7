//! Sub-chunk (v9) and Data3D encodings.
//!
//! Bedrock orders a sub-chunk's 4096 entries XZY (`x * 256 + z * 16 + y`),
//! while [`crate::world::Section`] keeps them YZX. Conversion between the two
//! happens here so nothing above this module sees the Bedrock order.

use crate::bedrock_nbt;
use crate::error::ChunkFailure;
use crate::nbt_utils::Compound;
use crate::palette::{bedrock_bits_per_block, bedrock_word_count, pack_bedrock, unpack_bedrock};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

pub const SUBCHUNK_VERSION: u8 = 9;
pub const VOLUME: usize = 4096;

/// Section (YZX) index to Bedrock (XZY) index.
pub fn to_xzy(yzx: usize) -> usize {
    let x = yzx & 15;
    let z = (yzx >> 4) & 15;
    let y = yzx >> 8;
    (x << 8) | (z << 4) | y
}

/// Bedrock (XZY) index to section (YZX) index.
pub fn to_yzx(xzy: usize) -> usize {
    let y = xzy & 15;
    let z = (xzy >> 4) & 15;
    let x = xzy >> 8;
    (y << 8) | (z << 4) | x
}

/// One storage layer: palette entries plus 4096 indices in XZY order.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub palette: Vec<Compound>,
    pub indices: Vec<u16>,
}

fn write_indices(out: &mut Vec<u8>, indices: &[u16], palette_len: usize, runtime: bool) {
    let flag = u8::from(runtime);
    if palette_len <= 1 {
        out.push(flag);
        return;
    }
    let bits = bedrock_bits_per_block(palette_len);
    out.push((bits << 1) | flag);
    for word in pack_bedrock(indices, bits) {
        let _ = out.write_u32::<LittleEndian>(word);
    }
}

fn read_indices(cursor: &mut Cursor<&[u8]>) -> Result<(Vec<u16>, bool), ChunkFailure> {
    let header = cursor.read_u8()?;
    let bits = header >> 1;
    if bits == 0 {
        return Ok((vec![0; VOLUME], true));
    }
    if !crate::palette::BEDROCK_VALID_BITS.contains(&bits) {
        return Err(ChunkFailure::Malformed(format!("invalid palette width {bits}")));
    }
    let mut words = vec![0u32; bedrock_word_count(bits)];
    cursor.read_u32_into::<LittleEndian>(&mut words)?;
    Ok((unpack_bedrock(&words, bits, VOLUME), false))
}

/// Encodes a v9 sub-chunk.
pub fn encode_subchunk(section_y: i8, layers: &[Layer]) -> Vec<u8> {
    let mut out = vec![SUBCHUNK_VERSION, layers.len() as u8, section_y as u8];
    for layer in layers {
        write_indices(&mut out, &layer.indices, layer.palette.len(), false);
        let _ = out.write_i32::<LittleEndian>(layer.palette.len() as i32);
        for entry in &layer.palette {
            bedrock_nbt::write_root(&mut out, "", entry);
        }
    }
    out
}

/// Decodes a v8 or v9 sub-chunk into its layers.
pub fn decode_subchunk(data: &[u8]) -> Result<Vec<Layer>, ChunkFailure> {
    let mut cursor = Cursor::new(data);
    let version = cursor.read_u8()?;
    let layer_count = match version {
        8 => cursor.read_u8()?,
        9 => {
            let count = cursor.read_u8()?;
            let _section_y = cursor.read_u8()?;
            count
        }
        other => return Err(ChunkFailure::UnsupportedVersion(i32::from(other))),
    };
    let mut layers = Vec::with_capacity(usize::from(layer_count));
    for _ in 0..layer_count {
        let (indices, _) = read_indices(&mut cursor)?;
        let count = cursor.read_i32::<LittleEndian>()?;
        let count = usize::try_from(count)
            .map_err(|_| ChunkFailure::Malformed(format!("negative palette size {count}")))?;
        let mut palette = Vec::with_capacity(count);
        for _ in 0..count {
            let (_, entry) = bedrock_nbt::read_root(&mut cursor)?;
            palette.push(entry);
        }
        if indices.iter().any(|&i| usize::from(i) >= palette.len().max(1)) {
            return Err(ChunkFailure::Malformed("palette index out of range".to_string()));
        }
        layers.push(Layer { palette, indices });
    }
    Ok(layers)
}

/// Height map and per-section biome storages of a Data3D record.
#[derive(Debug, Clone, PartialEq)]
pub struct Data3d {
    /// Column heights relative to the dimension floor, index `z * 16 + x`.
    pub heights: [i16; 256],
    /// Biome ids per section from the dimension floor up, in XZY order.
    pub biomes: Vec<Vec<u32>>,
}

pub fn encode_data3d(data: &Data3d) -> Vec<u8> {
    let mut out = Vec::with_capacity(512 + data.biomes.len() * 600);
    for height in data.heights {
        let _ = out.write_i16::<LittleEndian>(height);
    }
    let mut previous: Option<&Vec<u32>> = None;
    for biomes in &data.biomes {
        if previous == Some(biomes) {
            out.push(0xFF);
            continue;
        }
        let mut palette: Vec<u32> = Vec::new();
        let indices: Vec<u16> = biomes
            .iter()
            .map(|id| match palette.iter().position(|p| p == id) {
                Some(i) => i as u16,
                None => {
                    palette.push(*id);
                    (palette.len() - 1) as u16
                }
            })
            .collect();
        write_indices(&mut out, &indices, palette.len(), true);
        if palette.len() > 1 {
            let _ = out.write_i32::<LittleEndian>(palette.len() as i32);
        }
        for id in palette {
            let _ = out.write_i32::<LittleEndian>(id as i32);
        }
        previous = Some(biomes);
    }
    out
}

pub fn decode_data3d(data: &[u8], sections: usize) -> Result<Data3d, ChunkFailure> {
    let mut cursor = Cursor::new(data);
    let mut heights = [0i16; 256];
    cursor.read_i16_into::<LittleEndian>(&mut heights)?;
    let mut biomes: Vec<Vec<u32>> = Vec::with_capacity(sections);
    while biomes.len() < sections && (cursor.position() as usize) < data.len() {
        let mut peek = [0u8; 1];
        cursor.read_exact(&mut peek)?;
        if peek[0] == 0xFF {
            let copy = biomes
                .last()
                .cloned()
                .ok_or_else(|| ChunkFailure::Malformed("biome copy marker without a previous section".to_string()))?;
            biomes.push(copy);
            continue;
        }
        cursor.set_position(cursor.position() - 1);
        let (indices, single) = read_indices(&mut cursor)?;
        let count = if single {
            1
        } else {
            usize::try_from(cursor.read_i32::<LittleEndian>()?).unwrap_or(0)
        };
        let mut palette = Vec::with_capacity(count);
        for _ in 0..count {
            palette.push(cursor.read_i32::<LittleEndian>()? as u32);
        }
        let ids = indices
            .iter()
            .map(|&i| palette.get(usize::from(i)).copied().unwrap_or(0))
            .collect();
        biomes.push(ids);
    }
    Ok(Data3d { heights, biomes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt_utils::CompoundBuilder;

    fn entry(name: &str) -> Compound {
        CompoundBuilder::new()
            .string("name", name)
            .compound("states", Compound::new())
            .int("version", 1)
            .build()
    }

    #[test]
    fn test_index_orders_are_inverse() {
        for i in [0, 1, 15, 16, 255, 256, 4095, 1234] {
            assert_eq!(to_yzx(to_xzy(i)), i);
        }
        // x = 1, y = 0, z = 0
        assert_eq!(to_xzy(1), 256);
    }

    #[test]
    fn test_subchunk_layers_survive_encoding() {
        let mut indices = vec![0u16; VOLUME];
        indices[to_xzy(5)] = 1;
        let blocks = Layer {
            palette: vec![entry("minecraft:air"), entry("minecraft:stone")],
            indices,
        };
        let water = Layer {
            palette: vec![entry("minecraft:air")],
            indices: vec![0; VOLUME],
        };
        let bytes = encode_subchunk(-2, &[blocks.clone(), water.clone()]);
        assert_eq!(&bytes[..3], &[9, 2, (-2i8) as u8]);
        let layers = decode_subchunk(&bytes).unwrap();
        assert_eq!(layers, vec![blocks, water]);
    }

    #[test]
    fn test_data3d_copies_repeated_biome_sections() {
        let plains = vec![1u32; VOLUME];
        let mut mixed = vec![1u32; VOLUME];
        mixed[7] = 24;
        let data = Data3d {
            heights: [65; 256],
            biomes: vec![plains.clone(), plains.clone(), mixed],
        };
        let bytes = encode_data3d(&data);
        // Heights, a single-value section, the copy marker, then a paletted one.
        assert_eq!(bytes[512], 1);
        assert_eq!(bytes[517], 0xFF);
        assert_eq!(decode_data3d(&bytes, 3).unwrap(), data);
    }
}
