//! Little-endian NBT over `fastnbt::Value`.
//!
//! Bedrock stores every tag tree (palette entries, block entities, actors,
//! level.dat) in the little-endian variant, which `fastnbt` doesn't speak.
//! Compound keys are written in sorted order so output is reproducible.

use crate::nbt_utils::Compound;
use byteorder::{LittleEndian, ReadBytesExt};
use fastnbt::{ByteArray, IntArray, LongArray, Value};
use std::io::{Cursor, Read};
use thiserror::Error;

/// Maximum nesting depth to prevent stack overflow on hostile input.
const MAX_DEPTH: usize = 512;

#[derive(Debug, Error)]
pub enum NbtError {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("expected TAG_Compound (10) at root, got {got}")]
    ExpectedCompound { got: u8 },

    #[error("unknown tag type: {0}")]
    UnknownTagType(u8),

    #[error("invalid UTF-8 in NBT string")]
    InvalidUtf8,

    #[error("nesting too deep (limit: {limit})")]
    NestingTooDeep { limit: usize },

    #[error("negative length: {0}")]
    NegativeLength(i32),
}

impl From<std::io::Error> for NbtError {
    fn from(_: std::io::Error) -> Self {
        NbtError::UnexpectedEof
    }
}

type Reader<'a> = Cursor<&'a [u8]>;

/// Decodes a single root compound, ignoring its name and any trailing bytes.
pub fn from_le_bytes(data: &[u8]) -> Result<Compound, NbtError> {
    let mut cursor = Cursor::new(data);
    read_root(&mut cursor).map(|(_, compound)| compound)
}

/// Decodes back-to-back root compounds until the buffer is exhausted.
///
/// Bedrock block-entity and entity records are stored this way.
pub fn read_all(data: &[u8]) -> Result<Vec<Compound>, NbtError> {
    let mut cursor = Cursor::new(data);
    let mut out = Vec::new();
    while (cursor.position() as usize) < data.len() {
        let (_, compound) = read_root(&mut cursor)?;
        out.push(compound);
    }
    Ok(out)
}

/// Reads one named root compound from the cursor.
pub fn read_root(cursor: &mut Reader<'_>) -> Result<(String, Compound), NbtError> {
    let tag_type = cursor.read_u8()?;
    if tag_type != 10 {
        return Err(NbtError::ExpectedCompound { got: tag_type });
    }
    let name = read_string(cursor)?;
    let compound = read_compound(cursor, 0)?;
    Ok((name, compound))
}

fn read_tag(cursor: &mut Reader<'_>, tag_type: u8, depth: usize) -> Result<Value, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::NestingTooDeep { limit: MAX_DEPTH });
    }

    Ok(match tag_type {
        1 => Value::Byte(cursor.read_i8()?),
        2 => Value::Short(cursor.read_i16::<LittleEndian>()?),
        3 => Value::Int(cursor.read_i32::<LittleEndian>()?),
        4 => Value::Long(cursor.read_i64::<LittleEndian>()?),
        5 => Value::Float(cursor.read_f32::<LittleEndian>()?),
        6 => Value::Double(cursor.read_f64::<LittleEndian>()?),
        7 => {
            let len = read_len(cursor)?;
            ensure_remaining(cursor, len)?;
            let mut bytes = vec![0i8; len];
            cursor.read_i8_into(&mut bytes)?;
            Value::ByteArray(ByteArray::new(bytes))
        }
        8 => Value::String(read_string(cursor)?),
        9 => {
            let element_type = cursor.read_u8()?;
            let len = read_len(cursor)?;
            let mut list = Vec::with_capacity(len.min(4096));
            for _ in 0..len {
                list.push(read_tag(cursor, element_type, depth + 1)?);
            }
            Value::List(list)
        }
        10 => Value::Compound(read_compound(cursor, depth + 1)?),
        11 => {
            let len = read_len(cursor)?;
            ensure_remaining(cursor, len * 4)?;
            let mut ints = vec![0i32; len];
            cursor.read_i32_into::<LittleEndian>(&mut ints)?;
            Value::IntArray(IntArray::new(ints))
        }
        12 => {
            let len = read_len(cursor)?;
            ensure_remaining(cursor, len * 8)?;
            let mut longs = vec![0i64; len];
            cursor.read_i64_into::<LittleEndian>(&mut longs)?;
            Value::LongArray(LongArray::new(longs))
        }
        other => return Err(NbtError::UnknownTagType(other)),
    })
}

fn read_compound(cursor: &mut Reader<'_>, depth: usize) -> Result<Compound, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::NestingTooDeep { limit: MAX_DEPTH });
    }
    let mut map = Compound::new();
    loop {
        let tag_type = cursor.read_u8()?;
        if tag_type == 0 {
            break;
        }
        let name = read_string(cursor)?;
        let tag = read_tag(cursor, tag_type, depth)?;
        map.insert(name, tag);
    }
    Ok(map)
}

fn read_len(cursor: &mut Reader<'_>) -> Result<usize, NbtError> {
    let len = cursor.read_i32::<LittleEndian>()?;
    if len < 0 {
        return Err(NbtError::NegativeLength(len));
    }
    Ok(len as usize)
}

fn read_string(cursor: &mut Reader<'_>) -> Result<String, NbtError> {
    let len = usize::from(cursor.read_u16::<LittleEndian>()?);
    ensure_remaining(cursor, len)?;
    let mut bytes = vec![0u8; len];
    cursor.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| NbtError::InvalidUtf8)
}

fn ensure_remaining(cursor: &Reader<'_>, needed: usize) -> Result<(), NbtError> {
    let remaining = cursor.get_ref().len().saturating_sub(cursor.position() as usize);
    if remaining < needed {
        Err(NbtError::UnexpectedEof)
    } else {
        Ok(())
    }
}

/// Encodes `compound` as an unnamed root compound.
pub fn to_le_bytes(compound: &Compound) -> Vec<u8> {
    let mut out = Vec::new();
    write_root(&mut out, "", compound);
    out
}

/// Encodes several compounds back to back.
pub fn to_le_bytes_many<'a>(compounds: impl IntoIterator<Item = &'a Compound>) -> Vec<u8> {
    let mut out = Vec::new();
    for compound in compounds {
        write_root(&mut out, "", compound);
    }
    out
}

pub fn write_root(out: &mut Vec<u8>, name: &str, compound: &Compound) {
    out.push(10);
    write_string(out, name);
    write_compound(out, compound);
}

fn tag_id(value: &Value) -> u8 {
    match value {
        Value::Byte(_) => 1,
        Value::Short(_) => 2,
        Value::Int(_) => 3,
        Value::Long(_) => 4,
        Value::Float(_) => 5,
        Value::Double(_) => 6,
        Value::ByteArray(_) => 7,
        Value::String(_) => 8,
        Value::List(_) => 9,
        Value::Compound(_) => 10,
        Value::IntArray(_) => 11,
        Value::LongArray(_) => 12,
    }
}

fn write_tag(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Byte(v) => out.push(*v as u8),
        Value::Short(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Long(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::ByteArray(arr) => {
            write_len(out, arr.len());
            out.extend(arr.iter().map(|b| *b as u8));
        }
        Value::String(s) => write_string(out, s),
        Value::List(list) => {
            out.push(list.first().map(tag_id).unwrap_or(0));
            write_len(out, list.len());
            for item in list {
                write_tag(out, item);
            }
        }
        Value::Compound(map) => write_compound(out, map),
        Value::IntArray(arr) => {
            write_len(out, arr.len());
            for v in arr.iter() {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        Value::LongArray(arr) => {
            write_len(out, arr.len());
            for v in arr.iter() {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
}

fn write_compound(out: &mut Vec<u8>, compound: &Compound) {
    let mut keys: Vec<&String> = compound.keys().collect();
    keys.sort();
    for key in keys {
        let value = &compound[key];
        out.push(tag_id(value));
        write_string(out, key);
        write_tag(out, value);
    }
    out.push(0);
}

fn write_len(out: &mut Vec<u8>, len: usize) {
    out.extend_from_slice(&(len as i32).to_le_bytes());
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(usize::from(u16::MAX));
    out.extend_from_slice(&(len as u16).to_le_bytes());
    out.extend_from_slice(&bytes[..len]);
}
