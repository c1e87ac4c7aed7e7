//! Filled-map records.
//!
//! Java stores a map as 128×128 palette indices (`base * 4 + shade`), Bedrock
//! as 128×128 RGBA pixels. Java to Bedrock is exact; the way back picks the
//! nearest palette colour.

use crate::coords::Dimension;
use crate::nbt_utils::{Compound, CompoundBuilder, CompoundExt};
use crate::translation::items::java_map_id;
use fastnbt::{ByteArray, Value};
use fnv::FnvHashMap;

pub const MAP_SIZE: usize = 128;
const PIXELS: usize = MAP_SIZE * MAP_SIZE;

/// Base colours by map colour id. Id 0 is transparent.
const BASE_COLORS: [u32; 62] = [
    0x000000, 0x7FB238, 0xF7E9A3, 0xC7C7C7, 0xFF0000, 0xA0A0FF, 0xA7A7A7, 0x007C00, 0xFFFFFF,
    0xA4A8B8, 0x976D4D, 0x707070, 0x4040FF, 0x8F7748, 0xFFFCF5, 0xD87F33, 0xB24CD8, 0x6699D8,
    0xE5E533, 0x7FCC19, 0xF27FA5, 0x4C4C4C, 0x999999, 0x4C7F99, 0x7F3FB2, 0x334CB2, 0x664C33,
    0x667F33, 0x993333, 0x191919, 0xFAEE4D, 0x5CDBD5, 0x4A80FF, 0x00D93A, 0x815631, 0x700200,
    0xD1B1A1, 0x9F5224, 0x95576C, 0x706C8A, 0xBA8524, 0x677535, 0xA04D4E, 0x392923, 0x876B62,
    0x575C5C, 0x7A4958, 0x4C3E5C, 0x4C3223, 0x4C522A, 0x8E3C2E, 0x251610, 0xBD3031, 0x943F61,
    0x5C191D, 0x167E86, 0x3A8E8C, 0x562C3E, 0x14B485, 0x646464, 0xD8AF93, 0x7FA796,
];

/// Brightness of the four shades of each base colour, out of 255.
const SHADES: [u32; 4] = [180, 220, 255, 135];

/// RGBA of a Java palette index.
pub fn java_color_rgba(index: u8) -> [u8; 4] {
    let base = usize::from(index / 4);
    if base == 0 || base >= BASE_COLORS.len() {
        return [0, 0, 0, 0];
    }
    let rgb = BASE_COLORS[base];
    let shade = SHADES[usize::from(index % 4)];
    let channel = |shift: u32| (((rgb >> shift) & 0xFF) * shade / 255) as u8;
    [channel(16), channel(8), channel(0), 0xFF]
}

/// Nearest Java palette index for RGBA pixels. Translucent pixels are transparent.
#[derive(Default)]
pub struct ColorMatcher {
    cache: FnvHashMap<[u8; 4], u8>,
}

impl ColorMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nearest(&mut self, rgba: [u8; 4]) -> u8 {
        if rgba[3] < 128 {
            return 0;
        }
        *self.cache.entry(rgba).or_insert_with(|| {
            let distance = |index: u8| {
                let c = java_color_rgba(index);
                (0..3)
                    .map(|i| {
                        let d = i32::from(c[i]) - i32::from(rgba[i]);
                        d * d
                    })
                    .sum::<i32>()
            };
            (4..(BASE_COLORS.len() * 4) as u8)
                .min_by_key(|&i| distance(i))
                .unwrap_or(0)
        })
    }
}

/// One map in edition-neutral form.
#[derive(Debug, Clone, PartialEq)]
pub struct MapData {
    /// Id in the source world.
    pub id: i64,
    pub scale: i8,
    pub dimension: Dimension,
    pub x_center: i32,
    pub z_center: i32,
    pub locked: bool,
    pub unlimited_tracking: bool,
    pub tracking_position: bool,
    /// Java palette indices, row-major.
    pub colors: Vec<u8>,
}

impl MapData {
    /// Id the map gets in the target world. Items are re-pointed the same way.
    pub fn target_id(&self) -> i64 {
        i64::from(java_map_id(self.id))
    }

    /// Reads a Java `data/map_<id>.dat` root compound.
    pub fn from_java(id: i64, root: &Compound) -> Option<Self> {
        let data = root.get_compound("data")?;
        let dimension = match data.get("dimension")? {
            Value::String(name) => Dimension::from_java_name(name)?,
            // 1.15 and older numbered the dimension.
            other => match crate::nbt_utils::value_as_i64(other)? {
                -1 => Dimension::Nether,
                1 => Dimension::End,
                _ => Dimension::Overworld,
            },
        };
        let mut colors: Vec<u8> = data
            .get_byte_array("colors")
            .map(|c| c.iter().map(|&b| b as u8).collect())
            .unwrap_or_default();
        colors.resize(PIXELS, 0);
        Some(Self {
            id,
            scale: data.get_i8("scale").unwrap_or(0),
            dimension,
            x_center: data.get_i32("xCenter").unwrap_or(0),
            z_center: data.get_i32("zCenter").unwrap_or(0),
            locked: data.get_bool("locked").unwrap_or(false),
            unlimited_tracking: data.get_bool("unlimitedTracking").unwrap_or(false),
            tracking_position: data.get_bool("trackingPosition").unwrap_or(true),
            colors,
        })
    }

    pub fn to_java(&self, data_version: i32) -> Compound {
        let colors = self.colors.iter().map(|&b| b as i8).collect();
        CompoundBuilder::new()
            .int("DataVersion", data_version)
            .compound(
                "data",
                CompoundBuilder::new()
                    .byte("scale", self.scale)
                    .string("dimension", self.dimension.java_name())
                    .int("xCenter", self.x_center)
                    .int("zCenter", self.z_center)
                    .flag("locked", self.locked)
                    .flag("unlimitedTracking", self.unlimited_tracking)
                    .flag("trackingPosition", self.tracking_position)
                    .byte_array("colors", colors)
                    .list("banners", Vec::new())
                    .list("frames", Vec::new())
                    .build(),
            )
            .build()
    }

    /// Reads a Bedrock `map_<id>` record.
    pub fn from_bedrock(tag: &Compound, matcher: &mut ColorMatcher) -> Option<Self> {
        let id = tag.get_i64("mapId")?;
        let rgba = tag.get_byte_array("colors").unwrap_or(&[]);
        let mut colors = vec![0u8; PIXELS];
        for (out, px) in colors.iter_mut().zip(rgba.chunks_exact(4)) {
            *out = matcher.nearest([px[0] as u8, px[1] as u8, px[2] as u8, px[3] as u8]);
        }
        Some(Self {
            id,
            scale: tag.get_i8("scale").unwrap_or(0),
            dimension: tag
                .get_i32("dimension")
                .and_then(Dimension::from_bedrock_id)
                .unwrap_or(Dimension::Overworld),
            x_center: tag.get_i32("xCenter").unwrap_or(0),
            z_center: tag.get_i32("zCenter").unwrap_or(0),
            locked: tag.get_bool("mapLocked").unwrap_or(false),
            unlimited_tracking: tag.get_bool("unlimitedTracking").unwrap_or(false),
            tracking_position: true,
            colors,
        })
    }

    pub fn to_bedrock(&self) -> Compound {
        let rgba: Vec<i8> = self
            .colors
            .iter()
            .flat_map(|&c| java_color_rgba(c))
            .map(|b| b as i8)
            .collect();
        CompoundBuilder::new()
            .long("mapId", self.target_id())
            .long("parentMapId", -1)
            .byte("dimension", self.dimension.bedrock_id() as i8)
            .flag("fullyExplored", true)
            .flag("mapLocked", self.locked)
            .byte("scale", self.scale)
            .short("height", MAP_SIZE as i16)
            .short("width", MAP_SIZE as i16)
            .flag("unlimitedTracking", self.unlimited_tracking)
            .int("xCenter", self.x_center)
            .int("zCenter", self.z_center)
            .value("colors", Value::ByteArray(ByteArray::new(rgba)))
            .list("decorations", Vec::new())
            .build()
    }
}

/// Whether `seen` (an id found on an item, in either edition's numbering)
/// refers to one of `maps`.
pub fn is_resolved(seen: i64, maps: &[MapData]) -> bool {
    maps.iter().any(|m| m.id == seen || m.target_id() == seen)
}
