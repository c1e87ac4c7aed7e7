//! Block-entity conversion.
//!
//! Block entities live in memory in their Java form; the Bedrock reader and
//! writer call through a [`BlockEntityConverter`] at the edges. The vanilla
//! converter knows the containers, signs, command blocks, beds, beacons and
//! banners, and renames everything else while copying its fields over.

use super::inventory::{items_to_bedrock, items_to_java, SlotLayout};
use crate::block_definitions::BlockState;
use crate::coords::{BlockPos, Direction, Edition};
use crate::nbt_utils::{as_compound, Compound, CompoundBuilder, CompoundExt};
use crate::stats::{anomaly, ChunkLog};
use crate::translation::bedrock_block_map::COLORS;
use crate::translation::{commands, identifiers, items};
use fastnbt::Value;

/// Conversion hook for block entities.
pub trait BlockEntityConverter: Send + Sync {
    /// `block` is the canonical block at the block entity's position.
    fn to_bedrock(&self, java: &Compound, block: &BlockState, log: &mut ChunkLog<'_>)
        -> Option<Compound>;

    /// `block` is the already translated canonical block at that position.
    fn to_java(&self, bedrock: &Compound, block: &BlockState, log: &mut ChunkLog<'_>)
        -> Option<Compound>;
}

/// Converter for vanilla block entities.
#[derive(Debug, Default, Clone, Copy)]
pub struct VanillaBlockEntities;

/// Keys handled by the common header and never copied verbatim.
const HEADER_KEYS: [&str; 8] = ["id", "x", "y", "z", "keepPacked", "isMovable", "CustomName", "components"];

pub fn position(tag: &Compound) -> Option<BlockPos> {
    Some(BlockPos::new(tag.get_i32("x")?, tag.get_i32("y")?, tag.get_i32("z")?))
}

fn short(id: &str) -> &str {
    id.strip_prefix("minecraft:").unwrap_or(id)
}

fn owner(id: &str, pos: BlockPos) -> String {
    format!("{} at {} {} {}", short(id), pos.x, pos.y, pos.z)
}

fn container_capacity(id: &str) -> Option<i8> {
    Some(match id {
        "chest" | "trapped_chest" | "barrel" | "shulker_box" => 27,
        "hopper" | "brewing_stand" => 5,
        "dispenser" | "dropper" => 9,
        "furnace" | "blast_furnace" | "smoker" => 3,
        _ => return None,
    })
}

// Java brewing stand: bottles 0..=2, ingredient 3, fuel 4.
// Bedrock brewing stand: ingredient 0, bottles 1..=3, fuel 4.
fn brewing_slot_to_bedrock(slot: i8) -> Option<i8> {
    match slot {
        0..=2 => Some(slot + 1),
        3 => Some(0),
        4 => Some(4),
        _ => None,
    }
}

fn brewing_slot_to_java(slot: i8) -> Option<i8> {
    match slot {
        1..=3 => Some(slot - 1),
        0 => Some(3),
        4 => Some(4),
        _ => None,
    }
}

fn layout(id: &str, to_bedrock: bool) -> SlotLayout {
    let capacity = container_capacity(id).unwrap_or(i8::MAX);
    if id == "brewing_stand" {
        SlotLayout {
            capacity: Some(capacity),
            remap: if to_bedrock {
                brewing_slot_to_bedrock
            } else {
                brewing_slot_to_java
            },
        }
    } else {
        SlotLayout::fixed(capacity)
    }
}

/// Dye index (`0` white to `15` black) of a colour-prefixed block name.
fn dye_index(block_name: &str) -> Option<usize> {
    COLORS
        .iter()
        .enumerate()
        .filter(|(_, color)| block_name.starts_with(&format!("{color}_")))
        .max_by_key(|(_, color)| color.len())
        .map(|(i, _)| i)
}

/// RGB text colour of each dye, in `COLORS` order.
const SIGN_COLORS: [u32; 16] = [
    0xFFFFFF, 0xFF681F, 0xFF00FF, 0x9AC0CD, 0xFFFF00, 0xBFFF00, 0xFF69B4, 0x808080, 0xD3D3D3,
    0x00FFFF, 0xA020F0, 0x0000FF, 0x8B4513, 0x00FF00, 0xFF0000, 0x000000,
];

fn sign_color_to_bedrock(color: &str) -> i32 {
    let rgb = COLORS
        .iter()
        .position(|c| *c == color)
        .map_or(0, |i| SIGN_COLORS[i]);
    (0xFF00_0000 | rgb) as i32
}

fn sign_color_to_java(argb: i32) -> &'static str {
    let rgb = argb as u32 & 0x00FF_FFFF;
    SIGN_COLORS
        .iter()
        .position(|c| *c == rgb)
        .map_or("black", |i| COLORS[i])
}

const BANNER_PATTERNS: [(&str, &str); 42] = [
    ("square_bottom_left", "bl"),
    ("square_bottom_right", "br"),
    ("square_top_left", "tl"),
    ("square_top_right", "tr"),
    ("stripe_bottom", "bs"),
    ("stripe_top", "ts"),
    ("stripe_left", "ls"),
    ("stripe_right", "rs"),
    ("stripe_center", "cs"),
    ("stripe_middle", "ms"),
    ("stripe_downright", "drs"),
    ("stripe_downleft", "dls"),
    ("small_stripes", "ss"),
    ("cross", "cr"),
    ("straight_cross", "sc"),
    ("triangle_bottom", "bt"),
    ("triangle_top", "tt"),
    ("triangles_bottom", "bts"),
    ("triangles_top", "tts"),
    ("diagonal_left", "ld"),
    ("diagonal_up_right", "rd"),
    ("diagonal_up_left", "lud"),
    ("diagonal_right", "rud"),
    ("circle", "mc"),
    ("rhombus", "mr"),
    ("half_vertical", "vh"),
    ("half_horizontal", "hh"),
    ("half_vertical_right", "vhr"),
    ("half_horizontal_bottom", "hhb"),
    ("border", "bo"),
    ("curly_border", "cbo"),
    ("gradient", "gra"),
    ("gradient_up", "gru"),
    ("bricks", "bri"),
    ("globe", "glb"),
    ("creeper", "cre"),
    ("skull", "sku"),
    ("flower", "flo"),
    ("mojang", "moj"),
    ("piglin", "pig"),
    ("flow", "flw"),
    ("guster", "gus"),
];

const BEACON_EFFECTS: [(&str, i32); 6] = [
    ("speed", 1),
    ("haste", 3),
    ("strength", 5),
    ("jump_boost", 8),
    ("regeneration", 10),
    ("resistance", 11),
];

/// Colour of a Bedrock bed, from its block entity.
pub fn bed_color(bedrock: &Compound) -> Option<&'static str> {
    let index = usize::try_from(bedrock.get_i8("color")?).ok()?;
    COLORS.get(index).copied()
}

/// Base colour of a Bedrock banner. Bedrock numbers banner colours in reverse.
pub fn banner_color(bedrock: &Compound) -> Option<&'static str> {
    let base = bedrock.get_i32("Base")?;
    let index = usize::try_from(15 - base).ok()?;
    COLORS.get(index).copied()
}

/// Java chest `type` of a paired Bedrock chest, given the chest's `facing`.
pub fn chest_type(bedrock: &Compound, facing: &str) -> Option<&'static str> {
    let pos = position(bedrock)?;
    let dx = bedrock.get_i32("pairx")? - pos.x;
    let dz = bedrock.get_i32("pairz")? - pos.z;
    let facing = Direction::from_name(facing)?;
    let left = clockwise(facing)?;
    let (lx, _, lz) = left.delta();
    let (rx, _, rz) = left.opposite().delta();
    if (dx, dz) == (lx, lz) {
        Some("left")
    } else if (dx, dz) == (rx, rz) {
        Some("right")
    } else {
        None
    }
}

fn clockwise(direction: Direction) -> Option<Direction> {
    Some(match direction {
        Direction::North => Direction::East,
        Direction::East => Direction::South,
        Direction::South => Direction::West,
        Direction::West => Direction::North,
        _ => return None,
    })
}

impl VanillaBlockEntities {
    fn copy_rest(from: &Compound, mut out: CompoundBuilder, skip: &[&str]) -> CompoundBuilder {
        for (key, value) in from {
            if !HEADER_KEYS.contains(&key.as_str()) && !skip.contains(&key.as_str()) {
                out = out.value(key, value.clone());
            }
        }
        out
    }

    fn container_to_bedrock(
        id: &str,
        pos: BlockPos,
        java: &Compound,
        block: &BlockState,
        mut out: CompoundBuilder,
        log: &mut ChunkLog<'_>,
    ) -> CompoundBuilder {
        let items = java.get_list("Items").map(Vec::as_slice).unwrap_or(&[]);
        let converted = items_to_bedrock(items, layout(id, true), &owner(id, pos), log);
        out = out.list("Items", converted).flag("Findable", false);

        match id {
            "chest" | "trapped_chest" => {
                let partner = match (block.property("type"), block.property("facing")) {
                    (Some(kind @ ("left" | "right")), Some(facing)) => {
                        Direction::from_name(facing)
                            .and_then(clockwise)
                            .map(|left| if kind == "left" { left } else { left.opposite() })
                            .map(|dir| (kind, pos.step(dir)))
                    }
                    _ => None,
                };
                if let Some((kind, partner)) = partner {
                    out = out
                        .int("pairx", partner.x)
                        .int("pairz", partner.z)
                        .flag("pairlead", kind == "left");
                }
            }
            "furnace" | "blast_furnace" | "smoker" => {
                let burn = java.get_i16("BurnTime").unwrap_or(0);
                out = out
                    .short("BurnTime", burn)
                    .short("CookTime", java.get_i16("CookTime").unwrap_or(0))
                    .short("BurnDuration", burn);
            }
            "brewing_stand" => {
                out = out
                    .short("CookTime", java.get_i16("BrewTime").unwrap_or(0))
                    .short("FuelAmount", i16::from(java.get_i8("Fuel").unwrap_or(0)))
                    .short("FuelTotal", 20);
            }
            _ => {}
        }
        out
    }

    fn container_to_java(
        id: &str,
        pos: BlockPos,
        bedrock: &Compound,
        mut out: CompoundBuilder,
        log: &mut ChunkLog<'_>,
    ) -> CompoundBuilder {
        let items = bedrock.get_list("Items").map(Vec::as_slice).unwrap_or(&[]);
        let converted = items_to_java(items, layout(id, false), &owner(id, pos), log);
        out = out.list("Items", converted);
        match id {
            "furnace" | "blast_furnace" | "smoker" => {
                let burn = bedrock.get_i16("BurnTime").unwrap_or(0);
                out = out
                    .short("BurnTime", burn)
                    .short("CookTime", bedrock.get_i16("CookTime").unwrap_or(0))
                    .short("CookTimeTotal", 200);
            }
            "brewing_stand" => {
                let fuel = bedrock.get_i16("FuelAmount").unwrap_or(0).clamp(0, 127) as i8;
                out = out
                    .short("BrewTime", bedrock.get_i16("CookTime").unwrap_or(0))
                    .byte("Fuel", fuel);
            }
            _ => {}
        }
        out
    }

    fn sign_side_to_bedrock(side: Option<&Compound>) -> Compound {
        let lines: Vec<String> = side
            .and_then(|s| s.get_list("messages"))
            .map(|messages| {
                messages
                    .iter()
                    .map(|m| match m {
                        Value::String(s) => items::plain_text(s),
                        _ => String::new(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let color = side.and_then(|s| s.get_str("color")).unwrap_or("black");
        let glowing = side
            .and_then(|s| s.get_bool("has_glowing_text"))
            .unwrap_or(false);
        CompoundBuilder::new()
            .string("Text", lines.join("\n"))
            .int("SignTextColor", sign_color_to_bedrock(color))
            .flag("IgnoreLighting", glowing)
            .flag("HideGlowOutline", false)
            .flag("PersistFormatting", true)
            .string("TextOwner", "")
            .build()
    }

    fn sign_side_to_java(side: Option<&Compound>) -> Compound {
        let text = side.and_then(|s| s.get_str("Text")).unwrap_or("");
        let mut lines: Vec<Value> = text
            .split('\n')
            .take(4)
            .map(|line| Value::String(items::json_text(line)))
            .collect();
        while lines.len() < 4 {
            lines.push(Value::String(items::json_text("")));
        }
        let color = side
            .and_then(|s| s.get_i32("SignTextColor"))
            .map_or("black", sign_color_to_java);
        CompoundBuilder::new()
            .list("messages", lines)
            .string("color", color)
            .flag(
                "has_glowing_text",
                side.and_then(|s| s.get_bool("IgnoreLighting")).unwrap_or(false),
            )
            .build()
    }

    /// Java 1.20+ keeps `front_text`/`back_text`; older signs keep `Text1`..`Text4`.
    fn legacy_front_text(java: &Compound) -> Option<Compound> {
        if !java.contains_key("Text1") {
            return None;
        }
        let lines = (1..=4)
            .map(|i| {
                Value::String(
                    java.get_str(&format!("Text{i}"))
                        .map(str::to_string)
                        .unwrap_or_else(|| items::json_text("")),
                )
            })
            .collect();
        Some(
            CompoundBuilder::new()
                .list("messages", lines)
                .string("color", java.get_str("Color").unwrap_or("black"))
                .flag("has_glowing_text", java.get_bool("GlowingText").unwrap_or(false))
                .build(),
        )
    }

    fn command_to_bedrock(java: &Compound, block: &BlockState, out: CompoundBuilder) -> CompoundBuilder {
        let command = commands::transpile(
            java.get_str("Command").unwrap_or(""),
            Edition::Java,
            Edition::Bedrock,
        );
        let mode = match block.short_name() {
            "repeating_command_block" => 1,
            "chain_command_block" => 2,
            _ => 0,
        };
        let auto = java.get_bool("auto").unwrap_or(false);
        out.string("Command", command)
            .string("LastOutput", java.get_str("LastOutput").map(items::plain_text).unwrap_or_default())
            .flag("TrackOutput", java.get_bool("TrackOutput").unwrap_or(true))
            .int("SuccessCount", java.get_i32("SuccessCount").unwrap_or(0))
            .flag("auto", auto)
            .flag("powered", java.get_bool("powered").unwrap_or(false))
            .flag("conditionMet", java.get_bool("conditionMet").unwrap_or(false))
            .int("LPCommandMode", mode)
            .flag("LPConditionalMode", block.bool_property("conditional").unwrap_or(false))
            .flag("LPRedstoneMode", !auto)
            .flag("ExecuteOnFirstTick", true)
            .int("TickDelay", 0)
            .int("Version", 36)
    }

    fn command_to_java(bedrock: &Compound, out: CompoundBuilder) -> CompoundBuilder {
        let command = commands::transpile(
            bedrock.get_str("Command").unwrap_or(""),
            Edition::Bedrock,
            Edition::Java,
        );
        let mut out = out
            .string("Command", command)
            .flag("TrackOutput", bedrock.get_bool("TrackOutput").unwrap_or(true))
            .int("SuccessCount", bedrock.get_i32("SuccessCount").unwrap_or(0))
            .flag("auto", bedrock.get_bool("auto").unwrap_or(false))
            .flag("powered", bedrock.get_bool("powered").unwrap_or(false))
            .flag("conditionMet", bedrock.get_bool("conditionMet").unwrap_or(false))
            .flag("UpdateLastExecution", true);
        if let Some(last) = bedrock.get_str("LastOutput").filter(|s| !s.is_empty()) {
            out = out.string("LastOutput", items::json_text(last));
        }
        out
    }

    fn beacon_effect_to_bedrock(java: &Compound, key: &str, legacy: &str) -> i32 {
        if let Some(name) = java.get_str(key) {
            return BEACON_EFFECTS
                .iter()
                .find(|(n, _)| *n == short(name))
                .map_or(0, |(_, id)| *id);
        }
        java.get_i32(legacy).unwrap_or(0)
    }

    fn beacon_effect_to_java(bedrock: &Compound, key: &str) -> Option<String> {
        let id = bedrock.get_i32(key)?;
        BEACON_EFFECTS
            .iter()
            .find(|(_, effect)| *effect == id)
            .map(|(name, _)| format!("minecraft:{name}"))
    }

    fn banner_patterns_to_bedrock(java: &Compound) -> Vec<Value> {
        if let Some(patterns) = java.get_list("patterns") {
            return patterns
                .iter()
                .filter_map(as_compound)
                .filter_map(|p| {
                    let name = short(p.get_str("pattern")?);
                    let code = BANNER_PATTERNS.iter().find(|(n, _)| *n == name)?.1;
                    let color = COLORS.iter().position(|c| Some(*c) == p.get_str("color"))?;
                    Some(
                        CompoundBuilder::new()
                            .string("Pattern", code)
                            .int("Color", 15 - color as i32)
                            .into_value(),
                    )
                })
                .collect();
        }
        // Pre-1.20.5 layout already uses the short codes, with Java dye numbering.
        java.get_list("Patterns")
            .map(|patterns| {
                patterns
                    .iter()
                    .filter_map(as_compound)
                    .filter_map(|p| {
                        Some(
                            CompoundBuilder::new()
                                .string("Pattern", p.get_str("Pattern")?)
                                .int("Color", 15 - p.get_i32("Color")?)
                                .into_value(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn banner_patterns_to_java(bedrock: &Compound) -> Vec<Value> {
        bedrock
            .get_list("Patterns")
            .map(|patterns| {
                patterns
                    .iter()
                    .filter_map(as_compound)
                    .filter_map(|p| {
                        let code = p.get_str("Pattern")?;
                        let name = BANNER_PATTERNS.iter().find(|(_, c)| *c == code)?.0;
                        let color = usize::try_from(15 - p.get_i32("Color")?).ok()?;
                        Some(
                            CompoundBuilder::new()
                                .string("pattern", format!("minecraft:{name}"))
                                .string("color", *COLORS.get(color)?)
                                .into_value(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl BlockEntityConverter for VanillaBlockEntities {
    fn to_bedrock(
        &self,
        java: &Compound,
        block: &BlockState,
        log: &mut ChunkLog<'_>,
    ) -> Option<Compound> {
        let (Some(java_id), Some(pos)) = (java.get_str("id"), position(java)) else {
            log.count(anomaly::MALFORMED_BLOCK_ENTITIES);
            return None;
        };
        let id = short(java_id);
        let bedrock_id = identifiers::block_entity_to_bedrock(java_id);
        if !bedrock_id.known {
            log.count(anomaly::UNKNOWN_BLOCK_ENTITIES);
        }

        let mut out = CompoundBuilder::new()
            .string("id", bedrock_id.value)
            .int("x", pos.x)
            .int("y", pos.y)
            .int("z", pos.z)
            .flag("isMovable", true);
        if let Some(name) = java.get_str("CustomName") {
            out = out.string("CustomName", items::plain_text(name));
        }

        let out = if container_capacity(id).is_some() {
            Self::container_to_bedrock(id, pos, java, block, out, log)
        } else {
            match id {
                "sign" | "hanging_sign" => {
                    let front = Self::legacy_front_text(java);
                    let front = front.as_ref().or_else(|| java.get_compound("front_text"));
                    out.compound("FrontText", Self::sign_side_to_bedrock(front))
                        .compound(
                            "BackText",
                            Self::sign_side_to_bedrock(java.get_compound("back_text")),
                        )
                        .flag("IsWaxed", java.get_bool("is_waxed").unwrap_or(false))
                }
                "command_block" => Self::command_to_bedrock(java, block, out),
                "bed" => {
                    let color = dye_index(block.short_name()).unwrap_or(14);
                    out.byte("color", color as i8)
                }
                "beacon" => out
                    .int("primary", Self::beacon_effect_to_bedrock(java, "primary_effect", "Primary"))
                    .int(
                        "secondary",
                        Self::beacon_effect_to_bedrock(java, "secondary_effect", "Secondary"),
                    ),
                "banner" => {
                    let base = dye_index(block.short_name()).unwrap_or(0);
                    out.int("Base", 15 - base as i32)
                        .int("Type", 0)
                        .list("Patterns", Self::banner_patterns_to_bedrock(java))
                }
                _ => Self::copy_rest(java, out, &[]),
            }
        };
        Some(out.build())
    }

    fn to_java(
        &self,
        bedrock: &Compound,
        block: &BlockState,
        log: &mut ChunkLog<'_>,
    ) -> Option<Compound> {
        let (Some(bedrock_id), Some(pos)) = (bedrock.get_str("id"), position(bedrock)) else {
            log.count(anomaly::MALFORMED_BLOCK_ENTITIES);
            return None;
        };
        let java_id = identifiers::block_entity_to_java(bedrock_id);
        if !java_id.known {
            log.count(anomaly::UNKNOWN_BLOCK_ENTITIES);
        }
        // Bedrock has one chest id; Java tells trapped chests apart.
        let java_id = if java_id.value == "minecraft:chest" && block.is("trapped_chest") {
            "minecraft:trapped_chest".to_string()
        } else {
            java_id.value
        };
        let id = short(&java_id).to_string();

        let mut out = CompoundBuilder::new()
            .string("id", java_id.clone())
            .int("x", pos.x)
            .int("y", pos.y)
            .int("z", pos.z)
            .flag("keepPacked", false);
        if let Some(name) = bedrock.get_str("CustomName") {
            out = out.string("CustomName", items::json_text(name));
        }

        let out = if container_capacity(&id).is_some() {
            Self::container_to_java(&id, pos, bedrock, out, log)
        } else {
            match id.as_str() {
                "sign" | "hanging_sign" => out
                    .compound("front_text", Self::sign_side_to_java(bedrock.get_compound("FrontText")))
                    .compound("back_text", Self::sign_side_to_java(bedrock.get_compound("BackText")))
                    .flag("is_waxed", bedrock.get_bool("IsWaxed").unwrap_or(false)),
                "command_block" => Self::command_to_java(bedrock, out),
                // The colour moves onto the block; the Java bed entity has no fields.
                "bed" => out,
                "beacon" => {
                    let mut out = out.int("Levels", 0);
                    if let Some(primary) = Self::beacon_effect_to_java(bedrock, "primary") {
                        out = out.string("primary_effect", primary);
                    }
                    if let Some(secondary) = Self::beacon_effect_to_java(bedrock, "secondary") {
                        out = out.string("secondary_effect", secondary);
                    }
                    out
                }
                "banner" => out.list("patterns", Self::banner_patterns_to_java(bedrock)),
                _ => Self::copy_rest(bedrock, out, &[]),
            }
        };
        Some(out.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{ChunkPos, Dimension};
    use crate::stats::Statistics;
    use std::collections::BTreeSet;

    struct Harness {
        stats: Statistics,
        maps: BTreeSet<i64>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                stats: Statistics::new(),
                maps: BTreeSet::new(),
            }
        }

        fn log(&mut self) -> ChunkLog<'_> {
            ChunkLog::new(Dimension::Overworld, ChunkPos::new(0, 0), &mut self.stats, &mut self.maps)
        }
    }

    fn header(id: &str) -> CompoundBuilder {
        CompoundBuilder::new().string("id", id).int("x", 1).int("y", 64).int("z", 2)
    }

    fn stack(id: &str, slot: i8) -> Value {
        CompoundBuilder::new()
            .string("id", id)
            .int("count", 1)
            .byte("Slot", slot)
            .into_value()
    }

    #[test]
    fn test_brewing_stand_slots_are_remapped_both_ways() {
        let mut h = Harness::new();
        let java = header("minecraft:brewing_stand")
            .list(
                "Items",
                vec![stack("minecraft:potion", 0), stack("minecraft:nether_wart", 3), stack("minecraft:blaze_powder", 4)],
            )
            .short("BrewTime", 40)
            .byte("Fuel", 10)
            .build();
        let stand = BlockState::new("brewing_stand");
        let bedrock = VanillaBlockEntities.to_bedrock(&java, &stand, &mut h.log()).unwrap();
        assert_eq!(bedrock.get_str("id"), Some("BrewingStand"));
        let slots: Vec<(String, i8)> = bedrock
            .get_list("Items")
            .unwrap()
            .iter()
            .filter_map(as_compound)
            .map(|i| (i.get_str("Name").unwrap().to_string(), i.get_i8("Slot").unwrap()))
            .collect();
        assert!(slots.contains(&("minecraft:potion".to_string(), 1)));
        assert!(slots.contains(&("minecraft:nether_wart".to_string(), 0)));
        assert!(slots.contains(&("minecraft:blaze_powder".to_string(), 4)));
        assert_eq!(bedrock.get_i16("FuelAmount"), Some(10));

        let back = VanillaBlockEntities.to_java(&bedrock, &stand, &mut h.log()).unwrap();
        let wart = back
            .get_list("Items")
            .unwrap()
            .iter()
            .filter_map(as_compound)
            .find(|i| i.get_str("id") == Some("minecraft:nether_wart"))
            .unwrap();
        assert_eq!(wart.get_i8("Slot"), Some(3));
        assert_eq!(h.stats.anomaly(anomaly::CONTAINER_OVERFLOW), 0);
    }

    #[test]
    fn test_hopper_overflow_is_recorded() {
        let mut h = Harness::new();
        let java = header("minecraft:hopper")
            .list("Items", vec![stack("minecraft:stone", 1), stack("minecraft:stone", 9)])
            .build();
        let bedrock = VanillaBlockEntities
            .to_bedrock(&java, &BlockState::new("hopper"), &mut h.log())
            .unwrap();
        assert_eq!(bedrock.get_list("Items").unwrap().len(), 1);
        assert_eq!(h.stats.anomaly(anomaly::CONTAINER_OVERFLOW), 1);
        assert_eq!(h.stats.errors.len(), 1);
    }

    #[test]
    fn test_sign_text_round_trip() {
        let mut h = Harness::new();
        let messages = ["Hello", "", "world", ""]
            .iter()
            .map(|line| Value::String(items::json_text(line)))
            .collect();
        let java = header("minecraft:sign")
            .compound(
                "front_text",
                CompoundBuilder::new()
                    .list("messages", messages)
                    .string("color", "red")
                    .flag("has_glowing_text", true)
                    .build(),
            )
            .build();
        let sign = BlockState::new("oak_sign");
        let bedrock = VanillaBlockEntities.to_bedrock(&java, &sign, &mut h.log()).unwrap();
        let front = bedrock.get_compound("FrontText").unwrap();
        assert_eq!(front.get_str("Text"), Some("Hello\n\nworld\n"));
        assert_eq!(front.get_bool("IgnoreLighting"), Some(true));

        let back = VanillaBlockEntities.to_java(&bedrock, &sign, &mut h.log()).unwrap();
        let front = back.get_compound("front_text").unwrap();
        assert_eq!(front.get_str("color"), Some("red"));
        let first = match &front.get_list("messages").unwrap()[0] {
            Value::String(s) => items::plain_text(s),
            _ => String::new(),
        };
        assert_eq!(first, "Hello");
    }

    #[test]
    fn test_command_block_commands_are_transpiled() {
        let mut h = Harness::new();
        let java = header("minecraft:command_block")
            .string("Command", "function demo:tick")
            .flag("auto", true)
            .build();
        let block = BlockState::new("repeating_command_block").with("conditional", "true");
        let bedrock = VanillaBlockEntities.to_bedrock(&java, &block, &mut h.log()).unwrap();
        assert_eq!(bedrock.get_str("Command"), Some("function demo/tick"));
        assert_eq!(bedrock.get_i32("LPCommandMode"), Some(1));
        assert_eq!(bedrock.get_bool("LPConditionalMode"), Some(true));

        let back = VanillaBlockEntities.to_java(&bedrock, &block, &mut h.log()).unwrap();
        assert_eq!(back.get_str("Command"), Some("function demo:tick"));
    }

    #[test]
    fn test_bed_and_banner_colors() {
        let mut h = Harness::new();
        let bed = VanillaBlockEntities
            .to_bedrock(&header("minecraft:bed").build(), &BlockState::new("lime_bed"), &mut h.log())
            .unwrap();
        assert_eq!(bed_color(&bed), Some("lime"));

        let banner = header("minecraft:banner")
            .list(
                "patterns",
                vec![CompoundBuilder::new()
                    .string("pattern", "minecraft:stripe_bottom")
                    .string("color", "black")
                    .into_value()],
            )
            .build();
        let bedrock = VanillaBlockEntities
            .to_bedrock(&banner, &BlockState::new("light_blue_banner"), &mut h.log())
            .unwrap();
        assert_eq!(banner_color(&bedrock), Some("light_blue"));
        let pattern = as_compound(&bedrock.get_list("Patterns").unwrap()[0]).unwrap();
        assert_eq!(pattern.get_str("Pattern"), Some("bs"));
        assert_eq!(pattern.get_i32("Color"), Some(0));
    }

    #[test]
    fn test_double_chest_pairing() {
        let mut h = Harness::new();
        let chest = BlockState::new("chest").with("facing", "north").with("type", "left");
        let bedrock = VanillaBlockEntities
            .to_bedrock(&header("minecraft:chest").build(), &chest, &mut h.log())
            .unwrap();
        assert_eq!(bedrock.get_i32("pairx"), Some(2));
        assert_eq!(bedrock.get_i32("pairz"), Some(2));
        assert_eq!(chest_type(&bedrock, "north"), Some("left"));
    }

    #[test]
    fn test_unknown_and_malformed_block_entities() {
        let mut h = Harness::new();
        let odd = header("minecraft:mystery_box").int("Charge", 3).build();
        let bedrock = VanillaBlockEntities
            .to_bedrock(&odd, &BlockState::new("stone"), &mut h.log())
            .unwrap();
        assert_eq!(bedrock.get_str("id"), Some("MysteryBox"));
        assert_eq!(bedrock.get_i32("Charge"), Some(3));
        assert_eq!(h.stats.anomaly(anomaly::UNKNOWN_BLOCK_ENTITIES), 1);

        let broken = CompoundBuilder::new().string("id", "minecraft:chest").build();
        assert!(VanillaBlockEntities
            .to_bedrock(&broken, &BlockState::new("chest"), &mut h.log())
            .is_none());
        assert_eq!(h.stats.anomaly(anomaly::MALFORMED_BLOCK_ENTITIES), 1);
    }
}
