//! Item identifiers and item stacks.
//!
//! Java 1.20.5+ stacks are `{id, count, components}`; older stacks
//! `{id, Count, tag}` are still accepted on input. Bedrock stacks are
//! `{Name, Count, Damage, WasPickedUp, tag}`.

use super::bimap::BiMap;
use super::Translated;
use crate::nbt_utils::{Compound, CompoundBuilder, CompoundExt};
use fastnbt::Value;
use once_cell::sync::Lazy;
use std::hash::Hasher;

static ITEM_NAMES: Lazy<BiMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map: BiMap<&'static str, &'static str> = [
        ("oak_door", "wooden_door"),
        ("map", "empty_map"),
        ("cobweb", "web"),
        ("lily_pad", "waterlily"),
        ("spawner", "mob_spawner"),
        ("magma_block", "magma"),
        ("terracotta", "hardened_clay"),
        ("slime_block", "slime"),
        ("jack_o_lantern", "lit_pumpkin"),
        ("melon", "melon_block"),
        ("note_block", "noteblock"),
        ("end_stone_bricks", "end_bricks"),
        ("dirt_path", "grass_path"),
        ("bricks", "brick_block"),
        ("nether_bricks", "nether_brick"),
        ("nether_brick", "netherbrick"),
        ("red_nether_bricks", "red_nether_brick"),
        ("snow_block", "snow"),
        ("snow", "snow_layer"),
        ("powered_rail", "golden_rail"),
        ("dead_bush", "deadbush"),
        ("oak_trapdoor", "trapdoor"),
        ("oak_fence_gate", "fence_gate"),
        ("oak_button", "wooden_button"),
        ("oak_pressure_plate", "wooden_pressure_plate"),
        ("stonecutter", "stonecutter_block"),
        ("stone_slab", "normal_stone_slab"),
        ("stone_stairs", "normal_stone_stairs"),
        ("cobblestone_stairs", "stone_stairs"),
        ("end_stone_brick_stairs", "end_brick_stairs"),
        ("prismarine_brick_stairs", "prismarine_bricks_stairs"),
        ("zombified_piglin_spawn_egg", "zombie_pigman_spawn_egg"),
        ("evoker_spawn_egg", "evocation_illager_spawn_egg"),
        ("mooshroom_spawn_egg", "mooshroom_spawn_egg"),
        ("experience_bottle", "experience_bottle"),
        ("firework_rocket", "firework_rocket"),
        ("ender_eye", "ender_eye"),
    ]
    .into_iter()
    .collect();
    map.insert_forward("filled_map", "filled_map");
    map
});

fn strip_namespace(name: &str) -> &str {
    name.strip_prefix("minecraft:").unwrap_or(name)
}

pub fn item_name_to_bedrock(java: &str) -> Translated<String> {
    if !java.starts_with("minecraft:") && java.contains(':') {
        return Translated::unknown("minecraft:air".to_string());
    }
    let short = strip_namespace(java);
    let bedrock = ITEM_NAMES.forward(short).copied().unwrap_or(short);
    Translated::known(format!("minecraft:{bedrock}"))
}

pub fn item_name_to_java(bedrock: &str) -> Translated<String> {
    if !bedrock.starts_with("minecraft:") && bedrock.contains(':') {
        return Translated::unknown("minecraft:air".to_string());
    }
    let short = strip_namespace(bedrock);
    let java = ITEM_NAMES.backward(short).copied().unwrap_or(short);
    Translated::known(format!("minecraft:{java}"))
}

/// Converts a Java item stack. `None` for empty or id-less stacks.
pub fn item_stack_to_bedrock(item: &Compound) -> Option<Translated<Compound>> {
    let id = item.get_str("id")?;
    let name = item_name_to_bedrock(id);
    if name.value == "minecraft:air" {
        return None;
    }
    let count = item
        .get_i32("count")
        .or_else(|| item.get_i32("Count"))
        .unwrap_or(1)
        // Bedrock keeps the count in a signed byte.
        .clamp(1, 127);

    let mut builder = CompoundBuilder::new()
        .string("Name", name.value.clone())
        .byte("Count", count as i8)
        .short("Damage", 0)
        .flag("WasPickedUp", false);
    if let Some(slot) = item.get_i8("Slot") {
        builder = builder.byte("Slot", slot);
    }

    let components = item.get_compound("components");
    let legacy_tag = item.get_compound("tag");
    let damage = components
        .and_then(|c| c.get_i32("minecraft:damage"))
        .or_else(|| legacy_tag.and_then(|t| t.get_i32("Damage")));
    let custom_name = components
        .and_then(|c| c.get_str("minecraft:custom_name"))
        .or_else(|| {
            legacy_tag
                .and_then(|t| t.get_compound("display"))
                .and_then(|d| d.get_str("Name"))
        })
        .map(plain_text);

    let mut tag = CompoundBuilder::new();
    let mut has_tag = false;
    if let Some(map_id) = java_item_map_id(item) {
        tag = tag.long("map_uuid", map_id);
        has_tag = true;
    }
    if let Some(damage) = damage.filter(|d| *d > 0) {
        tag = tag.int("Damage", damage);
        has_tag = true;
    }
    if let Some(custom_name) = custom_name {
        tag = tag.compound(
            "display",
            CompoundBuilder::new().string("Name", custom_name).build(),
        );
        has_tag = true;
    }
    if has_tag {
        builder = builder.compound("tag", tag.build());
    }

    Some(Translated {
        value: builder.build(),
        known: name.known,
    })
}

/// Converts a Bedrock item stack to the Java 1.21 layout.
pub fn item_stack_to_java(item: &Compound) -> Option<Translated<Compound>> {
    let bedrock_name = item.get_str("Name")?;
    if bedrock_name.is_empty() || bedrock_name == "minecraft:air" {
        return None;
    }
    let name = item_name_to_java(bedrock_name);
    if name.value == "minecraft:air" {
        return None;
    }
    let count = i32::from(item.get_i8("Count").unwrap_or(1).max(1));

    let mut builder = CompoundBuilder::new()
        .string("id", name.value.clone())
        .int("count", count);
    if let Some(slot) = item.get_i8("Slot") {
        builder = builder.byte("Slot", slot);
    }

    let mut components = Compound::new();
    if let Some(map_id) = bedrock_item_map_id(item) {
        components.insert("minecraft:map_id".to_string(), Value::Int(java_map_id(map_id)));
    }
    if let Some(tag) = item.get_compound("tag") {
        if let Some(damage) = tag.get_i32("Damage").filter(|d| *d > 0) {
            components.insert("minecraft:damage".to_string(), Value::Int(damage));
        }
        if let Some(custom_name) = tag
            .get_compound("display")
            .and_then(|d| d.get_str("Name"))
        {
            components.insert(
                "minecraft:custom_name".to_string(),
                Value::String(json_text(custom_name)),
            );
        }
    }
    if !components.is_empty() {
        builder = builder.compound("components", components);
    }

    Some(Translated {
        value: builder.build(),
        known: name.known,
    })
}

/// Map id carried by a Java `filled_map` stack.
pub fn java_item_map_id(item: &Compound) -> Option<i64> {
    let components = item.get_compound("components");
    components
        .and_then(|c| c.get_i32("minecraft:map_id"))
        .or_else(|| item.get_compound("tag").and_then(|t| t.get_i32("map")))
        .map(i64::from)
}

/// Map id carried by a Bedrock `filled_map` stack.
pub fn bedrock_item_map_id(item: &Compound) -> Option<i64> {
    item.get_compound("tag")?.get_i64("map_uuid")
}

/// Java map number for a Bedrock map id.
///
/// Ids converted from Java fit in an `i32` and are kept as they are. Native
/// Bedrock ids are folded into the non-negative `i32` range by hashing.
pub fn java_map_id(bedrock: i64) -> i32 {
    if let Ok(id) = i32::try_from(bedrock) {
        if id >= 0 {
            return id;
        }
    }
    let mut hasher = fnv::FnvHasher::default();
    hasher.write(&bedrock.to_le_bytes());
    (hasher.finish() & 0x7fff_ffff) as i32
}

/// Flattens a Java JSON text component into plain text.
///
/// Anything that doesn't parse as JSON is taken to be plain text already.
pub fn plain_text(json: &str) -> String {
    fn collect(value: &serde_json::Value, out: &mut String) {
        match value {
            serde_json::Value::String(s) => out.push_str(s),
            serde_json::Value::Array(parts) => parts.iter().for_each(|p| collect(p, out)),
            serde_json::Value::Object(map) => {
                if let Some(text) = map.get("text") {
                    collect(text, out);
                }
                if let Some(extra) = map.get("extra") {
                    collect(extra, out);
                }
            }
            _ => {}
        }
    }

    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(value) => {
            let mut out = String::new();
            collect(&value, &mut out);
            out
        }
        Err(_) => json.to_string(),
    }
}

/// Wraps plain text as a Java JSON text component.
pub fn json_text(text: &str) -> String {
    serde_json::json!({ "text": text }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_names_round_trip() {
        for (java, bedrock) in ITEM_NAMES.pairs() {
            let forward = item_name_to_bedrock(&format!("minecraft:{java}"));
            assert_eq!(forward.value, format!("minecraft:{bedrock}"));
            assert_eq!(item_name_to_java(&forward.value).value, format!("minecraft:{java}"));
        }
    }

    #[test]
    fn test_modern_java_stack_to_bedrock() {
        let item = CompoundBuilder::new()
            .string("id", "minecraft:diamond_sword")
            .int("count", 1)
            .byte("Slot", 4)
            .compound(
                "components",
                CompoundBuilder::new()
                    .int("minecraft:damage", 12)
                    .string("minecraft:custom_name", r#"{"text":"Edge"}"#)
                    .build(),
            )
            .build();
        let bedrock = item_stack_to_bedrock(&item).unwrap().value;
        assert_eq!(bedrock.get_str("Name"), Some("minecraft:diamond_sword"));
        assert_eq!(bedrock.get_i8("Slot"), Some(4));
        let tag = bedrock.get_compound("tag").unwrap();
        assert_eq!(tag.get_i32("Damage"), Some(12));
        assert_eq!(
            tag.get_compound("display").unwrap().get_str("Name"),
            Some("Edge")
        );

        let back = item_stack_to_java(&bedrock).unwrap().value;
        assert_eq!(back.get_str("id"), Some("minecraft:diamond_sword"));
        let components = back.get_compound("components").unwrap();
        assert_eq!(components.get_i32("minecraft:damage"), Some(12));
    }

    #[test]
    fn test_legacy_stack_and_empty_slots() {
        let item = CompoundBuilder::new()
            .string("id", "minecraft:oak_door")
            .byte("Count", 3)
            .build();
        let bedrock = item_stack_to_bedrock(&item).unwrap().value;
        assert_eq!(bedrock.get_str("Name"), Some("minecraft:wooden_door"));
        assert_eq!(bedrock.get_i8("Count"), Some(3));

        let air = CompoundBuilder::new().string("Name", "").build();
        assert!(item_stack_to_java(&air).is_none());
    }

    #[test]
    fn test_map_ids_follow_filled_maps() {
        let item = CompoundBuilder::new()
            .string("id", "minecraft:filled_map")
            .int("count", 1)
            .compound("components", CompoundBuilder::new().int("minecraft:map_id", 12).build())
            .build();
        assert_eq!(java_item_map_id(&item), Some(12));
        let bedrock = item_stack_to_bedrock(&item).unwrap().value;
        assert_eq!(bedrock_item_map_id(&bedrock), Some(12));
        let back = item_stack_to_java(&bedrock).unwrap().value;
        assert_eq!(java_item_map_id(&back), Some(12));

        let native = -8_589_934_590i64;
        assert!(java_map_id(native) >= 0);
        assert_eq!(java_map_id(native), java_map_id(native));
        assert_eq!(java_map_id(44), 44);
    }

    #[test]
    fn test_plain_text_handles_components_and_raw_text() {
        assert_eq!(plain_text(r#"{"text":"a","extra":[{"text":"b"},"c"]}"#), "abc");
        assert_eq!(plain_text("not json at all"), "not json at all");
        assert_eq!(plain_text(&json_text("Hello")), "Hello");
    }
}
