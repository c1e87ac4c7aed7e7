//! Entity and block-entity identifiers.
//!
//! Entity ids are namespaced in both editions and mostly identical. Block
//! entity ids are namespaced snake case in Java and bare PascalCase in Bedrock.

use super::bimap::BiMap;
use super::Translated;
use once_cell::sync::Lazy;

static ENTITY_NAMES: Lazy<BiMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map: BiMap<&'static str, &'static str> = [
        ("experience_orb", "xp_orb"),
        ("end_crystal", "ender_crystal"),
        ("firework_rocket", "fireworks_rocket"),
        ("fishing_bobber", "fishing_hook"),
        ("zombified_piglin", "zombie_pigman"),
        ("evoker", "evocation_illager"),
        ("eye_of_ender", "eye_of_ender_signal"),
        ("potion", "splash_potion"),
        ("experience_bottle", "xp_bottle"),
        ("mooshroom", "mooshroom"),
        ("snow_golem", "snow_golem"),
        ("leash_knot", "leash_knot"),
        ("item", "item"),
        ("tnt", "tnt"),
        ("falling_block", "falling_block"),
        ("chest_minecart", "chest_minecart"),
        ("tnt_minecart", "tnt_minecart"),
        ("hopper_minecart", "hopper_minecart"),
        ("command_block_minecart", "command_block_minecart"),
        ("wither_skull", "wither_skull"),
        ("dragon_fireball", "dragon_fireball"),
        ("small_fireball", "small_fireball"),
        ("fireball", "fireball"),
        ("item_frame", "item_frame"),
        ("glow_item_frame", "glow_frame"),
        ("painting", "painting"),
    ]
    .into_iter()
    .collect();
    map.insert_forward("lingering_potion", "lingering_potion");
    map.insert_forward("spectral_arrow", "arrow");
    for boat in ["oak_boat", "spruce_boat", "birch_boat", "jungle_boat", "acacia_boat",
        "dark_oak_boat", "mangrove_boat", "cherry_boat", "bamboo_raft"]
    {
        map.insert_forward(boat, "boat");
    }
    for chest_boat in ["oak_chest_boat", "spruce_chest_boat", "birch_chest_boat",
        "jungle_chest_boat", "acacia_chest_boat", "dark_oak_chest_boat",
        "mangrove_chest_boat", "cherry_chest_boat", "bamboo_chest_raft"]
    {
        map.insert_forward(chest_boat, "chest_boat");
    }
    map.insert_backward("boat", "oak_boat");
    map.insert_backward("chest_boat", "oak_chest_boat");
    map
});

/// Entities Bedrock knows under the same name. Anything else still passes
/// through but is flagged unknown.
static SHARED_ENTITIES: &[&str] = &[
    "allay", "armadillo", "armor_stand", "arrow", "axolotl", "bat", "bee", "blaze", "bogged",
    "breeze", "camel", "cat", "cave_spider", "chicken", "cod", "cow", "creeper", "dolphin",
    "donkey", "drowned", "egg", "elder_guardian", "ender_dragon", "ender_pearl", "enderman",
    "endermite", "evocation_fang", "fox", "frog", "ghast", "glow_squid", "goat", "guardian",
    "hoglin", "horse", "husk", "iron_golem", "llama", "llama_spit", "magma_cube", "minecart",
    "mule", "ocelot", "panda", "parrot", "phantom", "pig", "piglin", "piglin_brute", "pillager",
    "player", "polar_bear", "pufferfish", "rabbit", "ravager", "salmon", "sheep", "shulker",
    "shulker_bullet", "silverfish", "skeleton", "skeleton_horse", "slime", "sniffer",
    "snowball", "spider", "squid", "stray", "strider", "tadpole", "trader_llama",
    "tropical_fish", "trident", "turtle", "vex", "villager", "vindicator", "wandering_trader",
    "warden", "witch", "wither", "wither_skeleton", "wolf", "zoglin", "zombie", "zombie_horse",
    "zombie_villager", "lightning_bolt", "creaking",
];

fn strip_namespace(name: &str) -> &str {
    name.strip_prefix("minecraft:").unwrap_or(name)
}

pub fn entity_to_bedrock(java: &str) -> Translated<String> {
    let short = strip_namespace(java);
    if let Some(bedrock) = ENTITY_NAMES.forward(short) {
        return Translated::known(format!("minecraft:{bedrock}"));
    }
    let out = format!("minecraft:{short}");
    if SHARED_ENTITIES.contains(&short) {
        Translated::known(out)
    } else {
        Translated::unknown(out)
    }
}

pub fn entity_to_java(bedrock: &str) -> Translated<String> {
    let short = strip_namespace(bedrock);
    if let Some(java) = ENTITY_NAMES.backward(short) {
        return Translated::known(format!("minecraft:{java}"));
    }
    let out = format!("minecraft:{short}");
    if SHARED_ENTITIES.contains(&short) {
        Translated::known(out)
    } else {
        Translated::unknown(out)
    }
}

static BLOCK_ENTITY_IDS: Lazy<BiMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map: BiMap<&'static str, &'static str> = [
        ("chest", "Chest"),
        ("furnace", "Furnace"),
        ("blast_furnace", "BlastFurnace"),
        ("smoker", "Smoker"),
        ("barrel", "Barrel"),
        ("shulker_box", "ShulkerBox"),
        ("hopper", "Hopper"),
        ("dispenser", "Dispenser"),
        ("dropper", "Dropper"),
        ("brewing_stand", "BrewingStand"),
        ("sign", "Sign"),
        ("hanging_sign", "HangingSign"),
        ("command_block", "CommandBlock"),
        ("bed", "Bed"),
        ("beacon", "Beacon"),
        ("banner", "Banner"),
        ("mob_spawner", "MobSpawner"),
        ("enchanting_table", "EnchantTable"),
        ("end_portal", "EndPortal"),
        ("end_gateway", "EndGateway"),
        ("ender_chest", "EnderChest"),
        ("jukebox", "Jukebox"),
        ("lectern", "Lectern"),
        ("bell", "Bell"),
        ("campfire", "Campfire"),
        ("skull", "Skull"),
        ("flower_pot", "FlowerPot"),
        ("comparator", "Comparator"),
        ("daylight_detector", "DaylightDetector"),
        ("conduit", "Conduit"),
        ("beehive", "Beehive"),
        ("piston", "PistonArm"),
        ("structure_block", "StructureBlock"),
        ("jigsaw", "JigsawBlock"),
        ("chiseled_bookshelf", "ChiseledBookshelf"),
        ("decorated_pot", "DecoratedPot"),
        ("brushable_block", "BrushableBlock"),
        ("sculk_sensor", "SculkSensor"),
        ("sculk_catalyst", "SculkCatalyst"),
        ("sculk_shrieker", "SculkShrieker"),
        ("crafter", "Crafter"),
        ("trial_spawner", "TrialSpawner"),
        ("vault", "Vault"),
    ]
    .into_iter()
    .collect();
    map.insert_forward("trapped_chest", "Chest");
    map.insert_forward("bee_nest", "Beehive");
    map.insert_forward("calibrated_sculk_sensor", "SculkSensor");
    map
});

/// Bedrock block-entity id for a Java id. Unlisted ids are PascalCased.
pub fn block_entity_to_bedrock(java: &str) -> Translated<String> {
    let short = strip_namespace(java);
    match BLOCK_ENTITY_IDS.forward(short) {
        Some(id) => Translated::known((*id).to_string()),
        None => Translated::unknown(pascal_case(short)),
    }
}

/// Java block-entity id for a Bedrock id. Unlisted ids are snake_cased.
pub fn block_entity_to_java(bedrock: &str) -> Translated<String> {
    match BLOCK_ENTITY_IDS.backward(bedrock) {
        Some(id) => Translated::known(format!("minecraft:{id}")),
        None => Translated::unknown(format!("minecraft:{}", snake_case(bedrock))),
    }
}

fn pascal_case(name: &str) -> String {
    name.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_renames_round_trip() {
        for (java, bedrock) in ENTITY_NAMES.pairs() {
            let forward = entity_to_bedrock(&format!("minecraft:{java}"));
            assert_eq!(forward.value, format!("minecraft:{bedrock}"));
            assert_eq!(entity_to_java(&forward.value).value, format!("minecraft:{java}"));
        }
    }

    #[test]
    fn test_boats_collapse() {
        assert_eq!(entity_to_bedrock("minecraft:birch_boat").value, "minecraft:boat");
        assert_eq!(entity_to_java("minecraft:boat").value, "minecraft:oak_boat");
    }

    #[test]
    fn test_block_entity_ids() {
        for (java, bedrock) in BLOCK_ENTITY_IDS.pairs() {
            assert_eq!(block_entity_to_bedrock(java).value, *bedrock);
            assert_eq!(block_entity_to_java(bedrock).value, format!("minecraft:{java}"));
        }
        assert_eq!(block_entity_to_bedrock("minecraft:trapped_chest").value, "Chest");
        let unknown = block_entity_to_bedrock("minecraft:copper_golem_statue");
        assert!(!unknown.known);
        assert_eq!(unknown.value, "CopperGolemStatue");
        assert_eq!(
            block_entity_to_java("CopperGolemStatue").value,
            "minecraft:copper_golem_statue"
        );
    }
}
