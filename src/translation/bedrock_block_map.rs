//! Bedrock Block Mapping
//!
//! Translation between the canonical (Java flattened) block vocabulary and the
//! Bedrock Edition block format. The target is the 1.21 Bedrock palette, where
//! most identifiers already match Java's and the differences are concentrated
//! in state names and a handful of renamed blocks.
//!
//! Name translation and state translation are separate steps: the name is
//! resolved first (rename table plus a few state-dependent names such as
//! double slabs or lit furnaces), then the family converter for the resolved
//! Java name rewrites the properties.

use super::bimap::BiMap;
use super::Translated;
use crate::block_definitions::BlockState;
use crate::coords::Direction;
use crate::nbt_utils::{Compound, CompoundExt};
use fastnbt::Value;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashSet};

/// Block palette version written into every Bedrock palette entry (1.21.40).
pub const BEDROCK_BLOCK_VERSION: i32 = 18_163_712;

/// Represents a Bedrock block with its identifier and state properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BedrockBlock {
    /// The Bedrock block identifier (e.g., "minecraft:stone")
    pub name: String,
    /// Block state properties as key-value pairs
    pub states: BTreeMap<String, BedrockBlockStateValue>,
}

/// Bedrock block state values can be strings, booleans, or integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BedrockBlockStateValue {
    String(String),
    Bool(bool),
    Int(i32),
}

impl BedrockBlock {
    /// Creates a simple block with no state properties.
    pub fn simple(name: &str) -> Self {
        let name = if name.contains(':') {
            name.to_string()
        } else {
            format!("minecraft:{name}")
        };
        Self {
            name,
            states: BTreeMap::new(),
        }
    }

    pub fn air() -> Self {
        Self::simple("air")
    }

    pub fn short_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, n)| n)
            .unwrap_or(&self.name)
    }

    fn set(&mut self, key: &str, value: BedrockBlockStateValue) {
        self.states.insert(key.to_string(), value);
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.set(key, BedrockBlockStateValue::Int(value));
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, BedrockBlockStateValue::Bool(value));
    }

    fn set_str(&mut self, key: &str, value: &str) {
        self.set(key, BedrockBlockStateValue::String(value.to_string()));
    }

    pub fn int(&self, key: &str) -> Option<i32> {
        match self.states.get(key)? {
            BedrockBlockStateValue::Int(v) => Some(*v),
            BedrockBlockStateValue::Bool(b) => Some(i32::from(*b)),
            BedrockBlockStateValue::String(s) => s.parse().ok(),
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.states.get(key)? {
            BedrockBlockStateValue::Bool(b) => Some(*b),
            BedrockBlockStateValue::Int(v) => Some(*v != 0),
            BedrockBlockStateValue::String(s) => Some(s == "true"),
        }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        match self.states.get(key)? {
            BedrockBlockStateValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Palette entry compound (`name`, `states`, `version`).
    pub fn to_palette_entry(&self) -> Compound {
        let states: Compound = self
            .states
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    BedrockBlockStateValue::String(s) => Value::String(s.clone()),
                    BedrockBlockStateValue::Bool(b) => Value::Byte(i8::from(*b)),
                    BedrockBlockStateValue::Int(i) => Value::Int(*i),
                };
                (k.clone(), value)
            })
            .collect();
        let mut entry = Compound::new();
        entry.insert("name".to_string(), Value::String(self.name.clone()));
        entry.insert("states".to_string(), Value::Compound(states));
        entry.insert("version".to_string(), Value::Int(BEDROCK_BLOCK_VERSION));
        entry
    }

    /// Parses a palette entry. Returns `None` when the entry has no name.
    pub fn from_palette_entry(entry: &Compound) -> Option<Self> {
        let name = entry.get_str("name")?;
        let mut block = BedrockBlock::simple(name);
        if let Some(states) = entry.get_compound("states") {
            for (key, value) in states {
                let value = match value {
                    Value::String(s) => BedrockBlockStateValue::String(s.clone()),
                    Value::Byte(b) => BedrockBlockStateValue::Bool(*b != 0),
                    Value::Short(v) => BedrockBlockStateValue::Int(i32::from(*v)),
                    Value::Int(v) => BedrockBlockStateValue::Int(*v),
                    _ => continue,
                };
                block.states.insert(key.clone(), value);
            }
        }
        Some(block)
    }
}

/// Java name <-> Bedrock name for blocks whose identifier differs.
static BLOCK_NAMES: Lazy<BiMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map: BiMap<&'static str, &'static str> = [
        ("snow", "snow_layer"),
        ("snow_block", "snow"),
        ("cobweb", "web"),
        ("lily_pad", "waterlily"),
        ("sugar_cane", "reeds"),
        ("nether_portal", "portal"),
        ("spawner", "mob_spawner"),
        ("magma_block", "magma"),
        ("red_nether_bricks", "red_nether_brick"),
        ("nether_bricks", "nether_brick"),
        ("terracotta", "hardened_clay"),
        ("slime_block", "slime"),
        ("jack_o_lantern", "lit_pumpkin"),
        ("melon", "melon_block"),
        ("note_block", "noteblock"),
        ("end_stone_bricks", "end_bricks"),
        ("dirt_path", "grass_path"),
        ("bricks", "brick_block"),
        ("tripwire", "trip_wire"),
        ("moving_piston", "moving_block"),
        ("powered_rail", "golden_rail"),
        ("beetroots", "beetroot"),
        ("dead_bush", "deadbush"),
        ("stonecutter", "stonecutter_block"),
        ("oak_door", "wooden_door"),
        ("oak_trapdoor", "trapdoor"),
        ("oak_fence_gate", "fence_gate"),
        ("oak_button", "wooden_button"),
        ("oak_pressure_plate", "wooden_pressure_plate"),
        ("oak_sign", "standing_sign"),
        ("oak_wall_sign", "wall_sign"),
        ("spruce_sign", "spruce_standing_sign"),
        ("birch_sign", "birch_standing_sign"),
        ("jungle_sign", "jungle_standing_sign"),
        ("acacia_sign", "acacia_standing_sign"),
        ("dark_oak_sign", "darkoak_standing_sign"),
        ("dark_oak_wall_sign", "darkoak_wall_sign"),
        ("mangrove_sign", "mangrove_standing_sign"),
        ("cherry_sign", "cherry_standing_sign"),
        ("bamboo_sign", "bamboo_standing_sign"),
        ("crimson_sign", "crimson_standing_sign"),
        ("warped_sign", "warped_standing_sign"),
        ("cobblestone_stairs", "stone_stairs"),
        ("stone_stairs", "normal_stone_stairs"),
        ("end_stone_brick_stairs", "end_brick_stairs"),
        ("prismarine_brick_stairs", "prismarine_bricks_stairs"),
        ("stone_slab", "normal_stone_slab"),
        ("repeater", "unpowered_repeater"),
        ("comparator", "unpowered_comparator"),
        ("redstone_torch", "redstone_torch"),
        ("water", "water"),
        ("lava", "lava"),
        ("chain", "chain"),
    ]
    .into_iter()
    .collect();
    map.insert_forward("cave_air", "air");
    map.insert_forward("void_air", "air");
    map.insert_forward("attached_melon_stem", "melon_stem");
    map.insert_forward("attached_pumpkin_stem", "pumpkin_stem");
    map.insert_forward("kelp_plant", "kelp");
    map.insert_forward("weeping_vines_plant", "weeping_vines");
    map.insert_forward("twisting_vines_plant", "twisting_vines");
    map.insert_backward("flowing_water", "water");
    map.insert_backward("flowing_lava", "lava");
    map.insert_backward("unpowered_repeater", "repeater");
    map.insert_backward("powered_repeater", "repeater");
    map.insert_backward("powered_comparator", "comparator");
    map.insert_backward("unlit_redstone_torch", "redstone_torch");
    map.insert_backward("daylight_detector_inverted", "daylight_detector");
    map
});

/// Blocks whose Java `lit=true` state is a separate `lit_` identifier in Bedrock.
const LIT_PREFIX_BLOCKS: &[&str] = &[
    "furnace",
    "blast_furnace",
    "smoker",
    "redstone_lamp",
    "redstone_ore",
    "deepslate_redstone_ore",
];

/// Blocks whose `facing` maps to the numeric six-way `facing_direction`.
/// Other horizontally facing blocks use `minecraft:cardinal_direction`.
fn uses_facing_direction(name: &str) -> bool {
    matches!(
        name,
        "observer"
            | "dispenser"
            | "dropper"
            | "barrel"
            | "end_rod"
            | "lightning_rod"
            | "command_block"
            | "chain_command_block"
            | "repeating_command_block"
            | "ladder"
            | "amethyst_cluster"
    ) || name.ends_with("_glazed_terracotta")
        || name.ends_with("_wall_sign")
        || name.ends_with("amethyst_bud")
}

pub const COLORS: [&str; 16] = [
    "white",
    "orange",
    "magenta",
    "light_blue",
    "yellow",
    "lime",
    "pink",
    "gray",
    "light_gray",
    "cyan",
    "purple",
    "blue",
    "brown",
    "green",
    "red",
    "black",
];

pub const WOODS: [&str; 11] = [
    "oak", "spruce", "birch", "jungle", "acacia", "dark_oak", "mangrove", "cherry", "pale_oak",
    "crimson", "warped",
];

/// Java names that exist unchanged in Bedrock and carry no translated state.
static SHARED_BLOCKS: Lazy<HashSet<String>> = Lazy::new(|| {
    let mut set: HashSet<String> = [
        "air", "stone", "granite", "polished_granite", "diorite", "polished_diorite",
        "andesite", "polished_andesite", "deepslate", "cobbled_deepslate", "tuff", "calcite",
        "dirt", "coarse_dirt", "rooted_dirt", "podzol", "mycelium", "grass_block", "mud",
        "cobblestone", "mossy_cobblestone", "bedrock", "sand", "red_sand", "gravel", "clay",
        "coal_ore", "iron_ore", "gold_ore", "diamond_ore", "emerald_ore", "lapis_ore",
        "copper_ore", "deepslate_coal_ore", "deepslate_iron_ore", "deepslate_gold_ore",
        "deepslate_diamond_ore", "deepslate_emerald_ore", "deepslate_lapis_ore",
        "deepslate_copper_ore", "nether_gold_ore", "nether_quartz_ore", "ancient_debris",
        "coal_block", "iron_block", "gold_block", "diamond_block", "emerald_block",
        "lapis_block", "redstone_block", "copper_block", "netherite_block", "raw_iron_block",
        "raw_gold_block", "raw_copper_block", "glass", "tinted_glass", "glass_pane",
        "iron_bars", "sandstone", "chiseled_sandstone", "cut_sandstone", "smooth_sandstone",
        "red_sandstone", "chiseled_red_sandstone", "cut_red_sandstone", "smooth_red_sandstone",
        "stone_bricks", "mossy_stone_bricks", "cracked_stone_bricks", "chiseled_stone_bricks",
        "smooth_stone", "bookshelf", "chiseled_bookshelf", "obsidian", "crying_obsidian",
        "netherrack", "soul_sand", "soul_soil", "glowstone", "end_stone", "purpur_block",
        "prismarine", "prismarine_bricks", "dark_prismarine", "sea_lantern", "sponge",
        "wet_sponge", "ice", "packed_ice", "blue_ice", "pumpkin", "carved_pumpkin",
        "crafting_table", "cartography_table", "fletching_table", "smithing_table", "loom",
        "enchanting_table", "jukebox", "beacon", "tnt", "short_grass", "tall_grass", "fern",
        "large_fern", "dandelion", "poppy", "blue_orchid", "allium", "azure_bluet",
        "red_tulip", "orange_tulip", "white_tulip", "pink_tulip", "oxeye_daisy", "cornflower",
        "lily_of_the_valley", "sunflower", "lilac", "rose_bush", "peony", "brown_mushroom",
        "red_mushroom", "cactus", "bamboo", "seagrass", "tall_seagrass", "moss_block",
        "moss_carpet", "azalea", "flowering_azalea", "glow_lichen", "sculk", "sculk_vein",
        "sculk_sensor", "sculk_catalyst", "sculk_shrieker", "amethyst_block",
        "budding_amethyst", "dripstone_block", "pointed_dripstone", "honey_block",
        "honeycomb_block", "bee_nest", "beehive", "basalt", "polished_basalt",
        "smooth_basalt", "blackstone", "polished_blackstone", "gilded_blackstone",
        "quartz_block", "quartz_bricks", "quartz_pillar", "chiseled_quartz_block",
        "smooth_quartz", "hay_block", "bone_block", "target", "lodestone", "respawn_anchor",
        "shroomlight", "nether_wart_block", "warped_wart_block", "crimson_nylium",
        "warped_nylium", "crimson_roots", "warped_roots", "nether_sprouts", "weeping_vines",
        "twisting_vines", "kelp", "dried_kelp_block", "sea_pickle", "frogspawn",
        "ochre_froglight", "verdant_froglight", "pearlescent_froglight", "mangrove_roots",
        "muddy_mangrove_roots", "packed_mud", "mud_bricks", "chest", "trapped_chest",
        "ender_chest", "hopper", "dropper", "dispenser", "observer", "piston",
        "sticky_piston", "lever", "redstone_wire", "redstone_lamp", "daylight_detector",
        "rail", "detector_rail", "activator_rail", "tripwire_hook", "target", "bell",
        "lantern", "soul_lantern", "campfire", "soul_campfire", "torch", "soul_torch",
        "end_rod", "lightning_rod", "scaffolding", "ladder", "vine", "chorus_plant",
        "chorus_flower", "end_portal_frame", "end_portal", "end_gateway", "fire",
        "soul_fire", "cake", "farmland", "wheat", "carrots", "potatoes", "melon_stem",
        "pumpkin_stem", "sweet_berry_bush", "nether_wart", "cauldron", "composter",
        "brewing_stand", "anvil", "grindstone", "lectern", "barrel", "smoker",
        "blast_furnace", "furnace", "flower_pot", "decorated_pot", "conduit", "bubble_column",
        "frosted_ice", "powder_snow", "cobblestone_wall", "mossy_cobblestone_wall",
        "stone_brick_wall", "brick_wall", "sandstone_wall", "command_block",
        "chain_command_block", "repeating_command_block", "structure_block", "barrier",
        "light", "dragon_egg", "player_head", "skeleton_skull", "creeper_head",
        "zombie_head", "wither_skeleton_skull", "dragon_head", "piglin_head",
        "amethyst_cluster", "small_amethyst_bud", "medium_amethyst_bud", "large_amethyst_bud",
        "cave_vines", "spore_blossom", "hanging_roots", "big_dripleaf", "small_dripleaf",
        "crafter", "trial_spawner", "vault", "heavy_core",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    for color in COLORS {
        for suffix in [
            "wool",
            "carpet",
            "concrete",
            "concrete_powder",
            "terracotta",
            "glazed_terracotta",
            "stained_glass",
            "stained_glass_pane",
            "shulker_box",
            "candle",
        ] {
            set.insert(format!("{color}_{suffix}"));
        }
    }
    for wood in WOODS {
        for suffix in [
            "planks", "log", "wood", "stripped_log", "stripped_wood", "leaves", "sapling",
            "fence", "fence_gate", "door", "trapdoor", "stairs", "slab", "button",
            "pressure_plate", "wall_sign", "hanging_sign", "wall_hanging_sign",
        ] {
            set.insert(format!("{wood}_{suffix}"));
        }
        set.insert(format!("stripped_{wood}_log"));
        set.insert(format!("stripped_{wood}_wood"));
    }
    for stem in ["crimson", "warped"] {
        for suffix in ["stem", "hyphae"] {
            set.insert(format!("{stem}_{suffix}"));
            set.insert(format!("stripped_{stem}_{suffix}"));
        }
    }
    for base in [
        "stone_brick", "mossy_stone_brick", "sandstone", "red_sandstone", "brick", "nether_brick",
        "red_nether_brick", "quartz", "smooth_quartz", "purpur", "prismarine", "dark_prismarine",
        "granite", "polished_granite", "diorite", "polished_diorite", "andesite",
        "polished_andesite", "cobbled_deepslate", "polished_deepslate", "deepslate_brick",
        "deepslate_tile", "blackstone", "polished_blackstone", "polished_blackstone_brick",
        "mud_brick", "tuff", "polished_tuff", "tuff_brick", "mossy_cobblestone", "cobblestone",
        "smooth_stone", "cut_sandstone", "cut_red_sandstone", "end_stone_brick",
        "smooth_sandstone", "smooth_red_sandstone",
    ] {
        set.insert(format!("{base}_stairs"));
        set.insert(format!("{base}_slab"));
        set.insert(format!("{base}_wall"));
    }
    set
});

pub fn is_known_java_name(name: &str) -> bool {
    SHARED_BLOCKS.contains(name) || BLOCK_NAMES.forward(name).is_some()
        || name.ends_with("_bed")
        || name.ends_with("_sign")
        || name.ends_with("_banner")
        || name == "wall_torch"
        || name.ends_with("_wall_torch")
        || name == "piston_head"
        || name == "kelp_plant"
}

fn is_known_bedrock_name(name: &str) -> bool {
    BLOCK_NAMES.backward(name).is_some()
        || SHARED_BLOCKS.contains(name)
        || name == "bed"
        || name == "standing_banner"
        || name == "wall_banner"
        || name.ends_with("_double_slab")
        || name.ends_with("piston_arm_collision")
        || name == "unlit_redstone_torch"
        || name
            .strip_prefix("lit_")
            .is_some_and(|base| LIT_PREFIX_BLOCKS.contains(&base))
}

// ---------------------------------------------------------------------------
// Direction encodings
// ---------------------------------------------------------------------------

/// `weirdo_direction` of stairs; also the trapdoor `direction`.
fn weirdo_direction(facing: &str) -> i32 {
    match facing {
        "east" => 0,
        "west" => 1,
        "south" => 2,
        _ => 3,
    }
}

fn from_weirdo_direction(value: i32) -> &'static str {
    match value {
        0 => "east",
        1 => "west",
        2 => "south",
        _ => "north",
    }
}

/// Legacy horizontal `direction` (beds, fence gates, tripwire hooks, end portal frames).
fn legacy_direction(facing: &str) -> i32 {
    match facing {
        "south" => 0,
        "west" => 1,
        "north" => 2,
        _ => 3,
    }
}

fn from_legacy_direction(value: i32) -> &'static str {
    match value.rem_euclid(4) {
        0 => "south",
        1 => "west",
        2 => "north",
        _ => "east",
    }
}

/// Door `direction`.
fn door_direction(facing: &str) -> i32 {
    match facing {
        "east" => 0,
        "south" => 1,
        "west" => 2,
        _ => 3,
    }
}

fn from_door_direction(value: i32) -> &'static str {
    match value.rem_euclid(4) {
        0 => "east",
        1 => "south",
        2 => "west",
        _ => "north",
    }
}

fn facing_index(facing: &str) -> i32 {
    Direction::from_name(facing)
        .map(Direction::bedrock_index)
        .unwrap_or(2)
}

fn facing_from_index(index: i32) -> &'static str {
    Direction::from_bedrock_index(index)
        .map(Direction::name)
        .unwrap_or("north")
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

fn bedrock_name_for(block: &BlockState) -> String {
    let name = block.short_name();

    if block.is_slab() && block.property("type") == Some("double") {
        let bedrock_single = BLOCK_NAMES.forward(name).copied().unwrap_or(name);
        let base = bedrock_single.strip_suffix("_slab").unwrap_or(bedrock_single);
        return format!("{base}_double_slab");
    }
    if block.is_bed() {
        return "bed".to_string();
    }
    if name.ends_with("_wall_banner") {
        return "wall_banner".to_string();
    }
    if name.ends_with("_banner") {
        return "standing_banner".to_string();
    }
    if LIT_PREFIX_BLOCKS.contains(&name) && block.bool_property("lit") == Some(true) {
        return format!("lit_{name}");
    }
    match name {
        "piston_head" => {
            return if block.property("type") == Some("sticky") {
                "sticky_piston_arm_collision".to_string()
            } else {
                "piston_arm_collision".to_string()
            };
        }
        "water" | "lava" if block.int_property("level").unwrap_or(0) != 0 => {
            return format!("flowing_{name}");
        }
        "wall_torch" => return "torch".to_string(),
        "soul_wall_torch" => return "soul_torch".to_string(),
        "redstone_torch" | "redstone_wall_torch" => {
            return if block.bool_property("lit") == Some(false) {
                "unlit_redstone_torch".to_string()
            } else {
                "redstone_torch".to_string()
            };
        }
        "repeater" if block.bool_property("powered") == Some(true) => {
            return "powered_repeater".to_string();
        }
        "comparator" if block.bool_property("powered") == Some(true) => {
            return "powered_comparator".to_string();
        }
        "daylight_detector" if block.bool_property("inverted") == Some(true) => {
            return "daylight_detector_inverted".to_string();
        }
        _ => {}
    }
    if let Some(wood_sign) = name.strip_suffix("_wall_hanging_sign") {
        return format!("{wood_sign}_hanging_sign");
    }
    BLOCK_NAMES.forward(name).copied().unwrap_or(name).to_string()
}

/// Java name plus any properties implied by the Bedrock identifier itself.
fn java_name_for(block: &BedrockBlock) -> (String, Vec<(&'static str, String)>) {
    let name = block.short_name();
    let mut implied = Vec::new();

    if let Some(java) = BLOCK_NAMES.backward(name) {
        match name {
            "flowing_water" | "flowing_lava" => {}
            "powered_repeater" | "powered_comparator" => implied.push(("powered", "true".into())),
            "unlit_redstone_torch" => implied.push(("lit", "false".into())),
            "daylight_detector_inverted" => implied.push(("inverted", "true".into())),
            _ => {}
        }
        let java = (*java).to_string();
        return (wall_variant(block, java), implied);
    }
    if let Some(base) = name.strip_suffix("_double_slab") {
        let bedrock_single = format!("{base}_slab");
        let java = BLOCK_NAMES
            .backward(bedrock_single.as_str())
            .map(|s| (*s).to_string())
            .unwrap_or(bedrock_single);
        implied.push(("type", "double".into()));
        return (java, implied);
    }
    if let Some(base) = name.strip_prefix("lit_") {
        if LIT_PREFIX_BLOCKS.contains(&base) {
            implied.push(("lit", "true".into()));
            return (base.to_string(), implied);
        }
    }
    match name {
        "bed" => return ("white_bed".to_string(), implied),
        "standing_banner" => return ("white_banner".to_string(), implied),
        "wall_banner" => return ("white_wall_banner".to_string(), implied),
        "piston_arm_collision" => {
            implied.push(("type", "normal".into()));
            return ("piston_head".to_string(), implied);
        }
        "sticky_piston_arm_collision" => {
            implied.push(("type", "sticky".into()));
            return ("piston_head".to_string(), implied);
        }
        _ => {}
    }
    if LIT_PREFIX_BLOCKS.contains(&name) {
        implied.push(("lit", "false".into()));
    }
    (wall_variant(block, name.to_string()), implied)
}

/// Bedrock keeps one identifier for standing and wall-mounted torches and
/// hanging signs; Java splits them.
fn wall_variant(block: &BedrockBlock, java: String) -> String {
    let on_wall = block
        .str("torch_facing_direction")
        .is_some_and(|d| d != "top" && d != "unknown");
    match java.as_str() {
        "torch" if on_wall => "wall_torch".to_string(),
        "soul_torch" if on_wall => "soul_wall_torch".to_string(),
        "redstone_torch" if on_wall => "redstone_wall_torch".to_string(),
        _ => {
            if let Some(wood) = java.strip_suffix("_hanging_sign") {
                if block.flag("hanging") == Some(false) {
                    return format!("{wood}_wall_hanging_sign");
                }
            }
            java
        }
    }
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

fn states_to_bedrock(block: &BlockState, out: &mut BedrockBlock) {
    let name = block.short_name();
    let prop = |k: &str| block.property(k);
    let flag = |k: &str| block.bool_property(k).unwrap_or(false);

    if block.is_stairs() {
        out.set_int("weirdo_direction", weirdo_direction(prop("facing").unwrap_or("north")));
        out.set_bool("upside_down_bit", prop("half") == Some("top"));
        return;
    }
    if block.is_slab() {
        let half = if prop("type") == Some("top") { "top" } else { "bottom" };
        out.set_str("minecraft:vertical_half", half);
        return;
    }
    if block.is_door() {
        out.set_int("direction", door_direction(prop("facing").unwrap_or("east")));
        out.set_bool("upper_block_bit", prop("half") == Some("upper"));
        out.set_bool("door_hinge_bit", prop("hinge") == Some("right"));
        out.set_bool("open_bit", flag("open"));
        return;
    }
    if block.is_trapdoor() {
        out.set_int("direction", weirdo_direction(prop("facing").unwrap_or("north")));
        out.set_bool("upside_down_bit", prop("half") == Some("top"));
        out.set_bool("open_bit", flag("open"));
        return;
    }
    if block.is_fence_gate() {
        out.set_int("direction", legacy_direction(prop("facing").unwrap_or("south")));
        out.set_bool("open_bit", flag("open"));
        out.set_bool("in_wall_bit", flag("in_wall"));
        return;
    }
    if block.is_leaves() {
        out.set_bool("persistent_bit", flag("persistent"));
        out.set_bool("update_bit", false);
        return;
    }
    if block.is_bed() {
        out.set_int("direction", legacy_direction(prop("facing").unwrap_or("south")));
        out.set_bool("head_piece_bit", prop("part") == Some("head"));
        out.set_bool("occupied_bit", flag("occupied"));
        return;
    }
    if block.is_wall() {
        for dir in Direction::HORIZONTAL {
            let connection = match prop(dir.name()) {
                Some("low") | Some("true") => "short",
                Some("tall") => "tall",
                _ => "none",
            };
            out.set_str(&format!("wall_connection_type_{}", dir.name()), connection);
        }
        out.set_bool("wall_post_bit", block.bool_property("up").unwrap_or(true));
        return;
    }
    if name.ends_with("_banner") {
        if name.ends_with("_wall_banner") {
            out.set_int("facing_direction", facing_index(prop("facing").unwrap_or("north")));
        } else {
            out.set_int("ground_sign_direction", block.int_property("rotation").unwrap_or(0));
        }
        return;
    }
    if name.ends_with("_sign") && !name.contains("hanging") {
        if name.ends_with("_wall_sign") {
            out.set_int("facing_direction", facing_index(prop("facing").unwrap_or("north")));
        } else {
            out.set_int("ground_sign_direction", block.int_property("rotation").unwrap_or(0));
        }
        return;
    }
    if name.ends_with("_hanging_sign") {
        if name.ends_with("_wall_hanging_sign") {
            out.set_int("facing_direction", facing_index(prop("facing").unwrap_or("north")));
            out.set_bool("hanging", false);
        } else {
            out.set_int("ground_sign_direction", block.int_property("rotation").unwrap_or(0));
            out.set_bool("attached_bit", flag("attached"));
            out.set_bool("hanging", true);
        }
        return;
    }
    if name.ends_with("_button") {
        let facing = match prop("face") {
            Some("floor") => 1,
            Some("ceiling") => 0,
            _ => facing_index(prop("facing").unwrap_or("north")),
        };
        out.set_int("facing_direction", facing);
        out.set_bool("button_pressed_bit", flag("powered"));
        return;
    }

    match name {
        "snow" => {
            let layers = block.int_property("layers").unwrap_or(1).clamp(1, 8);
            out.set_int("height", layers - 1);
            out.set_bool("covered_bit", false);
        }
        "water" | "lava" => {
            out.set_int("liquid_depth", block.int_property("level").unwrap_or(0));
        }
        "wheat" | "carrots" | "potatoes" => {
            out.set_int("growth", block.int_property("age").unwrap_or(0));
        }
        "beetroots" => {
            let age = block.int_property("age").unwrap_or(0).clamp(0, 3);
            out.set_int("growth", age * 2 + i32::from(age == 3));
        }
        "kelp" | "kelp_plant" => {
            out.set_int("kelp_age", block.int_property("age").unwrap_or(0));
        }
        "weeping_vines" | "weeping_vines_plant" => {
            out.set_int("weeping_vines_age", block.int_property("age").unwrap_or(0));
        }
        "twisting_vines" | "twisting_vines_plant" => {
            out.set_int("twisting_vines_age", block.int_property("age").unwrap_or(0));
        }
        "vine" => {
            let bits = [("south", 1), ("west", 2), ("north", 4), ("east", 8)]
                .into_iter()
                .filter(|(dir, _)| flag(dir))
                .map(|(_, bit)| bit)
                .sum();
            out.set_int("vine_direction_bits", bits);
        }
        "campfire" | "soul_campfire" => {
            out.set_str("minecraft:cardinal_direction", prop("facing").unwrap_or("north"));
            out.set_bool("extinguished", !block.bool_property("lit").unwrap_or(true));
        }
        "piston" | "sticky_piston" | "piston_head" => {
            out.set_int("facing_direction", facing_index(prop("facing").unwrap_or("up")));
        }
        "tripwire" => {
            out.set_bool("attached_bit", flag("attached"));
            out.set_bool("disarmed_bit", flag("disarmed"));
            out.set_bool("powered_bit", flag("powered"));
            out.set_bool("suspended_bit", true);
        }
        "tripwire_hook" => {
            out.set_int("direction", legacy_direction(prop("facing").unwrap_or("south")));
            out.set_bool("attached_bit", flag("attached"));
            out.set_bool("powered_bit", flag("powered"));
        }
        "torch" | "soul_torch" | "redstone_torch" => {
            out.set_str("torch_facing_direction", "top");
        }
        "wall_torch" | "soul_wall_torch" | "redstone_wall_torch" => {
            out.set_str("torch_facing_direction", prop("facing").unwrap_or("north"));
        }
        "lever" => {
            let facing = prop("facing").unwrap_or("north");
            let axis = if matches!(facing, "east" | "west") {
                "east_west"
            } else {
                "north_south"
            };
            let direction = match prop("face") {
                Some("floor") => format!("up_{axis}"),
                Some("ceiling") => format!("down_{axis}"),
                _ => facing.to_string(),
            };
            out.set_str("lever_direction", &direction);
            out.set_bool("open_bit", flag("powered"));
        }
        "repeater" => {
            out.set_str("minecraft:cardinal_direction", prop("facing").unwrap_or("north"));
            out.set_int("repeater_delay", block.int_property("delay").unwrap_or(1).clamp(1, 4) - 1);
        }
        "comparator" => {
            out.set_str("minecraft:cardinal_direction", prop("facing").unwrap_or("north"));
            out.set_bool("output_subtract_bit", prop("mode") == Some("subtract"));
            out.set_bool("output_lit_bit", flag("powered"));
        }
        "hopper" => {
            out.set_int("facing_direction", facing_index(prop("facing").unwrap_or("down")));
            out.set_bool("toggle_bit", !block.bool_property("enabled").unwrap_or(true));
        }
        "redstone_wire" => {
            out.set_int("redstone_signal", block.int_property("power").unwrap_or(0));
        }
        "nether_portal" => {
            out.set_str("portal_axis", prop("axis").unwrap_or("x"));
        }
        "bubble_column" => {
            out.set_bool("drag_down", block.bool_property("drag").unwrap_or(true));
        }
        "farmland" => {
            out.set_int("moisturized_amount", block.int_property("moisture").unwrap_or(0));
        }
        "cake" => {
            out.set_int("bite_counter", block.int_property("bites").unwrap_or(0));
        }
        "end_portal_frame" => {
            out.set_int("direction", legacy_direction(prop("facing").unwrap_or("south")));
            out.set_bool("end_portal_eye_bit", flag("eye"));
        }
        "daylight_detector" => {
            out.set_int("redstone_signal", block.int_property("power").unwrap_or(0));
        }
        _ => generic_states_to_bedrock(block, out),
    }
}

fn generic_states_to_bedrock(block: &BlockState, out: &mut BedrockBlock) {
    let name = block.short_name();
    if let Some(axis) = block.property("axis") {
        out.set_str("pillar_axis", axis);
    }
    if let Some(facing) = block.property("facing") {
        if uses_facing_direction(name) {
            out.set_int("facing_direction", facing_index(facing));
        } else {
            out.set_str("minecraft:cardinal_direction", facing);
        }
    }
    if let Some(age) = block.int_property("age") {
        out.set_int("age", age);
    }
    if let Some(power) = block.int_property("power") {
        out.set_int("redstone_signal", power);
    }
}

fn states_to_java(block: &BedrockBlock, java_name: &str, out: &mut BlockState) {
    let family = BlockState::new(java_name);
    let set = |out: &mut BlockState, k: &str, v: &str| {
        out.properties.insert(k.to_string(), v.to_string());
    };
    let set_flag = |out: &mut BlockState, k: &str, v: bool| {
        out.properties.insert(k.to_string(), v.to_string());
    };
    let flag = |k: &str| block.flag(k).unwrap_or(false);

    if family.is_stairs() {
        set(out, "facing", from_weirdo_direction(block.int("weirdo_direction").unwrap_or(3)));
        set(out, "half", if flag("upside_down_bit") { "top" } else { "bottom" });
        return;
    }
    if family.is_slab() {
        if !out.properties.contains_key("type") {
            let half = match block.str("minecraft:vertical_half") {
                Some("top") => "top",
                _ if flag("top_slot_bit") => "top",
                _ => "bottom",
            };
            set(out, "type", half);
        }
        return;
    }
    if family.is_door() {
        set(out, "facing", from_door_direction(block.int("direction").unwrap_or(0)));
        set(out, "half", if flag("upper_block_bit") { "upper" } else { "lower" });
        set(out, "hinge", if flag("door_hinge_bit") { "right" } else { "left" });
        set_flag(out, "open", flag("open_bit"));
        return;
    }
    if family.is_trapdoor() {
        set(out, "facing", from_weirdo_direction(block.int("direction").unwrap_or(3)));
        set(out, "half", if flag("upside_down_bit") { "top" } else { "bottom" });
        set_flag(out, "open", flag("open_bit"));
        return;
    }
    if family.is_fence_gate() {
        set(out, "facing", from_legacy_direction(block.int("direction").unwrap_or(0)));
        set_flag(out, "open", flag("open_bit"));
        set_flag(out, "in_wall", flag("in_wall_bit"));
        return;
    }
    if family.is_leaves() {
        set_flag(out, "persistent", flag("persistent_bit"));
        return;
    }
    if family.is_bed() {
        set(out, "facing", from_legacy_direction(block.int("direction").unwrap_or(0)));
        set(out, "part", if flag("head_piece_bit") { "head" } else { "foot" });
        set_flag(out, "occupied", flag("occupied_bit"));
        return;
    }
    if family.is_wall() {
        for dir in Direction::HORIZONTAL {
            let key = format!("wall_connection_type_{}", dir.name());
            let connection = match block.str(&key) {
                Some("short") => "low",
                Some("tall") => "tall",
                _ => "none",
            };
            set(out, dir.name(), connection);
        }
        set_flag(out, "up", block.flag("wall_post_bit").unwrap_or(true));
        return;
    }
    if java_name.ends_with("_wall_banner") {
        set(out, "facing", facing_from_index(block.int("facing_direction").unwrap_or(2)));
        return;
    }
    if java_name.ends_with("_banner") {
        let rotation = block.int("ground_sign_direction").unwrap_or(0).rem_euclid(16);
        set(out, "rotation", &rotation.to_string());
        return;
    }
    if java_name.ends_with("_wall_sign") || java_name.ends_with("_wall_hanging_sign") {
        set(out, "facing", facing_from_index(block.int("facing_direction").unwrap_or(2)));
        return;
    }
    if java_name.ends_with("_sign") {
        let rotation = block.int("ground_sign_direction").unwrap_or(0).rem_euclid(16);
        set(out, "rotation", &rotation.to_string());
        if java_name.ends_with("_hanging_sign") {
            set_flag(out, "attached", flag("attached_bit"));
        }
        return;
    }
    if java_name.ends_with("_button") {
        match block.int("facing_direction").unwrap_or(1) {
            1 => {
                set(out, "face", "floor");
                set(out, "facing", "north");
            }
            0 => {
                set(out, "face", "ceiling");
                set(out, "facing", "north");
            }
            other => {
                set(out, "face", "wall");
                set(out, "facing", facing_from_index(other));
            }
        }
        set_flag(out, "powered", flag("button_pressed_bit"));
        return;
    }

    let int_str = |k: &str, default: i32| block.int(k).unwrap_or(default).to_string();
    match java_name {
        "snow" => set(out, "layers", &(block.int("height").unwrap_or(0).clamp(0, 7) + 1).to_string()),
        "water" | "lava" => set(out, "level", &int_str("liquid_depth", 0)),
        "wheat" | "carrots" | "potatoes" => set(out, "age", &int_str("growth", 0)),
        "beetroots" => {
            let age = (block.int("growth").unwrap_or(0) / 2).clamp(0, 3);
            set(out, "age", &age.to_string());
        }
        "kelp" => set(out, "age", &int_str("kelp_age", 0)),
        "weeping_vines" => set(out, "age", &int_str("weeping_vines_age", 0)),
        "twisting_vines" => set(out, "age", &int_str("twisting_vines_age", 0)),
        "vine" => {
            let bits = block.int("vine_direction_bits").unwrap_or(0);
            for (dir, bit) in [("south", 1), ("west", 2), ("north", 4), ("east", 8)] {
                set_flag(out, dir, bits & bit != 0);
            }
        }
        "campfire" | "soul_campfire" => {
            set(out, "facing", block.str("minecraft:cardinal_direction").unwrap_or("north"));
            set_flag(out, "lit", !flag("extinguished"));
        }
        "piston" | "sticky_piston" | "piston_head" => {
            set(out, "facing", facing_from_index(block.int("facing_direction").unwrap_or(1)));
        }
        "tripwire" => {
            set_flag(out, "attached", flag("attached_bit"));
            set_flag(out, "disarmed", flag("disarmed_bit"));
            set_flag(out, "powered", flag("powered_bit"));
        }
        "tripwire_hook" => {
            set(out, "facing", from_legacy_direction(block.int("direction").unwrap_or(0)));
            set_flag(out, "attached", flag("attached_bit"));
            set_flag(out, "powered", flag("powered_bit"));
        }
        "wall_torch" | "soul_wall_torch" | "redstone_wall_torch" => {
            set(out, "facing", block.str("torch_facing_direction").unwrap_or("north"));
        }
        "lever" => {
            let direction = block.str("lever_direction").unwrap_or("north");
            let (face, facing) = match direction {
                "up_north_south" => ("floor", "north"),
                "up_east_west" => ("floor", "east"),
                "down_north_south" => ("ceiling", "north"),
                "down_east_west" => ("ceiling", "east"),
                other => ("wall", other),
            };
            set(out, "face", face);
            set(out, "facing", facing);
            set_flag(out, "powered", flag("open_bit"));
        }
        "repeater" => {
            set(out, "facing", block.str("minecraft:cardinal_direction").unwrap_or("north"));
            let delay = block.int("repeater_delay").unwrap_or(0).clamp(0, 3) + 1;
            set(out, "delay", &delay.to_string());
        }
        "comparator" => {
            set(out, "facing", block.str("minecraft:cardinal_direction").unwrap_or("north"));
            let mode = if flag("output_subtract_bit") { "subtract" } else { "compare" };
            set(out, "mode", mode);
        }
        "hopper" => {
            set(out, "facing", facing_from_index(block.int("facing_direction").unwrap_or(0)));
            set_flag(out, "enabled", !flag("toggle_bit"));
        }
        "redstone_wire" | "daylight_detector" => set(out, "power", &int_str("redstone_signal", 0)),
        "nether_portal" => set(out, "axis", block.str("portal_axis").unwrap_or("x")),
        "bubble_column" => set_flag(out, "drag", block.flag("drag_down").unwrap_or(true)),
        "farmland" => set(out, "moisture", &int_str("moisturized_amount", 0)),
        "cake" => set(out, "bites", &int_str("bite_counter", 0)),
        "end_portal_frame" => {
            set(out, "facing", from_legacy_direction(block.int("direction").unwrap_or(0)));
            set_flag(out, "eye", flag("end_portal_eye_bit"));
        }
        _ => {
            if let Some(axis) = block.str("pillar_axis") {
                set(out, "axis", axis);
            }
            if let Some(index) = block.int("facing_direction") {
                set(out, "facing", facing_from_index(index));
            }
            if let Some(facing) = block.str("minecraft:cardinal_direction") {
                set(out, "facing", facing);
            }
            if let Some(age) = block.int("age") {
                set(out, "age", &age.to_string());
            }
        }
    }
}

/// Converts a canonical block to its Bedrock representation.
///
/// Never fails: non-vanilla namespaces become air and unlisted vanilla names
/// pass through by identifier. Both cases are flagged as unknown.
pub fn to_bedrock_block(block: &BlockState) -> Translated<BedrockBlock> {
    if block.namespace() != "minecraft" {
        return Translated::unknown(BedrockBlock::air());
    }
    let known = is_known_java_name(block.short_name());
    let mut out = BedrockBlock::simple(&bedrock_name_for(block));
    if out.short_name() != "air" {
        states_to_bedrock(block, &mut out);
    }
    Translated { value: out, known }
}

/// Converts a Bedrock palette block to the canonical form.
pub fn to_java_block(block: &BedrockBlock) -> Translated<BlockState> {
    if !block.name.starts_with("minecraft:") {
        return Translated::unknown(crate::block_definitions::AIR.clone());
    }
    let known = is_known_bedrock_name(block.short_name());
    let (java_name, implied) = java_name_for(block);
    let mut out = BlockState::new(&java_name);
    for (k, v) in implied {
        out.properties.insert(k.to_string(), v);
    }
    if !out.is_air() {
        states_to_java(block, &java_name, &mut out);
    }
    Translated { value: out, known }
}
