//! Java biome identifiers <-> Bedrock numeric biome ids.

use super::bimap::BiMap;
use super::Translated;
use once_cell::sync::Lazy;

pub const PLAINS_ID: u32 = 1;

static BIOMES: Lazy<BiMap<&'static str, u32>> = Lazy::new(|| {
    let mut map: BiMap<&'static str, u32> = [
        ("ocean", 0),
        ("plains", 1),
        ("desert", 2),
        ("windswept_hills", 3),
        ("forest", 4),
        ("taiga", 5),
        ("swamp", 6),
        ("river", 7),
        ("nether_wastes", 8),
        ("the_end", 9),
        ("frozen_river", 11),
        ("snowy_plains", 12),
        ("mushroom_fields", 14),
        ("beach", 16),
        ("jungle", 21),
        ("sparse_jungle", 23),
        ("deep_ocean", 24),
        ("stony_shore", 25),
        ("snowy_beach", 26),
        ("birch_forest", 27),
        ("dark_forest", 29),
        ("snowy_taiga", 30),
        ("old_growth_pine_taiga", 32),
        ("windswept_forest", 34),
        ("savanna", 35),
        ("savanna_plateau", 36),
        ("badlands", 37),
        ("wooded_badlands", 38),
        ("warm_ocean", 40),
        ("lukewarm_ocean", 42),
        ("deep_lukewarm_ocean", 43),
        ("cold_ocean", 44),
        ("deep_cold_ocean", 45),
        ("frozen_ocean", 46),
        ("deep_frozen_ocean", 47),
        ("bamboo_jungle", 48),
        ("sunflower_plains", 129),
        ("windswept_gravelly_hills", 131),
        ("flower_forest", 132),
        ("ice_spikes", 140),
        ("old_growth_birch_forest", 155),
        ("old_growth_spruce_taiga", 160),
        ("windswept_savanna", 163),
        ("eroded_badlands", 165),
        ("soul_sand_valley", 178),
        ("crimson_forest", 179),
        ("warped_forest", 180),
        ("basalt_deltas", 181),
        ("jagged_peaks", 182),
        ("frozen_peaks", 183),
        ("snowy_slopes", 184),
        ("grove", 185),
        ("meadow", 186),
        ("lush_caves", 187),
        ("dripstone_caves", 188),
        ("stony_peaks", 189),
        ("deep_dark", 190),
        ("mangrove_swamp", 191),
        ("cherry_grove", 192),
        ("pale_garden", 193),
    ]
    .into_iter()
    .collect();
    // Java splits the End into sub-biomes Bedrock doesn't have.
    for end_biome in ["small_end_islands", "end_midlands", "end_highlands", "end_barrens"] {
        map.insert_forward(end_biome, 9);
    }
    map.insert_forward("the_void", 1);
    map.insert_backward(41, "warm_ocean");
    map
});

fn strip_namespace(name: &str) -> &str {
    name.strip_prefix("minecraft:").unwrap_or(name)
}

pub fn to_bedrock_id(java: &str) -> Translated<u32> {
    match BIOMES.forward(strip_namespace(java)) {
        Some(id) => Translated::known(*id),
        None => Translated::unknown(PLAINS_ID),
    }
}

/// Returns the namespaced Java biome for a Bedrock id.
pub fn to_java_name(id: u32) -> Translated<String> {
    match BIOMES.backward(&id) {
        Some(name) => Translated::known(format!("minecraft:{name}")),
        None => Translated::unknown("minecraft:plains".to_string()),
    }
}
