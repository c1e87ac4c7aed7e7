//! Canonical block-state model.
//!
//! Every chunk held in memory uses Java's flattened vocabulary
//! (`minecraft:oak_stairs[facing=east,half=bottom,...]`). Readers translate into
//! it and writers translate out of it.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;

/// A block identifier plus its property mapping.
///
/// Properties are kept in a `BTreeMap` so equality and hashing ignore the
/// order in which they were inserted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockState {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

pub static AIR: Lazy<BlockState> = Lazy::new(|| BlockState::new("minecraft:air"));
pub static WATER: Lazy<BlockState> =
    Lazy::new(|| BlockState::new("minecraft:water").with("level", "0"));

impl BlockState {
    /// Creates a block without properties. Bare names get the `minecraft:` namespace.
    pub fn new(name: &str) -> Self {
        let name = if name.contains(':') {
            name.to_string()
        } else {
            format!("minecraft:{name}")
        };
        Self {
            name,
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in properties {
            self.properties.insert(k.into(), v.into());
        }
        self
    }

    /// Name without the namespace.
    pub fn short_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, n)| n)
            .unwrap_or(&self.name)
    }

    pub fn namespace(&self) -> &str {
        self.name.split_once(':').map(|(ns, _)| ns).unwrap_or("minecraft")
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn bool_property(&self, key: &str) -> Option<bool> {
        match self.property(key)? {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn int_property(&self, key: &str) -> Option<i32> {
        self.property(key)?.parse().ok()
    }

    /// Returns a copy with `key` set to `value`.
    pub fn with_property(&self, key: &str, value: impl ToString) -> Self {
        self.clone().with(key, value)
    }

    /// Returns a copy with a different identifier and the same properties.
    pub fn renamed(&self, name: &str) -> Self {
        let mut out = BlockState::new(name);
        out.properties = self.properties.clone();
        out
    }

    pub fn is(&self, short_name: &str) -> bool {
        self.short_name() == short_name
    }

    pub fn is_air(&self) -> bool {
        matches!(self.short_name(), "air" | "cave_air" | "void_air")
    }

    pub fn is_waterlogged(&self) -> bool {
        self.bool_property("waterlogged").unwrap_or(false)
    }

    /// Blocks that carry a Java `waterlogged` property.
    pub fn is_waterloggable(&self) -> bool {
        let n = self.short_name();
        (self.is_slab() && !n.ends_with("double_slab"))
            || self.is_stairs()
            || self.is_fence()
            || self.is_fence_gate()
            || self.is_pane()
            || self.is_wall()
            || self.is_trapdoor()
            || self.is_leaves()
            || n.ends_with("_sign")
            || n.ends_with("_coral")
            || n.ends_with("_coral_fan")
            || n.ends_with("_coral_wall_fan")
            || n.ends_with("candle")
            || n.ends_with("rail")
            || n.ends_with("_bud")
            || n.ends_with("copper_grate")
            || n == "chain"
            || n.ends_with("_chain")
            || matches!(
                n,
                "chest"
                    | "trapped_chest"
                    | "ender_chest"
                    | "ladder"
                    | "lantern"
                    | "soul_lantern"
                    | "campfire"
                    | "soul_campfire"
                    | "conduit"
                    | "scaffolding"
                    | "sea_pickle"
                    | "lightning_rod"
                    | "pointed_dripstone"
                    | "amethyst_cluster"
                    | "hanging_roots"
                    | "glow_lichen"
                    | "sculk_vein"
                    | "mangrove_roots"
                    | "mangrove_propagule"
                    | "big_dripleaf"
                    | "big_dripleaf_stem"
                    | "small_dripleaf"
                    | "light"
                    | "barrier"
                    | "heavy_core"
                    | "decorated_pot"
                    | "hopper"
            )
    }

    pub fn is_fence(&self) -> bool {
        let n = self.short_name();
        n.ends_with("_fence") && !n.ends_with("_fence_gate")
    }

    pub fn is_fence_gate(&self) -> bool {
        self.short_name().ends_with("_fence_gate")
    }

    pub fn is_pane(&self) -> bool {
        let n = self.short_name();
        n == "glass_pane" || n.ends_with("_stained_glass_pane") || n == "iron_bars"
    }

    pub fn is_wall(&self) -> bool {
        self.short_name().ends_with("_wall") && !self.is_wall_attached()
    }

    fn is_wall_attached(&self) -> bool {
        let n = self.short_name();
        n.ends_with("_wall_sign")
            || n.ends_with("_wall_hanging_sign")
            || n.ends_with("_wall_banner")
            || n.ends_with("wall_torch")
            || n.ends_with("_wall_head")
            || n.ends_with("_wall_skull")
            || n.ends_with("_wall_fan")
    }

    pub fn is_leaves(&self) -> bool {
        self.short_name().ends_with("_leaves")
    }

    pub fn is_log(&self) -> bool {
        let n = self.short_name();
        n.ends_with("_log") || n.ends_with("_wood") || n.ends_with("_stem") || n.ends_with("_hyphae")
    }

    pub fn is_door(&self) -> bool {
        self.short_name().ends_with("_door")
    }

    pub fn is_trapdoor(&self) -> bool {
        self.short_name().ends_with("_trapdoor")
    }

    pub fn is_stairs(&self) -> bool {
        self.short_name().ends_with("_stairs")
    }

    pub fn is_slab(&self) -> bool {
        self.short_name().ends_with("_slab")
    }

    pub fn is_bed(&self) -> bool {
        self.short_name().ends_with("_bed")
    }

    pub fn is_liquid(&self) -> bool {
        matches!(self.short_name(), "water" | "lava")
    }

    /// Solid enough for fences/panes to connect to.
    pub fn is_full_solid(&self) -> bool {
        if self.is_air() || self.is_liquid() {
            return false;
        }
        light_properties(self).is_opaque()
            && !self.is_slab()
            && !self.is_stairs()
            && !self.is_door()
            && !self.is_trapdoor()
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.properties.is_empty() {
            f.write_str("[")?;
            for (i, (k, v)) in self.properties.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{k}={v}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// How much light a block face lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transparency {
    Opaque,
    Translucent,
    Transparent,
}

/// Per-face light transmission plus emitted light level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockLightProperties {
    /// Indexed in [`crate::coords::Direction::ALL`] order.
    pub faces: [Transparency; 6],
    pub emission: u8,
}

impl BlockLightProperties {
    const fn uniform(transparency: Transparency, emission: u8) -> Self {
        Self {
            faces: [transparency; 6],
            emission,
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.faces.iter().all(|f| *f == Transparency::Opaque)
    }

    /// Whether the block stops the height-map scan going downwards.
    pub fn blocks_height_map(&self) -> bool {
        self.faces.iter().any(|f| *f != Transparency::Transparent)
    }
}

/// Light properties of a block.
pub fn light_properties(block: &BlockState) -> BlockLightProperties {
    use Transparency::*;

    let name = block.short_name();
    let emission = light_emission(block);

    if block.is_air() {
        return BlockLightProperties::uniform(Transparent, 0);
    }
    if block.is_liquid() || block.is_leaves() || name == "ice" || name == "slime_block" {
        return BlockLightProperties::uniform(Translucent, emission);
    }
    if name.contains("glass")
        || block.is_fence()
        || block.is_fence_gate()
        || block.is_pane()
        || block.is_door()
        || block.is_trapdoor()
        || is_plant(name)
        || name.ends_with("torch")
        || name.ends_with("_sign")
        || name.ends_with("_banner")
        || name.ends_with("_carpet")
        || name.ends_with("_button")
        || name.ends_with("_pressure_plate")
        || matches!(
            name,
            "snow" | "ladder" | "lever" | "rail" | "powered_rail" | "detector_rail"
                | "activator_rail" | "redstone_wire" | "tripwire" | "tripwire_hook"
                | "cobweb" | "fire" | "soul_fire" | "flower_pot" | "end_rod"
                | "lantern" | "soul_lantern" | "chain" | "scaffolding" | "campfire"
                | "soul_campfire" | "beacon" | "chorus_plant" | "chorus_flower"
        )
    {
        return BlockLightProperties::uniform(Transparent, emission);
    }
    if block.is_slab() && block.property("type") != Some("double") {
        let mut faces = [Transparent; 6];
        // Down for bottom slabs, up for top slabs.
        let solid = if block.property("type") == Some("top") { 1 } else { 0 };
        faces[solid] = Opaque;
        return BlockLightProperties { faces, emission };
    }
    if block.is_stairs() {
        let mut faces = [Translucent; 6];
        let solid = if block.property("half") == Some("top") { 1 } else { 0 };
        faces[solid] = Opaque;
        return BlockLightProperties { faces, emission };
    }
    BlockLightProperties::uniform(Opaque, emission)
}

fn light_emission(block: &BlockState) -> u8 {
    match block.short_name() {
        "glowstone" | "sea_lantern" | "jack_o_lantern" | "beacon" | "shroomlight" | "lava"
        | "lantern" | "froglight" | "ochre_froglight" | "verdant_froglight"
        | "pearlescent_froglight" | "end_gateway" | "conduit" | "fire" => 15,
        "campfire" | "torch" | "wall_torch" | "end_rod" => {
            if block.bool_property("lit") == Some(false) {
                0
            } else {
                14
            }
        }
        "sea_pickle" => 6,
        "soul_torch" | "soul_wall_torch" | "soul_lantern" | "soul_campfire" | "soul_fire" => 10,
        "nether_portal" => 11,
        "redstone_torch" | "redstone_wall_torch" => 7,
        "magma_block" => 3,
        _ => 0,
    }
}

fn is_plant(name: &str) -> bool {
    matches!(
        name,
        "short_grass" | "tall_grass" | "fern" | "large_fern" | "dead_bush" | "dandelion"
            | "poppy" | "blue_orchid" | "allium" | "azure_bluet" | "red_tulip"
            | "orange_tulip" | "white_tulip" | "pink_tulip" | "oxeye_daisy" | "cornflower"
            | "lily_of_the_valley" | "sunflower" | "lilac" | "rose_bush" | "peony"
            | "sugar_cane" | "kelp" | "kelp_plant" | "seagrass" | "tall_seagrass"
            | "vine" | "wheat" | "carrots" | "potatoes" | "beetroots" | "sweet_berry_bush"
            | "weeping_vines" | "weeping_vines_plant" | "twisting_vines"
            | "twisting_vines_plant" | "cave_vines" | "cave_vines_plant" | "lily_pad"
            | "brown_mushroom" | "red_mushroom" | "bamboo" | "cactus" | "nether_wart"
    ) || name.ends_with("_sapling")
        || name.ends_with("_coral")
        || name.ends_with("_coral_fan")
        || name.ends_with("_wall_fan")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = BlockState::new("oak_stairs")
            .with("facing", "east")
            .with("half", "top");
        let b = BlockState::new("minecraft:oak_stairs")
            .with("half", "top")
            .with("facing", "east");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "minecraft:oak_stairs[facing=east,half=top]");
    }

    #[test]
    fn test_families() {
        assert!(BlockState::new("oak_fence").is_fence());
        assert!(!BlockState::new("oak_fence_gate").is_fence());
        assert!(BlockState::new("cobblestone_wall").is_wall());
        assert!(!BlockState::new("oak_wall_sign").is_wall());
        assert!(BlockState::new("spruce_log").is_log());
        assert!(BlockState::new("crimson_stem").is_log());
        assert!(BlockState::new("cave_air").is_air());
        assert!(BlockState::new("stone").is_full_solid());
        assert!(!BlockState::new("glass").is_full_solid());
        assert!(BlockState::new("oak_slab").is_waterloggable());
        assert!(BlockState::new("lantern").is_waterloggable());
        assert!(!BlockState::new("sea_lantern").is_waterloggable());
        assert!(!BlockState::new("stone").is_waterloggable());
    }

    #[test]
    fn test_light_properties() {
        assert!(light_properties(&BlockState::new("stone")).is_opaque());
        assert!(!light_properties(&AIR).blocks_height_map());
        assert!(light_properties(&WATER).blocks_height_map());
        assert_eq!(light_properties(&BlockState::new("glowstone")).emission, 15);
        let unlit = BlockState::new("campfire").with("lit", "false");
        assert_eq!(light_properties(&unlit).emission, 0);
        let top_slab = BlockState::new("oak_slab").with("type", "top");
        let faces = light_properties(&top_slab).faces;
        assert_eq!(faces[1], Transparency::Opaque);
        assert_eq!(faces[0], Transparency::Transparent);
    }
}
