//! Entity conversion.
//!
//! Java nests riders inside their vehicle (`Passengers`) and ties a leash to a
//! knot position or holder UUID. Bedrock stores every actor flat, links riders
//! through `LinksTag` and leashes through `LeasherID`. Both directions run in
//! two passes: ids are settled for every actor of the chunk first, then the
//! references between them are wired up.

use super::id_registry::{java_uuid_value, read_java_uuid, IdRegistry, LOCAL_PLAYER_ID};
use super::inventory::{items_to_bedrock, items_to_java, SlotLayout};
use crate::coords::{BlockPos, Dimension};
use crate::level::{bedrock_game_type, java_game_type};
use crate::nbt_utils::{as_compound, read_vec3, Compound, CompoundBuilder, CompoundExt};
use crate::stats::{anomaly, ChunkLog};
use crate::translation::{items, Translator};
use fastnbt::{IntArray, Value};
use fnv::{FnvHashMap, FnvHashSet};

/// Bedrock stores the player's position at eye height.
const PLAYER_EYE_HEIGHT: f64 = 1.62;

fn floats(values: [f64; 3]) -> Value {
    Value::List(values.iter().map(|v| Value::Float(*v as f32)).collect())
}

fn doubles(values: [f64; 3]) -> Value {
    Value::List(values.iter().map(|v| Value::Double(*v)).collect())
}

fn rotation(tag: &Compound) -> [f32; 2] {
    let list = tag.get_list("Rotation");
    let at = |i: usize| {
        list.and_then(|l| l.get(i))
            .and_then(|v| match v {
                Value::Float(f) => Some(*f),
                Value::Double(d) => Some(*d as f32),
                _ => None,
            })
            .unwrap_or(0.0)
    };
    [at(0), at(1)]
}

fn block_of(pos: [f64; 3]) -> BlockPos {
    BlockPos::new(pos[0].floor() as i32, pos[1].floor() as i32, pos[2].floor() as i32)
}

/// Fields every actor carries, copied under each edition's name.
const COMMON_FLAGS: [(&str, &str); 4] = [
    ("OnGround", "OnGround"),
    ("Invulnerable", "Invulnerable"),
    ("PersistenceRequired", "Persistent"),
    ("CustomNameVisible", "CustomNameVisible"),
];

struct FlatEntity<'a> {
    tag: &'a Compound,
    id: i64,
    riders: Vec<i64>,
}

fn synthetic_source_id(log: &ChunkLog<'_>, seq: i64) -> i64 {
    let x = i64::from(log.pos.x) & 0xFF_FFFF;
    let z = i64::from(log.pos.z) & 0xFF_FFFF;
    let dim = i64::from(log.dimension.bedrock_id()) & 0x3;
    (x << 40) | (z << 16) | (dim << 14) | (seq & 0x3FFF)
}

fn flatten<'a>(
    tag: &'a Compound,
    registry: &IdRegistry,
    log: &mut ChunkLog<'_>,
    out: &mut Vec<FlatEntity<'a>>,
) -> i64 {
    let id = match read_java_uuid(tag, "UUID") {
        Some(uuid) => registry.id_for(uuid),
        None => {
            log.count(anomaly::MALFORMED_ENTITIES);
            registry.id_for_legacy(synthetic_source_id(log, out.len() as i64))
        }
    };
    let index = out.len();
    out.push(FlatEntity {
        tag,
        id,
        riders: Vec::new(),
    });
    if let Some(passengers) = tag.get_list("Passengers") {
        for passenger in passengers.iter().filter_map(as_compound) {
            let rider = flatten(passenger, registry, log, out);
            out[index].riders.push(rider);
        }
    }
    id
}

enum JavaLeash {
    Knot(BlockPos),
    Holder(u128),
}

fn java_leash(tag: &Compound) -> Option<Result<JavaLeash, ()>> {
    if let Some(pos) = tag.get_int_array("leash") {
        return Some(match pos {
            [x, y, z] => Ok(JavaLeash::Knot(BlockPos::new(*x, *y, *z))),
            _ => Err(()),
        });
    }
    let leash = tag.get_compound("leash").or_else(|| tag.get_compound("Leash"))?;
    if let Some(uuid) = read_java_uuid(leash, "UUID") {
        return Some(Ok(JavaLeash::Holder(uuid)));
    }
    match (leash.get_i32("X"), leash.get_i32("Y"), leash.get_i32("Z")) {
        (Some(x), Some(y), Some(z)) => Some(Ok(JavaLeash::Knot(BlockPos::new(x, y, z)))),
        _ => Some(Err(())),
    }
}

fn leash_knot(id: i64, at: BlockPos) -> Compound {
    let pos = [f64::from(at.x) + 0.5, f64::from(at.y) + 0.25, f64::from(at.z) + 0.5];
    CompoundBuilder::new()
        .string("identifier", "minecraft:leash_knot")
        .long("UniqueID", id)
        .value("Pos", floats(pos))
        .value("Rotation", Value::List(vec![Value::Float(0.0), Value::Float(0.0)]))
        .list("definitions", vec![Value::String("+minecraft:leash_knot".to_string())])
        .build()
}

/// Java entities of one chunk to Bedrock actors.
pub fn entities_to_bedrock(
    java: &[Compound],
    registry: &IdRegistry,
    translator: &Translator,
    log: &mut ChunkLog<'_>,
) -> Vec<Compound> {
    let mut flat = Vec::new();
    for tag in java {
        flatten(tag, registry, log, &mut flat);
    }

    // Knot ids derive from the fence position, so an entity and its knot
    // agree even when they sit in different chunks. Only knots inside this
    // chunk are written here.
    let mut knots: FnvHashMap<BlockPos, i64> = FnvHashMap::default();
    let mut leashers: FnvHashMap<i64, i64> = FnvHashMap::default();
    for entity in &flat {
        match java_leash(entity.tag) {
            Some(Ok(JavaLeash::Knot(at))) => {
                let holder = registry.leash_holder_id(entity.id, log.dimension, at);
                if at.chunk() == log.pos {
                    knots.insert(at, holder);
                }
                leashers.insert(entity.id, holder);
            }
            Some(Ok(JavaLeash::Holder(uuid))) => {
                leashers.insert(entity.id, registry.id_for(uuid));
            }
            Some(Err(())) => log.count(anomaly::UNRESOLVED_LINKS),
            None => {}
        }
    }

    let mut out = Vec::with_capacity(flat.len() + knots.len());
    for entity in &flat {
        let is_knot = entity
            .tag
            .get_str("id")
            .is_some_and(|id| id == "minecraft:leash_knot");
        if is_knot {
            if let Some(at) = read_vec3(entity.tag, "Pos").map(block_of) {
                knots.insert(at, registry.leash_knot_id(log.dimension, at));
                continue;
            }
        }
        if let Some(actor) = actor_to_bedrock(entity, leashers.get(&entity.id).copied(), translator, log) {
            out.push(actor);
        }
    }
    let mut knots: Vec<(BlockPos, i64)> = knots.into_iter().collect();
    knots.sort();
    out.extend(knots.into_iter().map(|(at, id)| leash_knot(id, at)));
    out
}

fn actor_to_bedrock(
    entity: &FlatEntity<'_>,
    leasher: Option<i64>,
    translator: &Translator,
    log: &mut ChunkLog<'_>,
) -> Option<Compound> {
    let tag = entity.tag;
    let (Some(java_id), Some(pos)) = (tag.get_str("id"), read_vec3(tag, "Pos")) else {
        log.count(anomaly::MALFORMED_ENTITIES);
        return None;
    };
    let identifier = translator.entity_to_bedrock(java_id);
    if !identifier.known {
        log.count(anomaly::UNKNOWN_ENTITIES);
    }
    let [yaw, pitch] = rotation(tag);
    let mut out = CompoundBuilder::new()
        .string("identifier", identifier.value.clone())
        .long("UniqueID", entity.id)
        .value("Pos", floats(pos))
        .value("Motion", floats(read_vec3(tag, "Motion").unwrap_or([0.0; 3])))
        .value("Rotation", Value::List(vec![Value::Float(yaw), Value::Float(pitch)]))
        .short("Fire", tag.get_i16("Fire").unwrap_or(0).max(0))
        .short("Air", tag.get_i16("Air").unwrap_or(300))
        .float("FallDistance", tag.get_f32("FallDistance").unwrap_or(0.0))
        .list("definitions", vec![Value::String(format!("+{}", identifier.value))]);
    for (java_key, bedrock_key) in COMMON_FLAGS {
        out = out.flag(bedrock_key, tag.get_bool(java_key).unwrap_or(false));
    }
    if let Some(name) = tag.get_str("CustomName") {
        out = out.string("CustomName", items::plain_text(name));
    }
    if let Some(tags) = tag.get_list("Tags") {
        out = out.list("Tags", tags.clone());
    }
    if let Some(item) = tag.get_compound("Item") {
        let stack = items_to_bedrock(
            &[Value::Compound(item.clone())],
            SlotLayout::UNBOUNDED,
            java_id,
            log,
        );
        if let Some(Value::Compound(stack)) = stack.into_iter().next() {
            out = out.compound("Item", stack);
        }
    }
    if !entity.riders.is_empty() {
        let links = entity
            .riders
            .iter()
            .enumerate()
            .map(|(i, rider)| {
                CompoundBuilder::new()
                    .long("entityID", *rider)
                    .int("LinkID", i as i32)
                    .into_value()
            })
            .collect();
        out = out.list("LinksTag", links);
    }
    if let Some(holder) = leasher {
        out = out.long("LeasherID", holder);
    }
    Some(out.build())
}

struct JavaActor {
    tag: Compound,
    unique_id: i64,
    identifier: String,
    pos: [f64; 3],
    riders: Vec<i64>,
    leasher: Option<i64>,
}

fn actor_to_java(
    actor: &Compound,
    registry: &IdRegistry,
    translator: &Translator,
    log: &mut ChunkLog<'_>,
) -> Option<JavaActor> {
    let (Some(identifier), Some(unique_id), Some(pos)) = (
        actor.get_str("identifier"),
        actor.get_i64("UniqueID"),
        read_vec3(actor, "Pos"),
    ) else {
        log.count(anomaly::MALFORMED_ENTITIES);
        return None;
    };
    let java_id = translator.entity_to_java(identifier);
    if !java_id.known {
        log.count(anomaly::UNKNOWN_ENTITIES);
    }
    let [yaw, pitch] = rotation(actor);
    let mut out = CompoundBuilder::new()
        .string("id", java_id.value)
        .value("UUID", java_uuid_value(registry.uuid_for(unique_id)))
        .value("Pos", doubles(pos))
        .value("Motion", doubles(read_vec3(actor, "Motion").unwrap_or([0.0; 3])))
        .value("Rotation", Value::List(vec![Value::Float(yaw), Value::Float(pitch)]))
        .short("Fire", actor.get_i16("Fire").unwrap_or(-20))
        .short("Air", actor.get_i16("Air").unwrap_or(300))
        .float("FallDistance", actor.get_f32("FallDistance").unwrap_or(0.0));
    for (java_key, bedrock_key) in COMMON_FLAGS {
        out = out.flag(java_key, actor.get_bool(bedrock_key).unwrap_or(false));
    }
    if let Some(name) = actor.get_str("CustomName") {
        out = out.string("CustomName", items::json_text(name));
    }
    if let Some(tags) = actor.get_list("Tags") {
        out = out.list("Tags", tags.clone());
    }
    if let Some(item) = actor.get_compound("Item") {
        let stack = items_to_java(&[Value::Compound(item.clone())], SlotLayout::UNBOUNDED, identifier, log);
        if let Some(Value::Compound(stack)) = stack.into_iter().next() {
            out = out.compound("Item", stack);
        }
    }

    let mut links: Vec<(i32, i64)> = actor
        .get_list("LinksTag")
        .map(|links| {
            links
                .iter()
                .filter_map(as_compound)
                .filter_map(|l| Some((l.get_i32("LinkID").unwrap_or(0), l.get_i64("entityID")?)))
                .collect()
        })
        .unwrap_or_default();
    links.sort_by_key(|(link, _)| *link);

    Some(JavaActor {
        tag: out.build(),
        unique_id,
        identifier: identifier.to_string(),
        pos,
        riders: links.into_iter().map(|(_, id)| id).collect(),
        leasher: actor.get_i64("LeasherID").filter(|id| *id != -1 && *id != 0),
    })
}

/// Bedrock actors of one chunk to Java entities, riders nested in their vehicles.
pub fn entities_to_java(
    bedrock: &[Compound],
    registry: &IdRegistry,
    translator: &Translator,
    log: &mut ChunkLog<'_>,
) -> Vec<Compound> {
    let mut actors: Vec<JavaActor> = bedrock
        .iter()
        .filter_map(|actor| actor_to_java(actor, registry, translator, log))
        .collect();
    let index: FnvHashMap<i64, usize> = actors
        .iter()
        .enumerate()
        .map(|(i, a)| (a.unique_id, i))
        .collect();

    // Leashes.
    for i in 0..actors.len() {
        let Some(holder) = actors[i].leasher else {
            continue;
        };
        let leash = match index.get(&holder).map(|&h| &actors[h]) {
            Some(knot) if knot.identifier == "minecraft:leash_knot" => {
                let at = block_of(knot.pos);
                Value::IntArray(IntArray::new(vec![at.x, at.y, at.z]))
            }
            _ => CompoundBuilder::new()
                .value("UUID", java_uuid_value(registry.uuid_for(holder)))
                .into_value(),
        };
        actors[i].tag.insert("leash".to_string(), leash);
    }

    // Riders: the first vehicle to claim an actor owns it.
    let mut claimed: FnvHashMap<usize, usize> = FnvHashMap::default();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); actors.len()];
    for (vehicle, actor) in actors.iter().enumerate() {
        for rider in &actor.riders {
            match index.get(rider) {
                Some(&r) if r != vehicle && !claimed.contains_key(&r) => {
                    claimed.insert(r, vehicle);
                    children[vehicle].push(r);
                }
                _ => log.count(anomaly::UNRESOLVED_LINKS),
            }
        }
    }

    let mut tags: Vec<Option<Compound>> = actors.into_iter().map(|a| Some(a.tag)).collect();
    let mut visited = FnvHashSet::default();
    let mut out = Vec::new();
    for root in (0..tags.len()).filter(|i| !claimed.contains_key(i)) {
        if let Some(tag) = nest(root, &children, &mut tags, &mut visited) {
            out.push(tag);
        }
    }
    // Riding cycles have no root; their members come out unmounted.
    for tag in tags.iter_mut().filter_map(Option::take) {
        log.count(anomaly::UNRESOLVED_LINKS);
        out.push(tag);
    }
    out
}

fn nest(
    at: usize,
    children: &[Vec<usize>],
    tags: &mut [Option<Compound>],
    visited: &mut FnvHashSet<usize>,
) -> Option<Compound> {
    if !visited.insert(at) {
        return None;
    }
    let mut tag = tags[at].take()?;
    let passengers: Vec<Value> = children[at]
        .iter()
        .filter_map(|&child| nest(child, children, tags, visited))
        .map(Value::Compound)
        .collect();
    if !passengers.is_empty() {
        tag.insert("Passengers".to_string(), Value::List(passengers));
    }
    Some(tag)
}

fn armor_slot_to_bedrock(slot: i8) -> Option<i8> {
    match slot {
        100..=103 => Some(103 - slot),
        _ => None,
    }
}

fn armor_slot_to_java(slot: i8) -> Option<i8> {
    match slot {
        0..=3 => Some(103 - slot),
        _ => None,
    }
}

fn offhand_slot_to_bedrock(slot: i8) -> Option<i8> {
    (slot == -106).then_some(0)
}

fn offhand_slot_to_java(slot: i8) -> Option<i8> {
    (slot == 0).then_some(-106)
}

/// Splits a Java inventory into main, armour and offhand slots.
fn java_inventory_parts(inventory: &[Value]) -> [Vec<Value>; 3] {
    let mut parts: [Vec<Value>; 3] = Default::default();
    for item in inventory {
        let slot = as_compound(item).and_then(|c| c.get_i8("Slot")).unwrap_or(0);
        let part = match slot {
            100..=103 => 1,
            -106 => 2,
            _ => 0,
        };
        parts[part].push(item.clone());
    }
    parts
}

/// Bedrock armour and offhand lists are positional; a missing item is an
/// empty stack.
fn positional(items: Vec<Value>, len: usize) -> Vec<Value> {
    let empty = || {
        CompoundBuilder::new()
            .string("Name", "")
            .byte("Count", 0)
            .short("Damage", 0)
            .flag("WasPickedUp", false)
            .into_value()
    };
    let mut out: Vec<Value> = (0..len).map(|_| empty()).collect();
    for item in items {
        let Some(slot) = as_compound(&item).and_then(|c| c.get_i8("Slot")) else {
            continue;
        };
        if let Some(place) = usize::try_from(slot).ok().filter(|s| *s < len) {
            out[place] = item;
        }
    }
    out
}

/// Java player compound (from `level.dat` or `playerdata/`) to the Bedrock
/// `~local_player` record.
pub fn player_to_bedrock(java: &Compound, log: &mut ChunkLog<'_>) -> Compound {
    let mut pos = read_vec3(java, "Pos").unwrap_or([0.5, 64.0, 0.5]);
    pos[1] += PLAYER_EYE_HEIGHT;
    let [yaw, pitch] = rotation(java);
    let dimension = java
        .get_str("Dimension")
        .and_then(Dimension::from_java_name)
        .unwrap_or(Dimension::Overworld);

    let inventory = java.get_list("Inventory").map(Vec::as_slice).unwrap_or(&[]);
    let [main, armor, offhand] = java_inventory_parts(inventory);
    let main = items_to_bedrock(&main, SlotLayout::fixed(36), "player inventory", log);
    let armor_layout = SlotLayout {
        capacity: Some(4),
        remap: armor_slot_to_bedrock,
    };
    let armor = items_to_bedrock(&armor, armor_layout, "player armor", log);
    let offhand_layout = SlotLayout {
        capacity: Some(1),
        remap: offhand_slot_to_bedrock,
    };
    let offhand = items_to_bedrock(&offhand, offhand_layout, "player offhand", log);

    let mut out = CompoundBuilder::new()
        .string("identifier", "minecraft:player")
        .long("UniqueID", LOCAL_PLAYER_ID)
        .value("Pos", floats(pos))
        .value("Motion", floats(read_vec3(java, "Motion").unwrap_or([0.0; 3])))
        .value("Rotation", Value::List(vec![Value::Float(yaw), Value::Float(pitch)]))
        .int("DimensionId", dimension.bedrock_id())
        .int("PlayerGameMode", bedrock_game_type(java.get_i32("playerGameType").unwrap_or(0)))
        .int("PlayerLevel", java.get_i32("XpLevel").unwrap_or(0))
        .float("PlayerLevelProgress", java.get_f32("XpP").unwrap_or(0.0))
        .flag("OnGround", java.get_bool("OnGround").unwrap_or(true))
        .list("Inventory", main)
        .list("Armor", positional(armor, 4))
        .list("Offhand", positional(offhand, 1));
    if let (Some(x), Some(y), Some(z)) = (
        java.get_i32("SpawnX"),
        java.get_i32("SpawnY"),
        java.get_i32("SpawnZ"),
    ) {
        out = out.int("SpawnX", x).int("SpawnY", y).int("SpawnZ", z);
    }
    out.build()
}

/// Bedrock `~local_player` to a Java player compound carrying `uuid`.
pub fn player_to_java(bedrock: &Compound, uuid: u128, log: &mut ChunkLog<'_>) -> Compound {
    let mut pos = read_vec3(bedrock, "Pos").unwrap_or([0.5, 64.0 + PLAYER_EYE_HEIGHT, 0.5]);
    pos[1] -= PLAYER_EYE_HEIGHT;
    let [yaw, pitch] = rotation(bedrock);
    let dimension = bedrock
        .get_i32("DimensionId")
        .and_then(Dimension::from_bedrock_id)
        .unwrap_or(Dimension::Overworld);

    let list = |key: &str| bedrock.get_list(key).map(Vec::as_slice).unwrap_or(&[]);
    let mut inventory = items_to_java(list("Inventory"), SlotLayout::fixed(36), "player inventory", log);
    let armor_layout = SlotLayout {
        capacity: None,
        remap: armor_slot_to_java,
    };
    let with_slots = |items: &[Value]| -> Vec<Value> {
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let mut item = as_compound(item)?.clone();
                item.insert("Slot".to_string(), Value::Byte(i as i8));
                Some(Value::Compound(item))
            })
            .collect()
    };
    inventory.extend(items_to_java(&with_slots(list("Armor")), armor_layout, "player armor", log));
    let offhand_layout = SlotLayout {
        capacity: None,
        remap: offhand_slot_to_java,
    };
    inventory.extend(items_to_java(
        &with_slots(list("Offhand")),
        offhand_layout,
        "player offhand",
        log,
    ));

    let mut out = CompoundBuilder::new()
        .value("UUID", java_uuid_value(uuid))
        .value("Pos", doubles(pos))
        .value("Motion", doubles(read_vec3(bedrock, "Motion").unwrap_or([0.0; 3])))
        .value("Rotation", Value::List(vec![Value::Float(yaw), Value::Float(pitch)]))
        .string("Dimension", dimension.java_name())
        .int("playerGameType", java_game_type(bedrock.get_i32("PlayerGameMode").unwrap_or(0)))
        .int("XpLevel", bedrock.get_i32("PlayerLevel").unwrap_or(0))
        .float("XpP", bedrock.get_f32("PlayerLevelProgress").unwrap_or(0.0))
        .flag("OnGround", bedrock.get_bool("OnGround").unwrap_or(true))
        .list("Inventory", inventory);
    if let (Some(x), Some(y), Some(z)) = (
        bedrock.get_i32("SpawnX"),
        bedrock.get_i32("SpawnY"),
        bedrock.get_i32("SpawnZ"),
    ) {
        out = out.int("SpawnX", x).int("SpawnY", y).int("SpawnZ", z);
    }
    out.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ChunkPos;
    use crate::stats::Statistics;
    use std::collections::BTreeSet;

    fn mob(id: &str, uuid: u128, pos: [f64; 3]) -> CompoundBuilder {
        CompoundBuilder::new()
            .string("id", id)
            .value("UUID", java_uuid_value(uuid))
            .value("Pos", doubles(pos))
    }

    struct Harness {
        stats: Statistics,
        maps: BTreeSet<i64>,
        registry: IdRegistry,
        translator: Translator,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                stats: Statistics::new(),
                maps: BTreeSet::new(),
                registry: IdRegistry::new(),
                translator: Translator::new(),
            }
        }

        fn to_bedrock(&mut self, java: &[Compound]) -> Vec<Compound> {
            self.to_bedrock_in(ChunkPos::new(0, 0), java)
        }

        fn to_bedrock_in(&mut self, chunk: ChunkPos, java: &[Compound]) -> Vec<Compound> {
            let mut log = ChunkLog::new(Dimension::Overworld, chunk, &mut self.stats, &mut self.maps);
            entities_to_bedrock(java, &self.registry, &self.translator, &mut log)
        }

        fn to_java(&mut self, bedrock: &[Compound]) -> Vec<Compound> {
            let mut log = ChunkLog::new(Dimension::Overworld, ChunkPos::new(0, 0), &mut self.stats, &mut self.maps);
            entities_to_java(bedrock, &self.registry, &self.translator, &mut log)
        }
    }

    #[test]
    fn test_passengers_become_links_and_back() {
        let mut h = Harness::new();
        let jockey = mob("minecraft:skeleton", 2, [1.5, 65.0, 1.5]).build();
        let spider = mob("minecraft:spider", 1, [1.5, 64.0, 1.5])
            .list("Passengers", vec![Value::Compound(jockey)])
            .build();

        let bedrock = h.to_bedrock(&[spider]);
        assert_eq!(bedrock.len(), 2);
        let spider_id = h.registry.id_for(1);
        let skeleton_id = h.registry.id_for(2);
        let vehicle = bedrock
            .iter()
            .find(|a| a.get_i64("UniqueID") == Some(spider_id))
            .unwrap();
        let link = as_compound(&vehicle.get_list("LinksTag").unwrap()[0]).unwrap();
        assert_eq!(link.get_i64("entityID"), Some(skeleton_id));

        let java = h.to_java(&bedrock);
        assert_eq!(java.len(), 1);
        assert_eq!(java[0].get_str("id"), Some("minecraft:spider"));
        let rider = as_compound(&java[0].get_list("Passengers").unwrap()[0]).unwrap();
        assert_eq!(rider.get_str("id"), Some("minecraft:skeleton"));
        assert_eq!(h.stats.anomaly(anomaly::UNRESOLVED_LINKS), 0);
    }

    #[test]
    fn test_rider_outside_chunk_is_unresolved() {
        let mut h = Harness::new();
        let horse = CompoundBuilder::new()
            .string("identifier", "minecraft:horse")
            .long("UniqueID", 77)
            .value("Pos", floats([3.0, 64.0, 3.0]))
            .list(
                "LinksTag",
                vec![CompoundBuilder::new().long("entityID", 78).int("LinkID", 0).into_value()],
            )
            .build();
        let java = h.to_java(&[horse]);
        assert_eq!(java.len(), 1);
        assert!(java[0].get_list("Passengers").is_none());
        assert_eq!(h.stats.anomaly(anomaly::UNRESOLVED_LINKS), 1);
    }

    #[test]
    fn test_leash_to_fence_creates_knot() {
        let mut h = Harness::new();
        let dog = mob("minecraft:wolf", 5, [4.2, 64.0, 4.7])
            .value("leash", Value::IntArray(IntArray::new(vec![6, 64, 6])))
            .build();
        let bedrock = h.to_bedrock(&[dog]);
        assert_eq!(bedrock.len(), 2);
        let knot = bedrock
            .iter()
            .find(|a| a.get_str("identifier") == Some("minecraft:leash_knot"))
            .unwrap();
        let wolf = bedrock
            .iter()
            .find(|a| a.get_str("identifier") == Some("minecraft:wolf"))
            .unwrap();
        assert_eq!(wolf.get_i64("LeasherID"), knot.get_i64("UniqueID"));
        assert_eq!(h.registry.holder_of(h.registry.id_for(5)), knot.get_i64("UniqueID"));

        let java = h.to_java(&bedrock);
        let wolf = java
            .iter()
            .find(|e| e.get_str("id") == Some("minecraft:wolf"))
            .unwrap();
        assert_eq!(wolf.get_int_array("leash"), Some(&[6, 64, 6][..]));
    }

    #[test]
    fn test_knot_in_neighbouring_chunk_is_written_once() {
        let mut h = Harness::new();
        let dog = mob("minecraft:wolf", 5, [15.5, 64.0, 6.5])
            .value("leash", Value::IntArray(IntArray::new(vec![17, 64, 6])))
            .build();
        let here = h.to_bedrock_in(ChunkPos::new(0, 0), &[dog]);
        assert_eq!(here.len(), 1);
        let leasher = here[0].get_i64("LeasherID");
        assert!(leasher.is_some());

        let knot = mob("minecraft:leash_knot", 9, [17.5, 64.25, 6.5]).build();
        let there = h.to_bedrock_in(ChunkPos::new(1, 0), &[knot]);
        assert_eq!(there.len(), 1);
        assert_eq!(there[0].get_str("identifier"), Some("minecraft:leash_knot"));
        assert_eq!(there[0].get_i64("UniqueID"), leasher);
    }

    #[test]
    fn test_player_round_trip_keeps_feet_position_and_armor() {
        let mut stats = Statistics::new();
        let mut maps = BTreeSet::new();
        let mut log = ChunkLog::new(Dimension::Nether, ChunkPos::new(0, 0), &mut stats, &mut maps);
        let helmet = CompoundBuilder::new()
            .string("id", "minecraft:iron_helmet")
            .int("count", 1)
            .byte("Slot", 103)
            .into_value();
        let java = CompoundBuilder::new()
            .value("Pos", doubles([10.5, 70.0, -3.5]))
            .string("Dimension", "minecraft:the_nether")
            .list("Inventory", vec![helmet])
            .build();
        let bedrock = player_to_bedrock(&java, &mut log);
        assert_eq!(bedrock.get_i64("UniqueID"), Some(LOCAL_PLAYER_ID));
        assert_eq!(bedrock.get_i32("DimensionId"), Some(1));
        let head = as_compound(&bedrock.get_list("Armor").unwrap()[0]).unwrap();
        assert_eq!(head.get_str("Name"), Some("minecraft:iron_helmet"));

        let back = player_to_java(&bedrock, 42, &mut log);
        let y = read_vec3(&back, "Pos").unwrap()[1];
        assert!((y - 70.0).abs() < 1e-3);
        assert_eq!(read_java_uuid(&back, "UUID"), Some(42));
        let slots: Vec<i8> = back
            .get_list("Inventory")
            .unwrap()
            .iter()
            .filter_map(as_compound)
            .filter_map(|i| i.get_i8("Slot"))
            .collect();
        assert_eq!(slots, vec![103]);
    }
}
