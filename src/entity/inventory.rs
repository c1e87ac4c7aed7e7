//! Item lists shared by containers, item entities and the player.

use crate::nbt_utils::{as_compound, CompoundExt};
use crate::stats::{anomaly, ChunkLog};
use crate::translation::items;
use fastnbt::Value;

/// Slot layout of the target container.
#[derive(Clone, Copy)]
pub struct SlotLayout {
    /// Slots the target has. `None` for lists without fixed slots.
    pub capacity: Option<i8>,
    /// Source slot to target slot. `None` means the slot has no counterpart.
    pub remap: fn(i8) -> Option<i8>,
}

impl SlotLayout {
    pub const fn fixed(capacity: i8) -> Self {
        Self {
            capacity: Some(capacity),
            remap: Some,
        }
    }

    pub const UNBOUNDED: SlotLayout = SlotLayout {
        capacity: None,
        remap: Some,
    };

    fn place(&self, slot: i8) -> Option<i8> {
        let target = (self.remap)(slot)?;
        match self.capacity {
            Some(capacity) if !(0..capacity).contains(&target) => None,
            _ => Some(target),
        }
    }
}

/// Java stacks to Bedrock stacks. `owner` names the container in error messages.
pub fn items_to_bedrock(
    list: &[Value],
    layout: SlotLayout,
    owner: &str,
    log: &mut ChunkLog<'_>,
) -> Vec<Value> {
    let mut out = Vec::with_capacity(list.len());
    for item in list.iter().filter_map(as_compound) {
        let Some(id) = item.get_str("id") else {
            dropped(log, owner);
            continue;
        };
        if let Some(map_id) = items::java_item_map_id(item) {
            log.saw_map(map_id);
        }
        let Some(converted) = items::item_stack_to_bedrock(item) else {
            if !is_empty_slot(id) {
                dropped(log, owner);
            }
            continue;
        };
        if !converted.known {
            log.count(anomaly::UNKNOWN_ITEMS);
        }
        let mut stack = converted.value;
        if let Some(slot) = item.get_i8("Slot") {
            let Some(target) = layout.place(slot) else {
                overflow(log, owner, slot);
                continue;
            };
            stack.insert("Slot".to_string(), Value::Byte(target));
        }
        out.push(Value::Compound(stack));
    }
    out
}

/// Bedrock stacks to Java stacks.
pub fn items_to_java(
    list: &[Value],
    layout: SlotLayout,
    owner: &str,
    log: &mut ChunkLog<'_>,
) -> Vec<Value> {
    let mut out = Vec::with_capacity(list.len());
    for item in list.iter().filter_map(as_compound) {
        let Some(name) = item.get_str("Name") else {
            dropped(log, owner);
            continue;
        };
        if let Some(map_id) = items::bedrock_item_map_id(item) {
            log.saw_map(map_id);
        }
        let Some(converted) = items::item_stack_to_java(item) else {
            if !is_empty_slot(name) {
                dropped(log, owner);
            }
            continue;
        };
        if !converted.known {
            log.count(anomaly::UNKNOWN_ITEMS);
        }
        let mut stack = converted.value;
        if let Some(slot) = item.get_i8("Slot") {
            let Some(target) = layout.place(slot) else {
                overflow(log, owner, slot);
                continue;
            };
            stack.insert("Slot".to_string(), Value::Byte(target));
        }
        out.push(Value::Compound(stack));
    }
    out
}

/// Bedrock writes empty slots as stacks named `""` or air.
fn is_empty_slot(id: &str) -> bool {
    matches!(id, "" | "air" | "minecraft:air")
}

fn dropped(log: &mut ChunkLog<'_>, owner: &str) {
    log.count(anomaly::DROPPED_ITEMS);
    log.error(format!("{owner}: item without a convertible id was dropped"));
}

fn overflow(log: &mut ChunkLog<'_>, owner: &str, slot: i8) {
    log.count(anomaly::CONTAINER_OVERFLOW);
    log.error(format!("{owner}: item in slot {slot} has no slot in the target container"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{ChunkPos, Dimension};
    use crate::nbt_utils::CompoundBuilder;
    use crate::stats::Statistics;
    use std::collections::BTreeSet;

    fn stack(id: &str, slot: i8) -> Value {
        CompoundBuilder::new()
            .string("id", id)
            .int("count", 2)
            .byte("Slot", slot)
            .into_value()
    }

    #[test]
    fn test_overflowing_slots_are_counted_and_reported() {
        let mut stats = Statistics::new();
        let mut maps = BTreeSet::new();
        let mut log = ChunkLog::new(Dimension::Overworld, ChunkPos::new(0, 0), &mut stats, &mut maps);
        let items = vec![stack("minecraft:stone", 0), stack("minecraft:dirt", 7)];
        let out = items_to_bedrock(&items, SlotLayout::fixed(5), "hopper at 1 2 3", &mut log);
        assert_eq!(out.len(), 1);
        assert_eq!(stats.anomaly(anomaly::CONTAINER_OVERFLOW), 1);
        assert!(stats.errors[0].message.contains("slot 7"));
    }

    #[test]
    fn test_items_without_id_are_counted() {
        let mut stats = Statistics::new();
        let mut maps = BTreeSet::new();
        let mut log = ChunkLog::new(Dimension::Overworld, ChunkPos::new(0, 0), &mut stats, &mut maps);
        let nameless = CompoundBuilder::new().int("count", 3).byte("Slot", 1).into_value();
        let java = vec![
            stack("minecraft:stone", 0),
            nameless.clone(),
            stack("minecraft:air", 2),
            stack("somemod:gizmo", 4),
        ];
        assert_eq!(items_to_bedrock(&java, SlotLayout::fixed(27), "chest", &mut log).len(), 1);

        let empty_slot = CompoundBuilder::new()
            .string("Name", "")
            .byte("Count", 0)
            .byte("Slot", 3)
            .into_value();
        let bedrock = vec![nameless, empty_slot];
        assert!(items_to_java(&bedrock, SlotLayout::fixed(27), "chest", &mut log).is_empty());
        assert_eq!(stats.anomaly(anomaly::DROPPED_ITEMS), 3);
        assert_eq!(stats.errors.len(), 3);
    }

    #[test]
    fn test_unbounded_lists_keep_every_item() {
        let mut stats = Statistics::new();
        let mut maps = BTreeSet::new();
        let mut log = ChunkLog::new(Dimension::Overworld, ChunkPos::new(0, 0), &mut stats, &mut maps);
        let items = vec![stack("minecraft:stone", 0), stack("minecraft:dirt", 100)];
        let bedrock = items_to_bedrock(&items, SlotLayout::UNBOUNDED, "player", &mut log);
        let java = items_to_java(&bedrock, SlotLayout::UNBOUNDED, "player", &mut log);
        assert_eq!(java.len(), 2);
        assert!(stats.errors.is_empty());
    }
}
