//! Stable 64-bit actor ids for the entities of one run.
//!
//! Java identifies entities by UUID, Bedrock by a signed 64-bit `UniqueID`.
//! Ids are derived by hashing the source identity with a fixed seed, so the
//! same world converts to the same ids every time. A candidate that already
//! belongs to another identity is hashed again until a free one turns up.

use crate::coords::{BlockPos, Dimension};
use crate::nbt_utils::{Compound, CompoundExt};
use fastnbt::{IntArray, Value};
use fnv::{FnvHashMap, FnvHasher};
use std::hash::Hasher;
use std::sync::{Mutex, PoisonError};

pub const DEFAULT_SEED: u64 = 0x6a09_e667_f3bc_c908;

/// `UniqueID` Bedrock gives the local player.
pub const LOCAL_PLAYER_ID: i64 = -4_294_967_295;

/// What an id was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    Uuid(u128),
    /// Integer id of an edition without UUIDs.
    Legacy(i64),
    /// The leash knot on the fence at this position.
    LeashKnot(Dimension, BlockPos),
}

impl SourceId {
    fn write_to(self, hasher: &mut FnvHasher) {
        match self {
            SourceId::Uuid(uuid) => {
                hasher.write_u8(0);
                hasher.write(&uuid.to_be_bytes());
            }
            SourceId::Legacy(id) => {
                hasher.write_u8(1);
                hasher.write(&id.to_le_bytes());
            }
            SourceId::LeashKnot(dimension, at) => {
                hasher.write_u8(2);
                hasher.write_i32(dimension.bedrock_id());
                hasher.write_i32(at.x);
                hasher.write_i32(at.y);
                hasher.write_i32(at.z);
            }
        }
    }
}

#[derive(Default)]
struct RegistryState {
    ids: FnvHashMap<SourceId, i64>,
    owners: FnvHashMap<i64, SourceId>,
    leash_holders: FnvHashMap<i64, i64>,
}

/// Per-run id service. Shared by reference between workers.
pub struct IdRegistry {
    seed: u64,
    state: Mutex<RegistryState>,
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Bedrock id for a Java entity UUID. Repeated calls return the same id.
    pub fn id_for(&self, uuid: u128) -> i64 {
        self.assign(SourceId::Uuid(uuid))
    }

    pub fn id_for_legacy(&self, legacy: i64) -> i64 {
        self.assign(SourceId::Legacy(legacy))
    }

    /// Id of the leash knot at `at`, allocated on first use. The knot keeps
    /// this id whichever chunk it is converted from.
    pub fn leash_knot_id(&self, dimension: Dimension, at: BlockPos) -> i64 {
        self.assign(SourceId::LeashKnot(dimension, at))
    }

    /// Ties entity `entity_id` to the knot at `at` and returns the knot's id.
    pub fn leash_holder_id(&self, entity_id: i64, dimension: Dimension, at: BlockPos) -> i64 {
        let holder = self.leash_knot_id(dimension, at);
        self.lock().leash_holders.insert(entity_id, holder);
        holder
    }

    /// Holder previously allocated by [`IdRegistry::leash_holder_id`].
    pub fn holder_of(&self, entity_id: i64) -> Option<i64> {
        self.lock().leash_holders.get(&entity_id).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Java UUID for a Bedrock `UniqueID`. The low half is the id itself, so
    /// distinct ids never share a UUID.
    pub fn uuid_for(&self, bedrock_id: i64) -> u128 {
        let mut hasher = FnvHasher::with_key(self.seed);
        SourceId::Legacy(bedrock_id).write_to(&mut hasher);
        (u128::from(hasher.finish()) << 64) | u128::from(bedrock_id as u64)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn first_candidate(&self, source: SourceId) -> i64 {
        let mut hasher = FnvHasher::with_key(self.seed);
        source.write_to(&mut hasher);
        hasher.finish() as i64
    }

    fn rehash(&self, candidate: i64) -> i64 {
        let mut hasher = FnvHasher::with_key(self.seed);
        hasher.write(&candidate.to_le_bytes());
        hasher.finish() as i64
    }

    fn is_reserved(id: i64) -> bool {
        matches!(id, 0 | -1 | LOCAL_PLAYER_ID)
    }

    fn assign(&self, source: SourceId) -> i64 {
        let mut candidate = self.first_candidate(source);
        let mut state = self.lock();
        if let Some(&id) = state.ids.get(&source) {
            return id;
        }
        while Self::is_reserved(candidate) || state.owners.contains_key(&candidate) {
            candidate = self.rehash(candidate);
        }
        state.ids.insert(source, candidate);
        state.owners.insert(candidate, source);
        candidate
    }
}

/// Reads an entity UUID in either Java layout: the 1.16+ four-int array or
/// the older most/least pair.
pub fn read_java_uuid(tag: &Compound, key: &str) -> Option<u128> {
    if let Some(ints) = tag.get_int_array(key) {
        if ints.len() == 4 {
            return Some(
                ints.iter()
                    .fold(0u128, |acc, &part| (acc << 32) | u128::from(part as u32)),
            );
        }
    }
    let most = tag.get_i64(&format!("{key}Most"))?;
    let least = tag.get_i64(&format!("{key}Least"))?;
    Some((u128::from(most as u64) << 64) | u128::from(least as u64))
}

pub fn java_uuid_value(uuid: u128) -> Value {
    let parts = (0..4)
        .map(|i| (uuid >> (96 - 32 * i)) as u32 as i32)
        .collect();
    Value::IntArray(IntArray::new(parts))
}

/// Hyphenated lower-case form, as used for `playerdata/` file names.
pub fn format_uuid(uuid: u128) -> String {
    let hex = format!("{uuid:032x}");
    format!(
        "{}-{}-{}-{}-{}",
        &hex[..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..]
    )
}

/// Parses a UUID with or without hyphens.
pub fn parse_uuid(text: &str) -> Option<u128> {
    let hex: String = text.trim().chars().filter(|c| *c != '-').collect();
    if hex.len() != 32 {
        return None;
    }
    u128::from_str_radix(&hex, 16).ok()
}
