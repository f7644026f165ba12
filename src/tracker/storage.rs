use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::tracker::errors::TrackerError;
use crate::tracker::types::{Mission, Quest, Reward, UserStats};

const TREE_SLOTS: &str = "lifeleveler";

/// Raw byte storage the tracker persists its slots into.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TrackerError>;
    fn put(&self, key: &str, value: &[u8]) -> Result<(), TrackerError>;
    fn contains(&self, key: &str) -> Result<bool, TrackerError>;
}

/// Sled-backed slot storage.
pub struct SledStore {
    _db: sled::Db,
    slots: sled::Tree,
}

impl SledStore {
    /// Open (or create) the database rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TrackerError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let slots = db.open_tree(TREE_SLOTS)?;
        Ok(Self { _db: db, slots })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TrackerError> {
        Ok(self.slots.get(key.as_bytes())?.map(|bytes| bytes.to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), TrackerError> {
        self.slots.insert(key.as_bytes(), value)?;
        self.slots.flush()?;
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool, TrackerError> {
        Ok(self.slots.contains_key(key.as_bytes())?)
    }
}

/// Process-local storage, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, TrackerError> {
        self.entries
            .lock()
            .map_err(|_| TrackerError::Internal("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TrackerError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), TrackerError> {
        self.lock()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool, TrackerError> {
        Ok(self.lock()?.contains_key(key))
    }
}

/// The four persisted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Stats,
    Quests,
    Missions,
    Rewards,
}

impl Slot {
    pub fn key(&self) -> &'static str {
        match self {
            Slot::Stats => "lifeleveler-stats",
            Slot::Quests => "lifeleveler-quests",
            Slot::Missions => "lifeleveler-missions",
            Slot::Rewards => "lifeleveler-rewards",
        }
    }
}

/// Typed JSON slots layered over a [`KeyValueStore`].
pub struct TrackerStore<S: KeyValueStore> {
    kv: S,
}

impl TrackerStore<SledStore> {
    /// Open a sled-backed tracker store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TrackerError> {
        Ok(Self::new(SledStore::open(path)?))
    }
}

impl TrackerStore<MemoryStore> {
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: KeyValueStore> TrackerStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn backend(&self) -> &S {
        &self.kv
    }

    /// Whether `slot` has ever been written.
    pub fn has_slot(&self, slot: Slot) -> Result<bool, TrackerError> {
        self.kv.contains(slot.key())
    }

    /// Read a slot, falling back to `default` when absent, unreadable or malformed.
    pub fn read_or<T: DeserializeOwned>(&self, slot: Slot, default: T) -> T {
        match self.kv.get(slot.key()) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Malformed {} slot, using default: {}", slot.key(), e);
                    default
                }
            },
            Ok(None) => {
                debug!("Slot {} absent, using default", slot.key());
                default
            }
            Err(e) => {
                warn!("Failed to read {} slot, using default: {}", slot.key(), e);
                default
            }
        }
    }

    /// Overwrite a slot with the JSON encoding of `value`.
    pub fn write<T: Serialize + ?Sized>(&self, slot: Slot, value: &T) -> Result<(), TrackerError> {
        let bytes = serde_json::to_vec(value)?;
        self.kv.put(slot.key(), &bytes)
    }

    pub fn get_stats(&self) -> UserStats {
        self.read_or(Slot::Stats, UserStats::default())
    }

    pub fn save_stats(&self, stats: &UserStats) -> Result<(), TrackerError> {
        self.write(Slot::Stats, stats)
    }

    pub fn get_quests(&self) -> Vec<Quest> {
        self.read_or(Slot::Quests, Vec::new())
    }

    pub fn save_quests(&self, quests: &[Quest]) -> Result<(), TrackerError> {
        self.write(Slot::Quests, quests)
    }

    pub fn get_missions(&self) -> Vec<Mission> {
        self.read_or(Slot::Missions, Vec::new())
    }

    pub fn save_missions(&self, missions: &[Mission]) -> Result<(), TrackerError> {
        self.write(Slot::Missions, missions)
    }

    pub fn get_rewards(&self) -> Vec<Reward> {
        self.read_or(Slot::Rewards, Vec::new())
    }

    pub fn save_rewards(&self, rewards: &[Reward]) -> Result<(), TrackerError> {
        self.write(Slot::Rewards, rewards)
    }
}
