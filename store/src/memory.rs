//! Sharded in-memory backend.

use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

use crate::{KeyedStore, StoreError};

/// Default number of shards.
pub const DEFAULT_SHARDS: usize = 16;

/// An in-memory store split across independently locked shards.
///
/// Each key lives in exactly one shard, so single-key operations only contend
/// with keys that hash to the same shard.
pub struct ShardedStore<K, V> {
    shards: Vec<Mutex<HashMap<K, V>>>,
}

impl<K: Hash + Eq, V> ShardedStore<K, V> {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    pub fn with_shards(count: usize) -> Self {
        let count = count.max(1);
        Self {
            shards: (0..count).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, key: &K) -> Result<MutexGuard<'_, HashMap<K, V>>, StoreError> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();
        self.shards[index].lock().map_err(|_| StoreError::poisoned())
    }
}

impl<K: Hash + Eq, V> Default for ShardedStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> KeyedStore<K, V> for ShardedStore<K, V>
where
    K: Hash + Eq + Send,
    V: Clone + PartialEq + Send,
{
    fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        Ok(self.shard(key)?.get(key).cloned())
    }

    fn put(&self, key: K, value: V) -> Result<(), StoreError> {
        self.shard(&key)?.insert(key, value);
        Ok(())
    }

    fn insert_if_absent(&self, key: K, value: V) -> Result<Option<V>, StoreError> {
        let mut shard = self.shard(&key)?;
        match shard.entry(key) {
            Entry::Occupied(existing) => Ok(Some(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(None)
            }
        }
    }

    fn compare_and_swap(&self, key: K, expected: Option<&V>, new: V) -> Result<bool, StoreError> {
        let mut shard = self.shard(&key)?;
        if shard.get(&key) != expected {
            return Ok(false);
        }
        shard.insert(key, new);
        Ok(true)
    }

    fn remove(&self, key: &K) -> Result<Option<V>, StoreError> {
        Ok(self.shard(key)?.remove(key))
    }

    fn len(&self) -> Result<usize, StoreError> {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.lock().map_err(|_| StoreError::poisoned())?.len();
        }
        Ok(total)
    }
}
