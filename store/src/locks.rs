//! Striped per-key mutual exclusion.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use crate::StoreError;

/// Default number of lock stripes.
pub const DEFAULT_STRIPES: usize = 64;

/// Serializes critical sections per key.
///
/// Keys hash onto a fixed set of stripes, so memory stays bounded no matter
/// how many keys are seen. Two keys sharing a stripe merely wait for each
/// other. Critical sections are synchronous closures and cannot hold a lock
/// across an `.await`.
pub struct KeyedLocks {
    stripes: Vec<Mutex<()>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::with_stripes(DEFAULT_STRIPES)
    }

    pub fn with_stripes(count: usize) -> Self {
        let count = count.max(1);
        Self {
            stripes: (0..count).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_lock<K, R>(&self, key: &K, f: impl FnOnce() -> R) -> Result<R, StoreError>
    where
        K: Hash + ?Sized,
    {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.stripes.len();
        let _guard = self.stripes[index]
            .lock()
            .map_err(|_| StoreError::poisoned())?;
        Ok(f())
    }
}

impl Default for KeyedLocks {
    fn default() -> Self {
        Self::new()
    }
}
