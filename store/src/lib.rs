//! Keyed record storage for the attest pipeline.
//!
//! Registries depend only on the [`KeyedStore`] trait. The in-memory
//! [`ShardedStore`] is the default backend; a persistent backend can be
//! swapped in without touching registry logic. Multi-step transitions that
//! must be atomic per key (claim a slot, then record it) run under
//! [`KeyedLocks`].

pub mod error;
pub mod locks;
pub mod memory;

pub use error::StoreError;
pub use locks::KeyedLocks;
pub use memory::ShardedStore;

/// A keyed record store.
///
/// Every method is atomic with respect to the key it touches. Operations that
/// span several keys need an external [`KeyedLocks`] guard.
pub trait KeyedStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Result<Option<V>, StoreError>;

    /// Insert or overwrite.
    fn put(&self, key: K, value: V) -> Result<(), StoreError>;

    /// Insert only if the key is vacant.
    ///
    /// Returns the value already stored when the key is occupied, in which
    /// case nothing is written.
    fn insert_if_absent(&self, key: K, value: V) -> Result<Option<V>, StoreError>;

    /// Replace the stored value with `new` only if it currently equals
    /// `expected` (`None` meaning vacant). Returns whether the swap happened.
    fn compare_and_swap(&self, key: K, expected: Option<&V>, new: V) -> Result<bool, StoreError>;

    fn remove(&self, key: &K) -> Result<Option<V>, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|n| n == 0)
    }
}
