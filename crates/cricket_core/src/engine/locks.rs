//! Per-key serialization points.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// One mutex per key, created on first use.
///
/// Callers hold the returned handle for as long as they hold the guard:
///
/// ```rust
/// use cricket_core::engine::KeyedLocks;
///
/// let locks: KeyedLocks<u32> = KeyedLocks::new();
/// let slot = locks.slot(7);
/// let _guard = slot.lock();
/// ```
#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Copy> KeyedLocks<K> {
    pub fn new() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }

    pub fn slot(&self, key: K) -> Arc<Mutex<()>> {
        self.slots.lock().entry(key).or_default().clone()
    }

    /// Drop the slot of a key nobody else holds, e.g. once an innings closes.
    pub fn release(&self, key: K) {
        let mut slots = self.slots.lock();
        if slots.get(&key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl<K: Eq + Hash + Copy> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}
