//! Per-key mutual exclusion.
//!
//! Movements on the same (material, warehouse) read a balance and append
//! against it; holding the key lock across both keeps that pair serialized.
//! Different keys never contend.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

#[derive(Debug)]
pub struct KeyedLocks<K> {
    inner: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with<R>(&self, key: &K, f: impl FnOnce() -> R) -> Result<R, StoreError> {
        let slot = {
            let mut map = self
                .inner
                .lock()
                .map_err(|_| StoreError::LockPoisoned("keyed locks"))?;
            map.entry(key.clone()).or_default().clone()
        };

        // A panic inside `f` poisons only this key; the guarded data is `()`.
        let _guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(f())
    }

    /// Drop every idle lock entry.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| StoreError::LockPoisoned("keyed locks"))?;
        map.retain(|_, slot| Arc::strong_count(slot) > 1);
        Ok(())
    }
}
