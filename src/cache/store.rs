//! Key store holding cache-key → fingerprint records.
//!
//! [`KeyStore`] is the seam to an external key-value cache. [`MemoryKeyStore`]
//! is the bundled bounded in-process implementation.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lru::LruCache;
use metrics::gauge;
use thiserror::Error;
use tracing::warn;

use super::config::CacheConfig;

type Entries = LruCache<String, String>;
pub(crate) const METRIC_STORE_ENTRIES: &str = "satchel_key_store_entries";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyStoreError {
    #[error("key store `{op}` failed: {message}")]
    Operation { op: &'static str, message: String },
}

impl KeyStoreError {
    pub fn operation(op: &'static str, message: impl Into<String>) -> Self {
        Self::Operation {
            op,
            message: message.into(),
        }
    }
}

/// External key-value persistence for fingerprints.
///
/// Only per-key linearizability is assumed. Deleting an absent key succeeds.
pub trait KeyStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), KeyStoreError>;
    fn delete(&self, key: &str) -> Result<(), KeyStoreError>;
}

/// In-memory LRU key store.
pub struct MemoryKeyStore {
    entries: RwLock<Entries>,
}

impl MemoryKeyStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.store_limit_non_zero())),
        }
    }

    pub fn len(&self) -> usize {
        self.read("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.write("clear").clear();
        gauge!(METRIC_STORE_ENTRIES).set(0.0);
    }

    fn read(&self, op: &'static str) -> RwLockReadGuard<'_, Entries> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| recover(poisoned, op, "rwlock.read"))
    }

    /// LRU lookups reorder entries, so `get` needs the write half too.
    fn write(&self, op: &'static str) -> RwLockWriteGuard<'_, Entries> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| recover(poisoned, op, "rwlock.write"))
    }
}

/// Records are replaced whole, so a poisoned map holds no torn entries.
fn recover<G>(poisoned: PoisonError<G>, op: &'static str, lock_kind: &'static str) -> G {
    warn!(
        op,
        target_module = "cache::store",
        lock_kind,
        result = "poisoned_recovered",
        "Recovered from poisoned key store lock"
    );
    poisoned.into_inner()
}

impl Default for MemoryKeyStore {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError> {
        Ok(self.write("get").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyStoreError> {
        let mut entries = self.write("set");
        entries.put(key.to_string(), value.to_string());
        gauge!(METRIC_STORE_ENTRIES).set(entries.len() as f64);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KeyStoreError> {
        let mut entries = self.write("delete");
        entries.pop(key);
        gauge!(METRIC_STORE_ENTRIES).set(entries.len() as f64);
        Ok(())
    }
}
