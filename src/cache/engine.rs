//! Fingerprint recording and ETag lookup over a [`KeyStore`].

use std::sync::Arc;

use metrics::counter;
use tracing::debug;

use super::keys::{cache_key_for, fingerprint};
use super::store::{KeyStore, KeyStoreError};
use crate::domain::exposed::Exposed;

pub(crate) const METRIC_ETAG_HIT: &str = "satchel_etag_hit_total";
pub(crate) const METRIC_ETAG_MISS: &str = "satchel_etag_miss_total";
pub(crate) const METRIC_CACHE_RECORD: &str = "satchel_cache_record_total";
pub(crate) const METRIC_CACHE_REMOVE: &str = "satchel_cache_remove_total";

/// Derives keys and ETags for exposed objects, persisting fingerprints in a
/// shared key store.
///
/// Concurrent writers for the same key race last-writer-wins; fingerprints
/// are deterministic in object state, so writers for an unchanged object
/// converge.
#[derive(Clone)]
pub struct CacheEngine {
    store: Arc<dyn KeyStore>,
}

impl CacheEngine {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    pub fn cache_key_for(&self, object: &dyn Exposed) -> String {
        cache_key_for(object)
    }

    /// Fingerprint `object` and store it under its cache key.
    pub fn record(&self, object: &dyn Exposed) -> Result<String, KeyStoreError> {
        let key = cache_key_for(object);
        self.record_as(object, &key)
    }

    /// Fingerprint `object` and store it under `key`, overwriting any prior
    /// value. Returns the stored fingerprint.
    pub fn record_as(&self, object: &dyn Exposed, key: &str) -> Result<String, KeyStoreError> {
        let fingerprint = fingerprint(object);
        self.store.set(key, &fingerprint)?;
        counter!(METRIC_CACHE_RECORD).increment(1);
        debug!(cache_key = key, fingerprint = %fingerprint, "recorded fingerprint");
        Ok(fingerprint)
    }

    /// Forget the fingerprint for `object`. Absent entries are not an error.
    pub fn remove(&self, object: &dyn Exposed) -> Result<(), KeyStoreError> {
        let key = cache_key_for(object);
        self.store.delete(&key)?;
        counter!(METRIC_CACHE_REMOVE).increment(1);
        debug!(cache_key = %key, "removed fingerprint");
        Ok(())
    }

    /// `<key>:<fingerprint>` for `object`, recording a fingerprint first if
    /// none is stored yet.
    pub fn etag_for(&self, object: &dyn Exposed) -> Result<String, KeyStoreError> {
        let key = cache_key_for(object);
        let fingerprint = match self.store.get(&key)? {
            Some(stored) => {
                counter!(METRIC_ETAG_HIT).increment(1);
                stored
            }
            None => {
                counter!(METRIC_ETAG_MISS).increment(1);
                self.record_as(object, &key)?
            }
        };
        Ok(format!("{key}:{fingerprint}"))
    }
}
