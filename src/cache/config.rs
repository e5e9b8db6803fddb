//! Cache configuration.
//!
//! Derived from the `[caching]` settings section; sizes the in-memory key
//! store. Whether responses carry cache headers is decided per controller.

use std::num::NonZeroUsize;

const DEFAULT_STORE_LIMIT: usize = 10_000;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum fingerprints kept by the in-memory key store.
    pub store_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store_limit: DEFAULT_STORE_LIMIT,
        }
    }
}

impl From<&crate::config::CachingSettings> for CacheConfig {
    fn from(settings: &crate::config::CachingSettings) -> Self {
        Self {
            store_limit: settings.store_limit.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the store limit as NonZeroUsize, clamping to 1 if zero.
    pub fn store_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.store_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
