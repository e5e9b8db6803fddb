//! Satchel cache system
//!
//! Derives cache keys and fingerprints for exposed objects, persists them in a
//! [`KeyStore`], and turns them into ETags for conditional responses.
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `satchel.toml`:
//!
//! ```toml
//! [caching]
//! enabled = true
//! max_age_secs = 900   # Cache-Control for cached collections
//! store_limit = 10000
//! ```

mod config;
mod engine;
mod keys;
mod store;

pub use config::CacheConfig;
pub use engine::CacheEngine;
pub use keys::{EntityTag, cache_key_for, fingerprint, hexdigest, normalise_etag};
pub use store::{KeyStore, KeyStoreError, MemoryKeyStore};
