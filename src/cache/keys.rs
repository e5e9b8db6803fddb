//! Cache key, fingerprint and ETag derivation.
//!
//! Keys and fingerprints are 32-character lowercase MD5 hex digests. Clients
//! echo ETags back in `If-None-Match`, so the format must stay stable across
//! processes and releases.

use std::fmt::Display;

use md5::{Digest, Md5};

use crate::domain::exposed::Exposed;

/// Lowercase hex MD5 digest of `input`.
pub fn hexdigest(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Stable key identifying `object` in the key store.
///
/// Uses the explicit object-key hint when present, then `Type/new` or
/// `Type/<identity>`. Objects without an identity fall back to their
/// inspection string.
pub fn cache_key_for(object: &dyn Exposed) -> String {
    if let Some(hint) = object.as_object_key() {
        return hexdigest(&hint.object_key());
    }

    let type_name = object.type_name();
    if object.as_new_flag().is_some_and(|flag| flag.is_new()) {
        return hexdigest(&format!("{type_name}/new"));
    }

    let identity = match object.as_identity() {
        Some(identity) => identity.identity(),
        None => object.inspect(),
    };
    hexdigest(&format!("{type_name}/{identity}"))
}

/// Content fingerprint: the digest of the object's own cache key, or of its
/// inspection string when it has none.
pub fn fingerprint(object: &dyn Exposed) -> String {
    let source = object
        .as_cache_key()
        .and_then(|capability| capability.cache_key())
        .unwrap_or_else(|| object.inspect());
    hexdigest(&source)
}

/// Quote a value for use as an `ETag` header.
pub fn normalise_etag(value: impl Display) -> String {
    format!("\"{value}\"")
}

/// ETag of the form `<key>:<fingerprint>` as produced by `etag_for`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag {
    pub key: String,
    pub fingerprint: String,
}

impl EntityTag {
    /// Parse one quoted or bare tag. Weak validators and `*` never match.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.starts_with("W/") || raw == "*" {
            return None;
        }
        let unquoted = raw
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(raw);
        let (key, fingerprint) = unquoted.split_once(':')?;
        if key.is_empty() || fingerprint.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            fingerprint: fingerprint.to_string(),
        })
    }

    /// Every strong tag listed in an `If-None-Match` header value.
    pub fn parse_list(header: &str) -> Vec<Self> {
        header.split(',').filter_map(Self::parse).collect()
    }
}

impl Display for EntityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.key, self.fingerprint)
    }
}
