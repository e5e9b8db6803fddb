//! Capabilities an exposed object may offer to the envelope builder and the
//! cache key engine.
//!
//! Objects are never inspected by concrete type. Each capability is a small
//! trait, and [`Exposed`] provides one probe per capability returning
//! `Some(self)` when the object supports it. Probes default to `None`, so an
//! implementor opts into exactly the capabilities it has:
//!
//! ```ignore
//! impl Exposed for Widget {
//!     fn type_name(&self) -> &str { "Widget" }
//!     fn as_identity(&self) -> Option<&dyn HasIdentity> { Some(self) }
//!     fn as_hash_conversion(&self) -> Option<&dyn HasHashConversion> { Some(self) }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::error::ExposeError;

/// Stable identity of a persisted object.
pub trait HasIdentity {
    fn identity(&self) -> String;
}

/// Whether the object has been persisted yet.
pub trait HasNewFlag {
    fn is_new(&self) -> bool;
}

/// Explicit cache-key hint, preferred over type name and identity.
pub trait HasObjectKey {
    fn object_key(&self) -> String;
}

/// Content version marker. `None` means the object cannot describe its own
/// version and its debug representation is fingerprinted instead.
pub trait HasCacheKey {
    fn cache_key(&self) -> Option<String>;
}

/// Serializer attached to the object's own type.
pub trait HasNativeSerializer {
    fn native_serializer(&self) -> Arc<dyn Serializer>;
}

pub trait HasHashConversion {
    fn to_hash(&self) -> Map<String, Value>;
}

/// Generic JSON conversion, the last step of the conversion chain.
pub trait HasJsonConversion {
    fn to_json(&self) -> Result<Value, ExposeError>;
}

/// Ordered sequence of items.
pub trait IsEnumerable {
    fn items(&self) -> Vec<&dyn Exposed>;

    fn len(&self) -> usize {
        self.items().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sequence carrying page metadata.
pub trait IsPaginated: IsEnumerable {
    fn current_page(&self) -> u64;
    fn per_page(&self) -> u64;
    fn total_entries(&self) -> u64;
}

/// Converts an object into envelope data, replacing every built-in conversion.
pub trait Serializer: Send + Sync {
    fn serialize(&self, object: &dyn Exposed) -> Result<Value, ExposeError>;
}

impl<F> Serializer for F
where
    F: Fn(&dyn Exposed) -> Result<Value, ExposeError> + Send + Sync,
{
    fn serialize(&self, object: &dyn Exposed) -> Result<Value, ExposeError> {
        self(object)
    }
}

/// An application value handed to the response layer.
///
/// `Debug` output doubles as the inspection string fingerprinted for objects
/// without a [`HasCacheKey`] capability.
pub trait Exposed: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    fn as_identity(&self) -> Option<&dyn HasIdentity> {
        None
    }

    fn as_new_flag(&self) -> Option<&dyn HasNewFlag> {
        None
    }

    fn as_object_key(&self) -> Option<&dyn HasObjectKey> {
        None
    }

    fn as_cache_key(&self) -> Option<&dyn HasCacheKey> {
        None
    }

    fn as_native_serializer(&self) -> Option<&dyn HasNativeSerializer> {
        None
    }

    fn as_hash_conversion(&self) -> Option<&dyn HasHashConversion> {
        None
    }

    fn as_json_conversion(&self) -> Option<&dyn HasJsonConversion> {
        None
    }

    fn as_enumerable(&self) -> Option<&dyn IsEnumerable> {
        None
    }

    fn as_paginated(&self) -> Option<&dyn IsPaginated> {
        None
    }

    /// Debug-inspection string.
    fn inspect(&self) -> String {
        format!("{self:?}")
    }
}

// ============================================================================
// serde_json::Value
// ============================================================================

impl Exposed for Value {
    fn type_name(&self) -> &str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
        }
    }

    fn as_identity(&self) -> Option<&dyn HasIdentity> {
        match self {
            Value::Object(map) if map.get("id").is_some_and(|id| !id.is_null()) => Some(self),
            _ => None,
        }
    }

    fn as_hash_conversion(&self) -> Option<&dyn HasHashConversion> {
        self.is_object().then_some(self as &dyn HasHashConversion)
    }

    fn as_json_conversion(&self) -> Option<&dyn HasJsonConversion> {
        Some(self)
    }

    fn as_enumerable(&self) -> Option<&dyn IsEnumerable> {
        self.is_array().then_some(self as &dyn IsEnumerable)
    }
}

impl HasIdentity for Value {
    fn identity(&self) -> String {
        match self.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

impl HasHashConversion for Value {
    fn to_hash(&self) -> Map<String, Value> {
        self.as_object().cloned().unwrap_or_default()
    }
}

impl HasJsonConversion for Value {
    fn to_json(&self) -> Result<Value, ExposeError> {
        Ok(self.clone())
    }
}

impl IsEnumerable for Value {
    fn items(&self) -> Vec<&dyn Exposed> {
        match self {
            Value::Array(values) => values.iter().map(|value| value as &dyn Exposed).collect(),
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// Vec<T>
// ============================================================================

impl<T: Exposed> Exposed for Vec<T> {
    fn type_name(&self) -> &str {
        "Vec"
    }

    fn as_enumerable(&self) -> Option<&dyn IsEnumerable> {
        Some(self)
    }
}

impl<T: Exposed> IsEnumerable for Vec<T> {
    fn items(&self) -> Vec<&dyn Exposed> {
        self.iter().map(|item| item as &dyn Exposed).collect()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}
