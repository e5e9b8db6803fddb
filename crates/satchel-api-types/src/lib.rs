//! Wire types shared by satchel servers and their clients.
//!
//! Every successful API response is an [`Envelope`]; every failure is an
//! [`ErrorBody`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys owned by the envelope itself. Custom metadata never overwrites these.
pub const RESERVED_KEYS: [&str; 3] = ["response", "count", "pagination"];

/// Canonical top-level JSON structure for API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub response: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Caller-supplied fields emitted alongside the reserved keys.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Envelope {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            count: None,
            pagination: None,
            metadata: Map::new(),
        }
    }

    /// Merge metadata at the top level, skipping reserved keys.
    pub fn merge_metadata(&mut self, metadata: &Map<String, Value>) {
        for (key, value) in metadata {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            self.metadata.insert(key.clone(), value.clone());
        }
    }

    pub fn is_singular(&self) -> bool {
        self.count.is_none() && self.pagination.is_none()
    }
}

/// Page metadata for paginated collections.
///
/// `previous` and `next` are omitted on the first and last pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<u64>,
    pub pages: u64,
    pub count: u64,
    pub per_page: u64,
}

impl Pagination {
    pub fn from_page(current: u64, per_page: u64, total: u64) -> Self {
        let pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        let previous = (current > 1).then(|| current - 1);
        let next = (current < pages).then(|| current + 1);

        Self {
            current,
            previous,
            next,
            pages,
            count: total,
            per_page,
        }
    }
}

/// Error payload returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}
