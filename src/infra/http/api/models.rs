use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::exposed::{Exposed, HasCacheKey, HasHashConversion, HasIdentity, HasNewFlag};

/// In-memory resource served by the demo API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Widget {
    pub id: u64,
    pub name: String,
    pub revision: u64,
}

impl Widget {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            revision: 1,
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.revision += 1;
    }
}

impl Exposed for Widget {
    fn type_name(&self) -> &str {
        "Widget"
    }

    fn as_identity(&self) -> Option<&dyn HasIdentity> {
        Some(self)
    }

    fn as_new_flag(&self) -> Option<&dyn HasNewFlag> {
        Some(self)
    }

    fn as_cache_key(&self) -> Option<&dyn HasCacheKey> {
        Some(self)
    }

    fn as_hash_conversion(&self) -> Option<&dyn HasHashConversion> {
        Some(self)
    }
}

impl HasIdentity for Widget {
    fn identity(&self) -> String {
        self.id.to_string()
    }
}

impl HasNewFlag for Widget {
    fn is_new(&self) -> bool {
        self.id == 0
    }
}

impl HasCacheKey for Widget {
    fn cache_key(&self) -> Option<String> {
        Some(format!("widgets/{}-{}", self.id, self.revision))
    }
}

impl HasHashConversion for Widget {
    fn to_hash(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::from(self.id));
        map.insert("name".to_string(), Value::from(self.name.clone()));
        map.insert("revision".to_string(), Value::from(self.revision));
        map
    }
}

#[derive(Debug, Deserialize)]
pub struct EchoQuery {
    pub echo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Body of create and update requests.
#[derive(Debug, Deserialize)]
pub struct WidgetRequest {
    pub name: String,
}
