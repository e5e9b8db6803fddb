use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::cache::{CacheConfig, CacheEngine, MemoryKeyStore};
use crate::config::CachingSettings;

use super::models::Widget;

#[derive(Clone)]
pub struct ApiState {
    pub widgets: Arc<WidgetStore>,
    pub cache: CacheEngine,
}

impl ApiState {
    pub fn new(cache: CacheEngine) -> Self {
        Self {
            widgets: Arc::new(WidgetStore::default()),
            cache,
        }
    }

    /// State backed by an in-memory key store sized from `settings`.
    pub fn from_settings(settings: &CachingSettings) -> Self {
        let config = CacheConfig::from(settings);
        let store = Arc::new(MemoryKeyStore::new(&config));
        Self::new(CacheEngine::new(store))
    }
}

/// Concurrent in-memory widget table.
#[derive(Default)]
pub struct WidgetStore {
    rows: DashMap<u64, Widget>,
    next_id: AtomicU64,
}

impl WidgetStore {
    pub fn insert(&self, name: impl Into<String>) -> Widget {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let widget = Widget::new(id, name);
        self.rows.insert(id, widget.clone());
        widget
    }

    pub fn get(&self, id: u64) -> Option<Widget> {
        self.rows.get(&id).map(|row| row.clone())
    }

    /// All widgets ordered by id.
    pub fn list(&self) -> Vec<Widget> {
        let mut widgets: Vec<Widget> = self.rows.iter().map(|row| row.value().clone()).collect();
        widgets.sort_by_key(|widget| widget.id);
        widgets
    }

    pub fn rename(&self, id: u64, name: &str) -> Option<Widget> {
        let mut row = self.rows.get_mut(&id)?;
        row.rename(name);
        Some(row.clone())
    }

    pub fn remove(&self, id: u64) -> Option<Widget> {
        self.rows.remove(&id).map(|(_, widget)| widget)
    }
}
