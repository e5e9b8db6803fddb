//! Paginated collection of exposable items.

use super::exposed::{Exposed, IsEnumerable, IsPaginated};

/// One page of a larger result set.
///
/// `current_page` is 1-based; `total_entries` counts every entry across all
/// pages, not just the ones held here.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u64,
    pub per_page: u64,
    pub total_entries: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, current_page: u64, per_page: u64, total_entries: u64) -> Self {
        Self {
            items,
            current_page,
            per_page,
            total_entries,
        }
    }

    /// Slice `source` into the requested page. Pages below 1 are treated as 1.
    pub fn paginate(source: Vec<T>, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        let total_entries = source.len() as u64;
        let skip = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);
        let take = usize::try_from(per_page).unwrap_or(usize::MAX);
        let items = source.into_iter().skip(skip).take(take).collect();

        Self::new(items, page, per_page, total_entries)
    }
}

impl<T: Exposed> Exposed for Page<T> {
    fn type_name(&self) -> &str {
        "Page"
    }

    fn as_enumerable(&self) -> Option<&dyn IsEnumerable> {
        Some(self)
    }

    fn as_paginated(&self) -> Option<&dyn IsPaginated> {
        Some(self)
    }
}

impl<T: Exposed> IsEnumerable for Page<T> {
    fn items(&self) -> Vec<&dyn Exposed> {
        self.items.iter().map(|item| item as &dyn Exposed).collect()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T: Exposed> IsPaginated for Page<T> {
    fn current_page(&self) -> u64 {
        self.current_page
    }

    fn per_page(&self) -> u64 {
        self.per_page
    }

    fn total_entries(&self) -> u64 {
        self.total_entries
    }
}
