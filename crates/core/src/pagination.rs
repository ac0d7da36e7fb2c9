//! Page slicing for listed tasks
//!
//! Pages are cut from the full list after it has been retrieved (and
//! cached). The store query is never paginated.

use crate::task::ValidationError;

/// Bounds for `itemsPerPage`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_items_per_page: usize,
    pub max_items_per_page: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_items_per_page: 10,
            max_items_per_page: 100,
        }
    }
}

/// A validated, one-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    items_per_page: usize,
}

impl PageRequest {
    /// Build a page request from optional query values, falling back to defaults
    pub fn new(
        page: Option<usize>,
        items_per_page: Option<usize>,
        limits: PageLimits,
    ) -> Result<Self, ValidationError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ValidationError::new("page", "Page numbers start at 1"));
        }

        let items_per_page = items_per_page.unwrap_or(limits.default_items_per_page);
        if items_per_page == 0 || items_per_page > limits.max_items_per_page {
            return Err(ValidationError::new(
                "itemsPerPage",
                format!(
                    "Items per page must be between 1 and {}",
                    limits.max_items_per_page
                ),
            ));
        }

        Ok(Self {
            page,
            items_per_page,
        })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    /// The part of `items` that falls on this page; empty past the end
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page - 1)
            .saturating_mul(self.items_per_page)
            .min(items.len());
        let end = start.saturating_add(self.items_per_page).min(items.len());
        &items[start..end]
    }
}
