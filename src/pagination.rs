//! This modules defines the common functionality for paging data.

/// The config for pagination
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// A page number and page size after defaults and limits have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The one-based page number.
    pub number: u64,
    /// The number of items on a page.
    pub size: u64,
}

impl Page {
    /// The number of items to skip to reach this page.
    ///
    /// Saturates instead of overflowing for absurdly large page numbers.
    pub fn offset(&self) -> u64 {
        self.number.saturating_sub(1).saturating_mul(self.size)
    }
}

impl PaginationConfig {
    /// Apply defaults to a requested page and clamp it into the allowed range.
    ///
    /// Page numbers below 1 become 1 and page sizes are clamped to
    /// `1..=max_page_size`.
    pub fn resolve(&self, page: Option<u64>, page_size: Option<u64>) -> Page {
        let number = page.unwrap_or(self.default_page).max(1);
        let size = page_size
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1));

        Page { number, size }
    }
}

/// The number of pages needed to show `item_count` items, `page_size` at a time.
pub fn page_count(item_count: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }

    item_count.div_ceil(page_size)
}
