//! Page arithmetic for the ad listing.

use serde::Serialize;

/// Slice of the ordered ad collection to fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    /// `None` fetches everything from `offset`
    pub limit: Option<u64>,
}

impl PageWindow {
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }
}

/// A 1-based page over `total` items. Without a page size there is a single page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Paginator {
    pub page: u64,
    pub per_page: Option<u64>,
    pub total: u64,
    pub pages: u64,
}

impl Paginator {
    pub fn new(page: u64, per_page: Option<u64>, total: u64) -> Self {
        let per_page = per_page.filter(|n| *n > 0);
        let pages = match per_page {
            Some(n) => total.div_ceil(n).max(1),
            None => 1,
        };
        let page = if per_page.is_some() { page.max(1) } else { 1 };

        Self {
            page,
            per_page,
            total,
            pages,
        }
    }

    pub fn window(&self) -> PageWindow {
        match self.per_page {
            Some(n) => PageWindow {
                offset: (self.page - 1).saturating_mul(n),
                limit: Some(n),
            },
            None => PageWindow::all(),
        }
    }

    /// Pages past the last one hold nothing and need no query.
    pub fn is_past_end(&self) -> bool {
        self.page > self.pages
    }

    pub fn previous(&self) -> Option<u64> {
        (self.page > 1).then(|| (self.page - 1).min(self.pages))
    }

    pub fn next(&self) -> Option<u64> {
        (self.page < self.pages).then(|| self.page + 1)
    }
}
