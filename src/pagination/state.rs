use std::num::NonZeroU32;

use crate::cache::DocumentsQuery;
use crate::mvi::ViewState;

const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

/// Bounded window over a server-paginated list.
///
/// `page_index` is 0-based and always within `0..page_count()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow {
    pub(crate) page_index: u32,
    pub(crate) page_size: NonZeroU32,
    pub(crate) total_items: u64,
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ViewState for PaginationWindow {}

impl PaginationWindow {
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            page_index: 0,
            page_size,
            total_items: 0,
        }
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> NonZeroU32 {
        self.page_size
    }

    /// Server-reported total; authoritative once a page has been fetched.
    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    /// `max(1, ceil(total_items / page_size))`
    pub fn page_count(&self) -> u32 {
        page_count(self.total_items, self.page_size)
    }

    pub fn can_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next(&self) -> bool {
        self.page_index + 1 < self.page_count()
    }

    /// Cache identity of the window.
    pub fn query(&self) -> DocumentsQuery {
        DocumentsQuery {
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }

    /// 1-based ordinal of the `row`-th item on the current page.
    pub fn row_ordinal(&self, row: usize) -> u64 {
        u64::from(self.page_index) * u64::from(self.page_size.get()) + row as u64 + 1
    }
}

pub(crate) fn page_count(total_items: u64, page_size: NonZeroU32) -> u32 {
    let pages = total_items.div_ceil(u64::from(page_size.get())).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
