//! Pagination controller for server-paginated lists.
//!
//! Each transition yields a new window whose [`DocumentsQuery`] is part of
//! the cache identity, so every page is cached on its own and flipping back
//! to a fetched page needs no round-trip.

mod intent;
mod reducer;
mod state;

pub use intent::PageIntent;
pub use reducer::PaginationReducer;
pub use state::PaginationWindow;

use std::num::NonZeroU32;

use crate::cache::DocumentsQuery;
use crate::mvi::Reducer;

/// Holds the current window and applies intents to it.
#[derive(Debug, Clone, Default)]
pub struct PaginationController {
    window: PaginationWindow,
}

impl PaginationController {
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            window: PaginationWindow::new(page_size),
        }
    }

    pub fn window(&self) -> &PaginationWindow {
        &self.window
    }

    pub fn query(&self) -> DocumentsQuery {
        self.window.query()
    }

    /// Apply `intent`; returns true when the query identity changed.
    pub fn dispatch(&mut self, intent: PageIntent) -> bool {
        let before = self.window.query();
        self.window = PaginationReducer::reduce(self.window, intent);
        self.window.query() != before
    }

    pub fn first(&mut self) -> bool {
        self.dispatch(PageIntent::First)
    }

    pub fn previous(&mut self) -> bool {
        self.dispatch(PageIntent::Previous)
    }

    pub fn next(&mut self) -> bool {
        self.dispatch(PageIntent::Next)
    }

    pub fn last(&mut self) -> bool {
        self.dispatch(PageIntent::Last)
    }

    pub fn goto_page(&mut self, input: &str) -> bool {
        self.dispatch(PageIntent::GotoPage(input.to_string()))
    }

    pub fn set_page_size(&mut self, size: u32) -> bool {
        self.dispatch(PageIntent::SetPageSize(size))
    }

    pub fn set_total(&mut self, total_items: u64) -> bool {
        self.dispatch(PageIntent::SetTotal(total_items))
    }
}
