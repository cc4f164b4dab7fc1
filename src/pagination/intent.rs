use crate::mvi::Intent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageIntent {
    First,
    /// No-op on the first page.
    Previous,
    /// No-op on the last page.
    Next,
    Last,
    /// Raw 1-based page number as typed; anything that isn't an integer is ignored.
    GotoPage(String),
    /// Zero is ignored. The page index is re-clamped, not reset.
    SetPageSize(u32),
    /// Total reported by the server with a fetched page.
    SetTotal(u64),
}

impl Intent for PageIntent {}
