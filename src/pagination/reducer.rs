use std::num::NonZeroU32;

use crate::mvi::Reducer;
use crate::pagination::intent::PageIntent;
use crate::pagination::state::{page_count, PaginationWindow};

pub struct PaginationReducer;

impl Reducer for PaginationReducer {
    type State = PaginationWindow;
    type Intent = PageIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        let last = state.page_count() - 1;
        match intent {
            PageIntent::First => PaginationWindow {
                page_index: 0,
                ..state
            },
            PageIntent::Previous => PaginationWindow {
                page_index: state.page_index.saturating_sub(1),
                ..state
            },
            PageIntent::Next => PaginationWindow {
                page_index: (state.page_index + 1).min(last),
                ..state
            },
            PageIntent::Last => PaginationWindow {
                page_index: last,
                ..state
            },
            PageIntent::GotoPage(input) => match input.trim().parse::<i64>() {
                Ok(page) => PaginationWindow {
                    page_index: clamp_index(page.saturating_sub(1), last),
                    ..state
                },
                Err(_) => state,
            },
            PageIntent::SetPageSize(size) => match NonZeroU32::new(size) {
                Some(page_size) => {
                    let last = page_count(state.total_items, page_size) - 1;
                    PaginationWindow {
                        page_index: state.page_index.min(last),
                        page_size,
                        ..state
                    }
                }
                None => state,
            },
            PageIntent::SetTotal(total_items) => {
                let last = page_count(total_items, state.page_size) - 1;
                PaginationWindow {
                    page_index: state.page_index.min(last),
                    total_items,
                    ..state
                }
            }
        }
    }
}

fn clamp_index(index: i64, last: u32) -> u32 {
    index.clamp(0, i64::from(last)) as u32
}
