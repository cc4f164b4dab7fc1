//! Unidirectional state primitives for view-side controllers.
//!
//! ```text
//! Intent ──→ Reducer ──→ ViewState ──→ query identity / rendering
//!    ↑                                    │
//!    └────────────────────────────────────┘
//! ```
//!
//! Controllers (pagination, for now) keep their state as a plain value and
//! only change it by reducing an intent, so every transition is a pure
//! function that can be tested without a network or a terminal.

mod intent;
mod reducer;
mod state;

pub use intent::Intent;
pub use reducer::Reducer;
pub use state::ViewState;
