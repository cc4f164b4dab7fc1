//! Client-side query cache and invalidation coordinator.
//!
//! # Model
//!
//! ```text
//! fetch_or_get(key) ──→ Ready?  ──yes──→ cached value
//!                        │ no
//!                        ├─ Loading ──→ wait on the in-flight fetch
//!                        └─ Idle/Error ──→ spawn fetch ──→ Ready | Error ──→ waiters + subscribers
//!
//! invalidate(filter) ──→ observed: refetch now
//!                        unobserved: drop, refetch on next access
//!                        loading: one follow-up fetch after it settles
//! ```

mod coordinator;
mod key;

pub use coordinator::{
    Fetcher, InvalidationReport, QueryCache, QueryEvent, QuerySnapshot, QueryStatus, Subscription,
};
pub use key::{DocumentsQuery, QueryFilter, QueryIdentity, QueryKey, ResourceKind};
