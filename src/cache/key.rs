use std::fmt::{self, Debug};
use std::hash::Hash;
use std::num::NonZeroU32;
use std::sync::Arc;

/// A structurally comparable cache key with a resource tag.
///
/// Two identities are the same cache entry iff they compare equal.
pub trait QueryIdentity: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    type Resource: Copy + Eq + Debug + Send + Sync + 'static;

    fn resource(&self) -> Self::Resource;
}

/// Resource families the document API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Documents,
    Account,
}

/// One server-side page of the document list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentsQuery {
    pub page_index: u32,
    pub page_size: NonZeroU32,
}

/// Cache identity for everything the client fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// `GET /document/get?page=&page_size=`
    DocumentPage(DocumentsQuery),
    /// `GET /document/all`
    AllDocuments,
    /// `GET /auth/token_data`
    Account,
}

impl QueryIdentity for QueryKey {
    type Resource = ResourceKind;

    fn resource(&self) -> ResourceKind {
        match self {
            QueryKey::DocumentPage(_) | QueryKey::AllDocuments => ResourceKind::Documents,
            QueryKey::Account => ResourceKind::Account,
        }
    }
}

/// Selects the entries an invalidation applies to.
pub enum QueryFilter<K: QueryIdentity> {
    Exact(K),
    /// Every identity of one resource family (all pages of a list, say).
    Resource(K::Resource),
    All,
    Predicate(Arc<dyn Fn(&K) -> bool + Send + Sync>),
}

impl<K: QueryIdentity> QueryFilter<K> {
    pub fn predicate<F>(matches: F) -> Self
    where
        F: Fn(&K) -> bool + Send + Sync + 'static,
    {
        QueryFilter::Predicate(Arc::new(matches))
    }

    pub fn matches(&self, key: &K) -> bool {
        match self {
            QueryFilter::Exact(expected) => expected == key,
            QueryFilter::Resource(resource) => key.resource() == *resource,
            QueryFilter::All => true,
            QueryFilter::Predicate(matches) => matches(key),
        }
    }
}

impl<K: QueryIdentity> Clone for QueryFilter<K> {
    fn clone(&self) -> Self {
        match self {
            QueryFilter::Exact(key) => QueryFilter::Exact(key.clone()),
            QueryFilter::Resource(resource) => QueryFilter::Resource(*resource),
            QueryFilter::All => QueryFilter::All,
            QueryFilter::Predicate(matches) => QueryFilter::Predicate(Arc::clone(matches)),
        }
    }
}

impl<K: QueryIdentity> Debug for QueryFilter<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryFilter::Exact(key) => f.debug_tuple("Exact").field(key).finish(),
            QueryFilter::Resource(resource) => f.debug_tuple("Resource").field(resource).finish(),
            QueryFilter::All => write!(f, "All"),
            QueryFilter::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}
