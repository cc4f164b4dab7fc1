use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::key::{QueryFilter, QueryIdentity};
use crate::outcome::{settle, ErrorInfo, Outcome};

type BoxFuture<V> = Pin<Box<dyn Future<Output = Outcome<V>> + Send>>;

/// Re-runnable fetch operation remembered per entry.
pub type Fetcher<V> = Arc<dyn Fn() -> BoxFuture<V> + Send + Sync>;

type QueryCallback<V> = Arc<dyn Fn(&QueryEvent<V>) + Send + Sync>;

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

/// What subscribers receive when a fetch settles.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent<V> {
    Ready(V),
    Failed(ErrorInfo),
}

/// Read-only view of one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot<V> {
    pub status: QueryStatus,
    pub value: Option<V>,
    pub error: Option<ErrorInfo>,
    pub subscriber_count: usize,
}

/// What an [`QueryCache::invalidate`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvalidationReport {
    /// Observed entries that started a fresh fetch.
    pub refetching: usize,
    /// Unobserved entries that were dropped.
    pub dropped: usize,
    /// In-flight entries flagged for one follow-up fetch.
    pub deferred: usize,
}

struct CacheEntry<V> {
    status: QueryStatus,
    value: Option<V>,
    error: Option<ErrorInfo>,
    fetcher: Option<Fetcher<V>>,
    waiters: Vec<oneshot::Sender<Outcome<V>>>,
    /// Callers that arrived after the in-flight fetch was superseded.
    follow_up_waiters: Vec<oneshot::Sender<Outcome<V>>>,
    subscribers: Vec<(u64, QueryCallback<V>)>,
    /// Invalidated while loading; the in-flight result is superseded.
    refetch_pending: bool,
    /// Removed while loading; the in-flight result is neither stored nor published.
    discarded: bool,
    unobserved_since: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn new() -> Self {
        Self {
            status: QueryStatus::Idle,
            value: None,
            error: None,
            fetcher: None,
            waiters: Vec::new(),
            follow_up_waiters: Vec::new(),
            subscribers: Vec::new(),
            refetch_pending: false,
            discarded: false,
            unobserved_since: Some(Instant::now()),
        }
    }

    fn superseded(&self) -> bool {
        self.refetch_pending || self.discarded
    }

    fn callbacks(&self) -> Vec<QueryCallback<V>> {
        self.subscribers
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }
}

struct CacheInner<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    next_subscriber: AtomicU64,
    gc_after: Duration,
}

/// Keyed cache of fetch results with request deduplication and
/// refetch-on-invalidate.
///
/// At most one fetch per identity is in flight at any time; callers that
/// arrive while it runs wait for the same outcome. Fetches always run to
/// completion on their own task: dropping a waiter or a subscription never
/// cancels one.
///
/// Constructed once and shared by cloning the handle.
pub struct QueryCache<K, V> {
    inner: Arc<CacheInner<K, V>>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: QueryIdentity,
    V: Clone + Send + Sync + 'static,
{
    /// `gc_after`: how long an unobserved entry survives [`collect_garbage`](Self::collect_garbage).
    pub fn new(gc_after: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(HashMap::new()),
                next_subscriber: AtomicU64::new(0),
                gc_after,
            }),
        }
    }

    /// Return the cached value, join the in-flight fetch, or start one.
    pub async fn fetch_or_get<F, Fut>(&self, key: K, fetcher: F) -> Outcome<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome<V>> + Send + 'static,
    {
        self.fetch_with(key, boxed(fetcher)).await
    }

    async fn fetch_with(&self, key: K, fetcher: Fetcher<V>) -> Outcome<V> {
        let receiver = {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
            entry.fetcher = Some(Arc::clone(&fetcher));

            if entry.status == QueryStatus::Ready {
                if let Some(value) = &entry.value {
                    tracing::trace!(key = ?key, "Cache hit");
                    return Ok(value.clone());
                }
            }

            let (sender, receiver) = oneshot::channel();
            match entry.status {
                QueryStatus::Loading if entry.superseded() => {
                    tracing::trace!(key = ?key, "Waiting for the follow-up fetch");
                    entry.follow_up_waiters.push(sender);
                }
                QueryStatus::Loading => {
                    tracing::trace!(key = ?key, "Joining in-flight fetch");
                    entry.waiters.push(sender);
                }
                QueryStatus::Ready | QueryStatus::Idle | QueryStatus::Error => {
                    entry.status = QueryStatus::Loading;
                    entry.waiters.push(sender);
                    spawn_fetch(&self.inner, key, fetcher);
                }
            }
            receiver
        };

        await_outcome(receiver).await
    }

    /// Subscribe to `key` and make sure it has data.
    ///
    /// A `Ready` entry delivers its value to `callback` immediately; an idle
    /// or failed one starts a fetch; a loading one just waits for it.
    pub fn mount<F, Fut, C>(&self, key: K, fetcher: F, callback: C) -> Subscription
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome<V>> + Send + 'static,
        C: Fn(&QueryEvent<V>) + Send + Sync + 'static,
    {
        let fetcher = boxed(fetcher);
        let callback: QueryCallback<V> = Arc::new(callback);
        let (subscription, current) = {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
            entry.fetcher = Some(Arc::clone(&fetcher));
            let subscription = self.attach(&key, entry, Arc::clone(&callback));

            let current = match entry.status {
                QueryStatus::Ready if entry.value.is_some() => {
                    entry.value.clone().map(QueryEvent::Ready)
                }
                QueryStatus::Loading => None,
                _ => {
                    entry.status = QueryStatus::Loading;
                    spawn_fetch(&self.inner, key, fetcher);
                    None
                }
            };
            (subscription, current)
        };

        if let Some(event) = current {
            callback(&event);
        }
        subscription
    }

    /// Register `callback` for every settled fetch of `key`.
    pub fn subscribe<C>(&self, key: K, callback: C) -> Subscription
    where
        C: Fn(&QueryEvent<V>) + Send + Sync + 'static,
    {
        let mut entries = self.inner.entries.lock();
        let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
        self.attach(&key, entry, Arc::new(callback))
    }

    fn attach(&self, key: &K, entry: &mut CacheEntry<V>, callback: QueryCallback<V>) -> Subscription {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        entry.subscribers.push((id, callback));
        entry.unobserved_since = None;

        let weak: Weak<CacheInner<K, V>> = Arc::downgrade(&self.inner);
        let key = key.clone();
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    detach(&inner, &key, id);
                }
            })),
        }
    }

    /// Mark matching entries stale.
    ///
    /// Observed entries refetch immediately with their last fetcher;
    /// unobserved ones are dropped and refetched on next access; loading ones
    /// get exactly one follow-up fetch once the current one settles.
    pub fn invalidate(&self, filter: &QueryFilter<K>) -> InvalidationReport {
        let mut report = InvalidationReport::default();
        let mut refetch = Vec::new();

        {
            let mut entries = self.inner.entries.lock();
            entries.retain(|key, entry| {
                if !filter.matches(key) {
                    return true;
                }
                if entry.status == QueryStatus::Loading {
                    entry.refetch_pending = true;
                    report.deferred += 1;
                    return true;
                }
                if entry.subscribers.is_empty() {
                    report.dropped += 1;
                    return false;
                }
                if let Some(fetcher) = &entry.fetcher {
                    entry.status = QueryStatus::Loading;
                    refetch.push((key.clone(), Arc::clone(fetcher)));
                    report.refetching += 1;
                }
                true
            });
        }

        tracing::debug!(
            filter = ?filter,
            refetching = report.refetching,
            dropped = report.dropped,
            deferred = report.deferred,
            "Invalidated queries"
        );

        for (key, fetcher) in refetch {
            spawn_fetch(&self.inner, key, fetcher);
        }
        report
    }

    /// Forget matching entries without refetching them, observed or not.
    ///
    /// Subscribers of a removed entry receive nothing further. A loading entry
    /// is detached from its in-flight fetch: that result only resolves the
    /// callers already waiting on it.
    pub fn remove(&self, filter: &QueryFilter<K>) -> usize {
        let mut removed = 0;
        {
            let mut entries = self.inner.entries.lock();
            entries.retain(|key, entry| {
                if !filter.matches(key) {
                    return true;
                }
                removed += 1;
                if entry.status != QueryStatus::Loading {
                    return false;
                }
                entry.discarded = true;
                entry.refetch_pending = false;
                entry.subscribers.clear();
                entry.unobserved_since = Some(Instant::now());
                true
            });
        }
        tracing::debug!(filter = ?filter, removed, "Removed queries");
        removed
    }

    /// Drop unobserved, settled entries older than the configured grace period.
    pub fn collect_garbage(&self) -> usize {
        let gc_after = self.inner.gc_after;
        let mut entries = self.inner.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            let expired = entry
                .unobserved_since
                .is_some_and(|since| since.elapsed() >= gc_after);
            !(expired
                && entry.subscribers.is_empty()
                && entry.waiters.is_empty()
                && entry.status != QueryStatus::Loading)
        });
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "Collected idle cache entries");
        }
        removed
    }

    pub fn snapshot(&self, key: &K) -> Option<QuerySnapshot<V>> {
        let entries = self.inner.entries.lock();
        entries.get(key).map(|entry| QuerySnapshot {
            status: entry.status,
            value: entry.value.clone(),
            error: entry.error.clone(),
            subscriber_count: entry.subscribers.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn await_outcome<V>(receiver: oneshot::Receiver<Outcome<V>>) -> Outcome<V> {
    receiver
        .await
        .unwrap_or_else(|_| Err(ErrorInfo::network("Fetch was abandoned")))
}

fn boxed<V, F, Fut>(fetcher: F) -> Fetcher<V>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome<V>> + Send + 'static,
{
    Arc::new(move || Box::pin(fetcher()) as BoxFuture<V>)
}

fn spawn_fetch<K, V>(inner: &Arc<CacheInner<K, V>>, key: K, fetcher: Fetcher<V>)
where
    K: QueryIdentity,
    V: Clone + Send + Sync + 'static,
{
    tracing::debug!(key = ?key, "Fetching");
    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        let outcome = settle(async move { fetcher().await }).await;
        complete(&inner, key, outcome);
    });
}

fn complete<K, V>(inner: &Arc<CacheInner<K, V>>, key: K, outcome: Outcome<V>)
where
    K: QueryIdentity,
    V: Clone + Send + Sync + 'static,
{
    let (waiters, callbacks, follow_up) = {
        let mut entries = inner.entries.lock();
        let Some(entry) = entries.get_mut(&key) else {
            tracing::warn!(key = ?key, "Fetch settled for a missing entry");
            return;
        };
        let waiters = std::mem::take(&mut entry.waiters);

        if entry.superseded() {
            if entry.discarded {
                entry.value = None;
                entry.error = None;
            }
            entry.refetch_pending = false;
            entry.discarded = false;
            let follow_up_waiters = std::mem::take(&mut entry.follow_up_waiters);
            let wanted = !entry.subscribers.is_empty() || !follow_up_waiters.is_empty();
            let follow_up = match entry.fetcher.clone() {
                Some(fetcher) if wanted => {
                    entry.waiters = follow_up_waiters;
                    Some(fetcher)
                }
                _ => None,
            };
            if follow_up.is_none() {
                entries.remove(&key);
            }
            (waiters, Vec::new(), follow_up)
        } else {
            match &outcome {
                Ok(value) => {
                    entry.status = QueryStatus::Ready;
                    entry.value = Some(value.clone());
                    entry.error = None;
                }
                Err(err) => {
                    tracing::warn!(key = ?key, error = %err, "Fetch failed");
                    entry.status = QueryStatus::Error;
                    entry.error = Some(err.clone());
                }
            }
            (waiters, entry.callbacks(), None)
        }
    };

    if let Some(fetcher) = follow_up {
        tracing::debug!(key = ?key, "Superseded by invalidation, refetching");
        spawn_fetch(inner, key, fetcher);
    }

    for waiter in waiters {
        let _ = waiter.send(outcome.clone());
    }

    if !callbacks.is_empty() {
        let event = match outcome {
            Ok(value) => QueryEvent::Ready(value),
            Err(err) => QueryEvent::Failed(err),
        };
        for callback in callbacks {
            callback(&event);
        }
    }
}

fn detach<K, V>(inner: &CacheInner<K, V>, key: &K, id: u64)
where
    K: QueryIdentity,
{
    let mut entries = inner.entries.lock();
    if let Some(entry) = entries.get_mut(key) {
        entry.subscribers.retain(|(subscriber, _)| *subscriber != id);
        if entry.subscribers.is_empty() {
            entry.unobserved_since = Some(Instant::now());
        }
    }
}

/// Live interest in one cache entry. Dropping it unsubscribes.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}
