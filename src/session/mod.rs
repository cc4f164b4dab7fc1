//! Process-wide "who is signed in" state.
//!
//! The HTTP-only session cookie is owned by the server; the client can only
//! see whether the marker cookie exists. The display name lives in a durable
//! store and is published to subscribers whenever it changes. The marker is
//! authoritative for "could there be a session", the store for "what to show".

mod marker;
mod storage;

pub use marker::{CookieJarMarker, SessionMarker, StaticMarker};
pub use storage::{DisplayNameStore, FileDisplayNameStore, MemoryDisplayNameStore, StorageError};

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type SessionCallback = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// Owner of the current display name.
///
/// Constructed once per process and shared by reference; it is the only
/// writer to the durable value.
pub struct SessionBridge {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    marker: Arc<dyn SessionMarker>,
    store: Arc<dyn DisplayNameStore>,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    display_name: Option<String>,
    subscribers: Vec<(u64, SessionCallback)>,
    next_id: u64,
}

impl SessionBridge {
    pub fn new(marker: Arc<dyn SessionMarker>, store: Arc<dyn DisplayNameStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                marker,
                store,
                state: Mutex::new(SessionState::default()),
            }),
        }
    }

    /// Adopt the durable name if the session marker is present, else `None`.
    ///
    /// Safe to call again; each call re-derives the state from the marker and
    /// the store. Subscribers are notified only when the value changes.
    pub fn initialize(&self) -> Option<String> {
        let resolved = if self.inner.marker.is_present() {
            match self.inner.store.load() {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not read stored display name");
                    None
                }
            }
        } else {
            None
        };

        let callbacks = {
            let mut state = self.inner.state.lock();
            if state.display_name == resolved {
                None
            } else {
                state.display_name = resolved.clone();
                Some(snapshot_callbacks(&state))
            }
        };

        tracing::debug!(signed_in = resolved.is_some(), "Session initialized");
        if let Some(callbacks) = callbacks {
            publish(&callbacks, resolved.as_deref());
        }
        resolved
    }

    /// The single mutation path: persist, then publish.
    ///
    /// The durable write completes before any subscriber runs. If it fails,
    /// nothing is published and the in-memory state is left untouched.
    pub fn set_session(&self, display_name: Option<&str>) -> Result<(), StorageError> {
        let callbacks = {
            let mut state = self.inner.state.lock();
            match display_name {
                Some(name) => self.inner.store.save(name)?,
                None => self.inner.store.clear()?,
            }
            state.display_name = display_name.map(str::to_string);
            snapshot_callbacks(&state)
        };

        tracing::debug!(signed_in = display_name.is_some(), "Session changed");
        publish(&callbacks, display_name);
        Ok(())
    }

    pub fn current(&self) -> Option<String> {
        self.inner.state.lock().display_name.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.inner.state.lock().display_name.is_some()
    }

    /// Register a callback run synchronously, in subscription order, on every
    /// change. Dropping the handle unsubscribes.
    pub fn subscribe<F>(&self, callback: F) -> SessionSubscription
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        let mut state = self.inner.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push((id, Arc::new(callback)));
        SessionSubscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }
}

fn snapshot_callbacks(state: &SessionState) -> Vec<SessionCallback> {
    state
        .subscribers
        .iter()
        .map(|(_, callback)| Arc::clone(callback))
        .collect()
}

fn publish(callbacks: &[SessionCallback], display_name: Option<&str>) {
    for callback in callbacks {
        callback(display_name);
    }
}

/// Handle returned by [`SessionBridge::subscribe`].
pub struct SessionSubscription {
    inner: Weak<SessionInner>,
    id: u64,
}

impl SessionSubscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .state
                .lock()
                .subscribers
                .retain(|(id, _)| *id != self.id);
        }
    }
}
