//! Process-wide holder of the current session snapshot.
//!
//! DESIGN
//! ======
//! Readers clone an `Arc<Session>` out of a short critical section, so a
//! snapshot never changes under them. Listeners are kept in registration
//! order and run after the swap, outside the snapshot lock, which lets them
//! call `current()` freely. A separate notify lock keeps the listener runs of
//! two replacements from interleaving.
//!
//! Listeners must not feed events back into the resolver synchronously: the
//! resolver holds its own lock while the store notifies.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use tracing::trace;

use crate::model::Session;

type Listener = Arc<dyn Fn(&Session) + Send + Sync>;

struct Held {
    session: Arc<Session>,
    version: u64,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: BTreeMap<u64, Listener>,
}

/// Single-writer, many-reader container for the current [`Session`].
pub struct SessionStore {
    held: RwLock<Held>,
    listeners: Mutex<Listeners>,
    notifying: Mutex<()>,
}

impl SessionStore {
    /// A store holding the initial `Anonymous` session.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            held: RwLock::new(Held { session: Arc::new(Session::anonymous()), version: 0 }),
            listeners: Mutex::new(Listeners::default()),
            notifying: Mutex::new(()),
        })
    }

    /// Latest snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<Session> {
        let held = self.held.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&held.session)
    }

    /// Number of replacements applied so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.held
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    /// Register `listener` to run after every replacement. Dropping the
    /// returned handle deregisters it.
    pub fn subscribe<F>(self: &Arc<Self>, listener: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.insert(id, Arc::new(listener));
        trace!(subscription = id, "session listener registered");
        Subscription { store: Some(Arc::downgrade(self)), id }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Swap in `next` and notify listeners in registration order.
    pub(crate) fn replace(&self, next: Session) -> Arc<Session> {
        let _notifying = self
            .notifying
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(next);
        {
            let mut held = self.held.write().unwrap_or_else(PoisonError::into_inner);
            held.session = Arc::clone(&next);
            held.version += 1;
        }

        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .values()
            .cloned()
            .collect();
        for listener in &listeners {
            listener(&next);
        }
        next
    }

    fn remove_listener(&self, id: u64) {
        let removed = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .remove(&id);
        if removed.is_some() {
            trace!(subscription = id, "session listener removed");
        }
    }
}

/// Disposer returned by [`SessionStore::subscribe`].
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
pub struct Subscription {
    store: Option<Weak<SessionStore>>,
    id: u64,
}

impl Subscription {
    /// Deregister now. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the listener registered for the life of the store.
    pub fn detach(mut self) {
        self.store = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.take().and_then(|weak| weak.upgrade()) {
            store.remove_listener(self.id);
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
