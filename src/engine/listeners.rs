use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::EngineState;
use crate::log_warn;

const ENABLE_LOGS: bool = true;

/// Callback receiving every engine snapshot.
pub type Listener = Arc<dyn Fn(EngineState) + Send + Sync>;

/// Token returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ListenerId(u64);

/// A listener plus the newest snapshot revision it has been handed.
pub(crate) struct Subscription {
    listener: Listener,
    last_seen: AtomicU64,
}

impl Subscription {
    fn new(listener: Listener) -> Self {
        Self {
            listener,
            last_seen: AtomicU64::new(0),
        }
    }
}

pub(crate) type Subscribers = Vec<(ListenerId, Arc<Subscription>)>;

/// Listeners keyed by token, delivered in subscription order.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    listeners: BTreeMap<ListenerId, Arc<Subscription>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, listener: Listener) -> (ListenerId, Arc<Subscription>) {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let subscription = Arc::new(Subscription::new(listener));
        self.listeners.insert(id, Arc::clone(&subscription));
        (id, subscription)
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Copies the current listeners out so they can be called without holding
    /// whatever lock guards the registry.
    pub(crate) fn snapshot(&self) -> Subscribers {
        self.listeners
            .iter()
            .map(|(id, subscription)| (*id, Arc::clone(subscription)))
            .collect()
    }
}

/// Delivers `state` to each listener. A panicking listener is logged and
/// skipped; the rest still run.
pub(crate) fn fan_out(subscribers: &[(ListenerId, Arc<Subscription>)], state: EngineState, revision: u64) {
    for (id, subscription) in subscribers {
        deliver(*id, subscription, state, revision);
    }
}

/// Hands `state` to one listener unless it has already seen `revision` or a
/// newer one, so a listener never goes back to an older snapshot.
pub(crate) fn deliver(id: ListenerId, subscription: &Subscription, state: EngineState, revision: u64) {
    if subscription.last_seen.fetch_max(revision, Ordering::SeqCst) >= revision {
        return;
    }
    let listener = &subscription.listener;
    if panic::catch_unwind(AssertUnwindSafe(|| listener(state))).is_err() {
        log_warn!("Engine listener {:?} panicked; continuing with remaining listeners", id);
    }
}
