//! Change notification.
//!
//! Every instance and every model collection owns a [`ChangeNotifier`].
//! Nested models, array elements and collections are wired to their
//! parent's notifier with a [`ForwardLink`]: a pair of subscriptions on the
//! child that re-raise each event on the parent with the property name
//! prepended to the path. Links hold only a weak reference to the parent, and
//! are detached explicitly when a child leaves its slot.
//!
//! Dispatch snapshots the subscriber list before invoking handlers, so a
//! handler may subscribe or unsubscribe (on any notifier) while an event is
//! being delivered.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Whether an event fires before or after the mutation it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangePhase {
    Before,
    After,
}

/// A change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    pub phase: ChangePhase,
    /// Dotted property path relative to the instance the handler is
    /// subscribed on, e.g. `"Address.City"` or `"Lines.Remove(-1,0,0,1)"`.
    pub path: String,
}

/// Callback invoked for each matching notification.
pub type ChangeHandler = Arc<dyn Fn(&PropertyChange) + Send + Sync>;

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Subscription {
    id: SubscriptionId,
    phase: ChangePhase,
    filter: String,
    handler: ChangeHandler,
}

#[derive(Default)]
struct NotifierInner {
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
    /// Incremented on every after-change event, including forwarded ones.
    revision: AtomicU64,
}

impl NotifierInner {
    fn raise(&self, phase: ChangePhase, path: &str) {
        if phase == ChangePhase::After {
            self.revision.fetch_add(1, Ordering::Relaxed);
        }
        let handlers: Vec<ChangeHandler> = {
            let subscriptions = self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner);
            subscriptions
                .iter()
                .filter(|s| s.phase == phase && path_matches(&s.filter, path))
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };
        if handlers.is_empty() {
            return;
        }
        let change = PropertyChange {
            phase,
            path: path.to_string(),
        };
        for handler in handlers {
            handler(&change);
        }
    }
}

/// Per-object publisher of before/after change events.
#[derive(Default)]
pub(crate) struct ChangeNotifier {
    inner: Arc<NotifierInner>,
}

impl ChangeNotifier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. An empty `filter` matches every path; otherwise
    /// the handler sees the exact path and everything beneath it.
    pub(crate) fn subscribe(&self, phase: ChangePhase, filter: &str, handler: ChangeHandler) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                id,
                phase,
                filter: filter.to_string(),
                handler,
            });
        id
    }

    /// Removes a subscription. Returns false if it was not registered here.
    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.inner.subscriptions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    pub(crate) fn raise(&self, phase: ChangePhase, path: &str) {
        self.inner.raise(phase, path);
    }

    pub(crate) fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::Relaxed)
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.inner.subscriptions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Forwards every event raised here to `target`, prefixed with `prefix`.
    pub(crate) fn forward_to(&self, target: &ChangeNotifier, prefix: &str) -> ForwardLink {
        let before = self.subscribe(ChangePhase::Before, "", forwarder(target, prefix, ChangePhase::Before));
        let after = self.subscribe(ChangePhase::After, "", forwarder(target, prefix, ChangePhase::After));
        ForwardLink { before, after }
    }
}

fn forwarder(target: &ChangeNotifier, prefix: &str, phase: ChangePhase) -> ChangeHandler {
    let target: Weak<NotifierInner> = Arc::downgrade(&target.inner);
    let prefix = prefix.to_string();
    Arc::new(move |change: &PropertyChange| {
        if let Some(target) = target.upgrade() {
            target.raise(phase, &join_path(&prefix, &change.path));
        }
    })
}

/// The two subscriptions that forward a child's events to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ForwardLink {
    before: SubscriptionId,
    after: SubscriptionId,
}

impl ForwardLink {
    /// Removes the forwarding subscriptions from the child they were
    /// registered on.
    pub(crate) fn detach(self, source: &ChangeNotifier) {
        source.unsubscribe(self.before);
        source.unsubscribe(self.after);
    }
}

/// Joins a property prefix and a relative path with a dot, omitting the dot
/// when either side is empty.
pub(crate) fn join_path(prefix: &str, path: &str) -> String {
    match (prefix.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}.{path}"),
    }
}

fn path_matches(filter: &str, path: &str) -> bool {
    if filter.is_empty() || filter == "*" {
        return true;
    }
    match path.strip_prefix(filter) {
        Some(rest) => rest.is_empty() || rest.starts_with('.') || rest.starts_with('('),
        None => false,
    }
}
