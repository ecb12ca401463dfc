//! Session listeners and their notification dispatcher
//!
//! Listeners are one-shot: a notifying transition drains the registry and
//! the drained batch is delivered. Delivery runs on a single dispatcher
//! task, so listener code never runs concurrently with itself and never
//! while the session lock is held.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use grantflow_domain::{GrantflowError, SessionState};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Receives the outcome of `open` and `close`
pub trait SessionListener: Send + Sync {
    /// The session reached `OPEN`
    fn on_opened(&self);

    /// The session reached `CLOSED`, with the error that caused it if any
    fn on_closed(&self, error: Option<&GrantflowError>);
}

/// Ordered set of registered listeners
///
/// Registering the same listener (same allocation) twice is a no-op.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<Arc<dyn SessionListener>>>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener; returns `false` if it was already registered
    pub fn register(&self, listener: Arc<dyn SessionListener>) -> bool {
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|existing| same_listener(existing, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Deregister and return every listener
    pub fn take_all(&self) -> Vec<Arc<dyn SessionListener>> {
        std::mem::take(&mut *self.listeners.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

fn same_listener(a: &Arc<dyn SessionListener>, b: &Arc<dyn SessionListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// A state change to deliver
pub(crate) struct Notification {
    pub(crate) state: SessionState,
    pub(crate) error: Option<GrantflowError>,
    pub(crate) listeners: Vec<Arc<dyn SessionListener>>,
}

/// Single-consumer queue feeding one dispatcher task
pub(crate) struct NotificationDispatcher {
    sender: mpsc::UnboundedSender<Notification>,
}

impl NotificationDispatcher {
    /// Spawn the dispatcher task on `runtime`
    ///
    /// The task ends when the dispatcher is dropped.
    pub(crate) fn spawn(runtime: &Handle) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Notification>();

        runtime.spawn(async move {
            while let Some(notification) = receiver.recv().await {
                deliver(&notification);
            }
            debug!("Session listener dispatcher stopped");
        });

        Self { sender }
    }

    /// Queue a notification; never blocks
    pub(crate) fn dispatch(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            warn!("Session listener dispatcher is gone; notification dropped");
        }
    }
}

fn deliver(notification: &Notification) {
    for listener in &notification.listeners {
        let outcome = catch_unwind(AssertUnwindSafe(|| match notification.state {
            SessionState::Open => listener.on_opened(),
            _ => listener.on_closed(notification.error.as_ref()),
        }));
        if outcome.is_err() {
            warn!(state = %notification.state, "Session listener panicked during notification");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for session::listener.
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counting {
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    impl SessionListener for Counting {
        fn on_opened(&self) {
            self.opened.fetch_add(1, Ordering::SeqCst);
        }

        fn on_closed(&self, _error: Option<&GrantflowError>) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Validates `ListenerRegistry::register` behavior for the duplicate
    /// registration scenario.
    ///
    /// Assertions:
    /// - Ensures the same allocation is registered once.
    /// - Ensures a distinct listener is added.
    /// - Confirms `take_all` drains the registry in registration order.
    #[test]
    fn test_register_deduplicates_by_identity() {
        let registry = ListenerRegistry::new();
        let first: Arc<dyn SessionListener> = Arc::new(Counting::default());
        let second: Arc<dyn SessionListener> = Arc::new(Counting::default());

        assert!(registry.register(first.clone()));
        assert!(!registry.register(first.clone()));
        assert!(registry.register(second.clone()));
        assert_eq!(registry.len(), 2);

        let drained = registry.take_all();
        assert_eq!(drained.len(), 2);
        assert!(same_listener(&drained[0], &first));
        assert!(same_listener(&drained[1], &second));
        assert!(registry.is_empty());
    }

    /// Validates `NotificationDispatcher` behavior for the in-order delivery
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms the drained listener receives `on_opened` then `on_closed`.
    /// - Ensures a panicking listener does not stop later deliveries.
    #[tokio::test]
    async fn test_dispatch_delivers_batches_in_order() {
        struct Panicking;

        impl SessionListener for Panicking {
            fn on_opened(&self) {
                panic!("listener failure");
            }

            fn on_closed(&self, _error: Option<&GrantflowError>) {}
        }

        let registry = ListenerRegistry::new();
        let counting = Arc::new(Counting::default());
        let listener: Arc<dyn SessionListener> = counting.clone();
        registry.register(Arc::new(Panicking));
        registry.register(listener.clone());

        let dispatcher = NotificationDispatcher::spawn(&Handle::current());
        dispatcher.dispatch(Notification {
            state: SessionState::Open,
            error: None,
            listeners: registry.take_all(),
        });
        dispatcher.dispatch(Notification {
            state: SessionState::Closed,
            error: Some(GrantflowError::AuthorizationFailed("denied".into())),
            listeners: vec![listener],
        });

        grantflow_common::assert_eventually!(
            std::time::Duration::from_secs(1),
            counting.closed.load(Ordering::SeqCst) == 1
        );
        assert_eq!(counting.opened.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }
}
