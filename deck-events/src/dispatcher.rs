//! Typed listener registry keyed by event name.
//!
//! Each name maps to a list of listeners kept in registration order. The
//! registry is guarded by a single mutex that is never held while a listener
//! runs, so listeners may freely register or remove other listeners.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Unique identifier for one listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

enum Callback<E> {
    Persistent(Arc<dyn Fn(&E) + Send + Sync>),
    Once(Box<dyn FnOnce(&E) + Send>),
}

struct Entry<E> {
    id: ListenerId,
    callback: Callback<E>,
}

/// A listener taken out of the registry for one emit.
enum Invocation<E> {
    Persistent(ListenerId, Arc<dyn Fn(&E) + Send + Sync>),
    Once(ListenerId, Box<dyn FnOnce(&E) + Send>),
}

struct Registry<E> {
    listeners: Mutex<HashMap<String, Vec<Entry<E>>>>,
    next_id: AtomicU64,
}

impl<E> Registry<E> {
    fn insert(&self, name: &str, callback: Callback<E>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .entry(name.to_string())
            .or_default()
            .push(Entry { id, callback });
        id
    }

    fn remove(&self, name: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(entries) = listeners.get_mut(name) else {
            return false;
        };
        let Some(position) = entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        entries.remove(position);
        if entries.is_empty() {
            listeners.remove(name);
        }
        true
    }
}

/// Type-erased removal so a [`Subscription`] does not carry the event type.
trait RemoveListener: Send + Sync {
    fn remove_listener(&self, name: &str, id: ListenerId) -> bool;
}

impl<E> RemoveListener for Registry<E> {
    fn remove_listener(&self, name: &str, id: ListenerId) -> bool {
        self.remove(name, id)
    }
}

/// Publish/subscribe registry for events of type `E`.
///
/// Cloning the dispatcher yields another handle onto the same registry.
pub struct EventDispatcher<E> {
    registry: Arc<Registry<E>>,
}

impl<E> Clone for EventDispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Registry {
                listeners: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }
}

impl<E> fmt::Debug for EventDispatcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.registry.listeners.lock();
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.len()))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("listeners", &counts)
            .finish()
    }
}

impl<E: 'static> EventDispatcher<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a persistent listener for `name`.
    pub fn on<F>(&self, name: &str, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.registry
            .insert(name, Callback::Persistent(Arc::new(listener)))
    }

    /// Add a listener that is removed right before its first invocation.
    pub fn once<F>(&self, name: &str, listener: F) -> ListenerId
    where
        F: FnOnce(&E) + Send + 'static,
    {
        self.registry.insert(name, Callback::Once(Box::new(listener)))
    }

    /// Remove the registration `id` from the listeners of `name`.
    ///
    /// Returns `false` when no such registration exists, including when a
    /// one-shot listener has already fired.
    pub fn remove_listener(&self, name: &str, id: ListenerId) -> bool {
        self.registry.remove(name, id)
    }

    /// Add a persistent listener and return a handle that removes it.
    pub fn add_disposable_listener<F>(&self, name: &str, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.on(name, listener);
        self.subscription(name, id)
    }

    /// Add a one-shot listener and return a handle that removes it if it has
    /// not fired yet.
    pub fn add_disposable_once<F>(&self, name: &str, listener: F) -> Subscription
    where
        F: FnOnce(&E) + Send + 'static,
    {
        let id = self.once(name, listener);
        self.subscription(name, id)
    }

    fn subscription(&self, name: &str, id: ListenerId) -> Subscription {
        let registry = Arc::downgrade(&self.registry);
        let registry: Weak<dyn RemoveListener> = registry;
        Subscription {
            state: Arc::new(SubscriptionState {
                name: name.to_string(),
                id,
                disposed: AtomicBool::new(false),
                registry,
            }),
        }
    }

    /// Invoke every listener registered for `name`, in registration order.
    ///
    /// Listeners run synchronously on the calling thread against a snapshot
    /// of the list taken when the emit starts. A panicking listener is logged
    /// and the remaining listeners still run. Returns the number of listeners
    /// invoked.
    pub fn emit(&self, name: &str, event: &E) -> usize {
        let batch = self.take_batch(name);
        let invoked = batch.len();

        for invocation in batch {
            let (id, outcome) = match invocation {
                Invocation::Persistent(id, listener) => {
                    (id, panic::catch_unwind(AssertUnwindSafe(|| (*listener)(event))))
                }
                Invocation::Once(id, listener) => {
                    (id, panic::catch_unwind(AssertUnwindSafe(move || listener(event))))
                }
            };

            if let Err(panic) = outcome {
                tracing::error!(
                    event = name,
                    listener = %id,
                    "Listener panicked: {}",
                    panic_message(panic.as_ref())
                );
            }
        }

        invoked
    }

    /// Snapshot the listeners for `name`, detaching one-shot listeners.
    fn take_batch(&self, name: &str) -> Vec<Invocation<E>> {
        let mut listeners = self.registry.listeners.lock();
        let Some(entries) = listeners.get_mut(name) else {
            return Vec::new();
        };

        let mut batch = Vec::with_capacity(entries.len());
        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries.drain(..) {
            match entry.callback {
                Callback::Persistent(listener) => {
                    batch.push(Invocation::Persistent(entry.id, Arc::clone(&listener)));
                    kept.push(Entry {
                        id: entry.id,
                        callback: Callback::Persistent(listener),
                    });
                }
                Callback::Once(listener) => batch.push(Invocation::Once(entry.id, listener)),
            }
        }

        if kept.is_empty() {
            listeners.remove(name);
        } else {
            *entries = kept;
        }
        batch
    }

    /// Number of listeners currently registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.registry
            .listeners
            .lock()
            .get(name)
            .map_or(0, Vec::len)
    }

    /// Whether no listener is registered under any name.
    pub fn is_empty(&self) -> bool {
        self.registry.listeners.lock().is_empty()
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.registry.listeners.lock().clear();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

struct SubscriptionState {
    name: String,
    id: ListenerId,
    disposed: AtomicBool,
    registry: Weak<dyn RemoveListener>,
}

/// Handle to one listener registration.
///
/// [`dispose`](Self::dispose) removes exactly that listener; calling it again,
/// or on a clone, does nothing. Dropping the handle does not remove the
/// listener.
#[derive(Clone)]
pub struct Subscription {
    state: Arc<SubscriptionState>,
}

impl Subscription {
    /// Remove the listener. Idempotent.
    pub fn dispose(&self) {
        if self.state.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.state.registry.upgrade() {
            registry.remove_listener(&self.state.name, self.state.id);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.state.disposed.load(Ordering::Acquire)
    }

    /// Event name this subscription listens to.
    pub fn event_name(&self) -> &str {
        &self.state.name
    }

    pub fn id(&self) -> ListenerId {
        self.state.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.state.name)
            .field("id", &self.state.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (Arc::clone(&log), log)
    }

    #[test]
    fn test_emit_in_registration_order() {
        let dispatcher = EventDispatcher::<u32>::new();
        let (log, handle) = recorder();

        for label in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            dispatcher.on("tick", move |value| log.lock().push(format!("{label}:{value}")));
        }

        assert_eq!(dispatcher.emit("tick", &7), 3);
        assert_eq!(
            *handle.lock(),
            vec!["first:7".to_string(), "second:7".to_string(), "third:7".to_string()]
        );
    }

    #[test]
    fn test_emit_unknown_name_is_noop() {
        let dispatcher = EventDispatcher::<u32>::new();
        dispatcher.on("a", |_| {});
        assert_eq!(dispatcher.emit("b", &1), 0);
    }

    #[test]
    fn test_registrations_for_other_names_are_independent() {
        let dispatcher = EventDispatcher::<u32>::new();
        dispatcher.on("a", |_| {});
        dispatcher.on("b", |_| {});
        dispatcher.on("b", |_| {});

        assert_eq!(dispatcher.listener_count("a"), 1);
        assert_eq!(dispatcher.listener_count("b"), 2);
    }

    #[test]
    fn test_once_fires_a_single_time() {
        let dispatcher = EventDispatcher::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        dispatcher.once("tick", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(dispatcher.emit("tick", &1), 1);
        assert_eq!(dispatcher.emit("tick", &2), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_once_is_removed_before_invocation() {
        let dispatcher = EventDispatcher::<u32>::new();
        let observed = Arc::new(Mutex::new(None));
        let probe = dispatcher.clone();
        let slot = Arc::clone(&observed);
        dispatcher.once("tick", move |_| {
            *slot.lock() = Some(probe.listener_count("tick"));
        });

        dispatcher.emit("tick", &1);
        assert_eq!(*observed.lock(), Some(0));
    }

    #[test]
    fn test_remove_listener_removes_only_that_registration() {
        let dispatcher = EventDispatcher::<u32>::new();
        let (log, handle) = recorder();

        let log_a = Arc::clone(&log);
        let a = dispatcher.on("tick", move |_| log_a.lock().push("a".to_string()));
        let log_b = Arc::clone(&log);
        dispatcher.on("tick", move |_| log_b.lock().push("b".to_string()));

        assert!(dispatcher.remove_listener("tick", a));
        assert!(!dispatcher.remove_listener("tick", a));
        assert!(!dispatcher.remove_listener("other", a));

        dispatcher.emit("tick", &0);
        assert_eq!(*handle.lock(), vec!["b".to_string()]);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let dispatcher = EventDispatcher::<u32>::new();
        let keep = dispatcher.on("tick", |_| {});
        let subscription = dispatcher.add_disposable_listener("tick", |_| {});
        let clone = subscription.clone();

        subscription.dispose();
        subscription.dispose();
        clone.dispose();

        assert!(clone.is_disposed());
        assert_eq!(dispatcher.listener_count("tick"), 1);
        assert!(dispatcher.remove_listener("tick", keep));
    }

    #[test]
    fn test_dispose_after_dispatcher_dropped() {
        let dispatcher = EventDispatcher::<u32>::new();
        let subscription = dispatcher.add_disposable_listener("tick", |_| {});
        drop(dispatcher);
        subscription.dispose();
        assert!(subscription.is_disposed());
    }

    #[test]
    fn test_disposable_once_can_be_cancelled() {
        let dispatcher = EventDispatcher::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = dispatcher.add_disposable_once("tick", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        subscription.dispose();
        assert_eq!(dispatcher.emit("tick", &1), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_the_rest() {
        let dispatcher = EventDispatcher::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        dispatcher.on("tick", |_| panic!("boom"));
        let counter = Arc::clone(&calls);
        dispatcher.on("tick", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(dispatcher.emit("tick", &1), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.listener_count("tick"), 2);
    }

    #[test]
    fn test_listener_may_register_during_emit() {
        let dispatcher = EventDispatcher::<u32>::new();
        let inner = dispatcher.clone();
        dispatcher.once("tick", move |_| {
            inner.on("tick", |_| {});
        });

        assert_eq!(dispatcher.emit("tick", &1), 1);
        assert_eq!(dispatcher.listener_count("tick"), 1);
    }

    #[test]
    fn test_clear() {
        let dispatcher = EventDispatcher::<u32>::new();
        dispatcher.on("a", |_| {});
        dispatcher.once("b", |_| {});
        dispatcher.clear();
        assert!(dispatcher.is_empty());
    }
}
