//! Observable session state.
//!
//! Holds who is currently logged in and pushes every change to registered
//! listeners. A new listener is handed the current value right away, then
//! each later value in publish order. History is never replayed.
//!
//! Changes are queued under the registry lock and delivered afterwards with
//! no lock held. Whichever thread finds the queue idle drains it, so a
//! listener may call back into the session (or the service that owns it)
//! and anything it publishes is delivered after the current batch.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};

use super::store::User;

/// Callback invoked with the session value
pub type Listener = Arc<dyn Fn(Option<&User>) + Send + Sync>;

/// A value waiting to be handed to a fixed set of listeners
struct Delivery {
    value: Option<User>,
    targets: Vec<(u64, Listener)>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
    pending: VecDeque<Delivery>,
    delivering: bool,
}

impl Registry {
    fn is_registered(&self, id: u64) -> bool {
        self.listeners.iter().any(|(registered, _)| *registered == id)
    }
}

/// A single optional current user plus its listeners.
///
/// Lock order is registry, then value. Listeners run with no lock held.
pub struct SessionState {
    current: RwLock<Option<User>>,
    registry: Arc<Mutex<Registry>>,
}

impl SessionState {
    pub fn new(initial: Option<User>) -> Self {
        Self {
            current: RwLock::new(initial),
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Current value without subscribing
    pub fn value(&self) -> Option<User> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Registers `listener` and immediately delivers the current value to it.
    ///
    /// The initial value is queued in the same order as published changes,
    /// so it can never arrive after a newer value. The listener stays
    /// registered until the returned handle is dropped or
    /// [`Subscription::unsubscribe`] is called.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Option<&User>) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);

        let id = {
            let mut registry = self.lock_registry();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, Arc::clone(&listener)));
            let value = self.value();
            registry.pending.push_back(Delivery {
                value,
                targets: vec![(id, listener)],
            });
            id
        };

        self.deliver_pending();

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Replace the value and notify every listener in subscription order
    #[cfg(test)]
    pub(crate) fn publish(&self, value: Option<User>) {
        self.stage(value);
        self.deliver_pending();
    }

    /// Replace the value and queue the notification without delivering it.
    ///
    /// Lets a caller record the change while it still holds its own lock,
    /// then call [`SessionState::deliver_pending`] after releasing it.
    pub(crate) fn stage(&self, value: Option<User>) {
        let mut registry = self.lock_registry();
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = value.clone();
        let targets = registry.listeners.clone();
        registry.pending.push_back(Delivery { value, targets });
    }

    /// Hand queued values to their listeners, unless another call is already
    /// doing so. Must not be called with a lock the listeners might need.
    pub(crate) fn deliver_pending(&self) {
        {
            let mut registry = self.lock_registry();
            if registry.delivering {
                return;
            }
            registry.delivering = true;
        }
        let _reset = ResetOnPanic(&self.registry);

        loop {
            let delivery = {
                let mut registry = self.lock_registry();
                match registry.pending.pop_front() {
                    Some(delivery) => delivery,
                    None => {
                        registry.delivering = false;
                        return;
                    }
                }
            };

            for (id, listener) in delivery.targets {
                // Skip listeners that unsubscribed after the value was queued
                if self.lock_registry().is_registered(id) {
                    listener(delivery.value.as_ref());
                }
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_registry().listeners.len()
    }

    fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Frees the delivery slot if a listener panics mid-delivery
struct ResetOnPanic<'a>(&'a Mutex<Registry>);

impl Drop for ResetOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut registry = self.0.lock().unwrap_or_else(|e| e.into_inner());
            registry.delivering = false;
        }
    }
}

/// Handle for a registered listener
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Stop receiving updates
    pub fn unsubscribe(self) {}

    /// False once the session state itself has been dropped
    pub fn is_active(&self) -> bool {
        self.registry.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap_or_else(|e| e.into_inner());
            registry.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
