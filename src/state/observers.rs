// Synchronous property observers
//
// This is the binding side of the editor: a UI registers a callback per
// property and is called back on the notifying thread as soon as that
// property changes. The registry knows nothing about where values are stored.

use super::Property;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Handle returned by [`ObserverRegistry::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(Property) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    property: Property,
    callback: Callback,
}

/// Registry of per-property change callbacks
///
/// Callbacks are invoked synchronously, in subscription order. A callback may
/// subscribe or unsubscribe while being notified; the change takes effect for
/// the next notification.
#[derive(Default)]
pub struct ObserverRegistry {
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for changes of `property`
    pub fn subscribe<F>(&self, property: Property, callback: F) -> SubscriptionId
    where
        F: Fn(Property) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(|e| e.into_inner());
        subscriptions.push(Subscription {
            id,
            property,
            callback: Arc::new(callback),
        });
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(|e| e.into_inner());
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    /// Call every callback registered for `property`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify(&self, property: Property) -> usize {
        // Callbacks run outside the lock so they can touch the registry
        let callbacks: Vec<Callback> = {
            let subscriptions = self.subscriptions.lock().unwrap_or_else(|e| e.into_inner());
            subscriptions
                .iter()
                .filter(|s| s.property == property)
                .map(|s| Arc::clone(&s.callback))
                .collect()
        };

        for callback in &callbacks {
            callback(property);
        }
        callbacks.len()
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("subscriptions", &self.len())
            .finish()
    }
}
