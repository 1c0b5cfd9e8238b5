//! Event Bus
//!
//! Typed publish/subscribe hub decoupling event producers (pipeline,
//! orchestrator) from consumers (UI bridges, loggers, debug tooling).
//!
//! Guarantees:
//! - subscribers of the same event name are invoked in subscription order;
//! - a panicking handler does not prevent later handlers from running;
//! - handlers may re-entrantly subscribe/unsubscribe, because the
//!   subscriber-list lock is released before any handler runs.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use super::types::{ChatEvent, EventName};

/// Handler invoked for each matching published event.
pub type EventHandler = Arc<dyn Fn(&ChatEvent) + Send + Sync>;

/// Predicate deciding whether a subscription sees a given event.
pub type EventFilter = Arc<dyn Fn(&ChatEvent) -> bool + Send + Sync>;

/// Options attached to a subscription.
#[derive(Default, Clone)]
pub struct SubscribeOptions {
    /// Only deliver events for which this predicate returns true
    pub filter: Option<EventFilter>,
    /// Free-form tag for introspection/grouping
    pub category: Option<String>,
}

impl SubscribeOptions {
    /// Builder pattern: set a filter predicate.
    pub fn with_filter(mut self, filter: impl Fn(&ChatEvent) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Builder pattern: set a category tag.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Handle returned by `subscribe`, usable to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle(u64);

/// Introspection snapshot of the bus.
#[derive(Debug, Clone)]
pub struct BusMetadata {
    /// Distinct event names with at least one current subscription
    pub registered_event_names: Vec<String>,
    /// Publish counts per event name, including names with no subscribers
    pub publish_counts: HashMap<String, u64>,
    /// Category tags of current subscriptions, grouped by event name
    pub categories: HashMap<String, Vec<String>>,
}

struct Subscription {
    id: u64,
    name: EventName,
    handler: EventHandler,
    filter: Option<EventFilter>,
    category: Option<String>,
}

#[derive(Default)]
struct BusInner {
    subscriptions: Vec<Subscription>,
    publish_counts: HashMap<EventName, u64>,
    next_id: u64,
}

/// Typed publish/subscribe hub. One shared instance per process, owned
/// explicitly by the host and passed by `Arc` into the orchestrator.
#[derive(Default)]
pub struct EventBus {
    inner: Mutex<BusInner>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event name.
    pub fn subscribe(
        &self,
        name: EventName,
        handler: impl Fn(&ChatEvent) + Send + Sync + 'static,
        options: SubscribeOptions,
    ) -> SubscriptionHandle {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscriptions.push(Subscription {
            id,
            name,
            handler: Arc::new(handler),
            filter: options.filter,
            category: options.category,
        });
        SubscriptionHandle(id)
    }

    /// Remove a handler. No-op if the handle was already removed.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut inner = self.lock();
        inner.subscriptions.retain(|s| s.id != handle.0);
    }

    /// Synchronously deliver an event to all current subscribers of its name
    /// whose filter (if any) accepts it.
    ///
    /// The matching handler set is snapshotted under the lock, then invoked
    /// with the lock released, so handlers may publish or (un)subscribe.
    pub fn publish(&self, event: &ChatEvent) {
        let name = event.name();
        let handlers: Vec<(EventHandler, Option<EventFilter>)> = {
            let mut inner = self.lock();
            *inner.publish_counts.entry(name).or_insert(0) += 1;
            inner
                .subscriptions
                .iter()
                .filter(|s| s.name == name)
                .map(|s| (s.handler.clone(), s.filter.clone()))
                .collect()
        };

        for (handler, filter) in handlers {
            if let Some(filter) = &filter {
                if !filter(event) {
                    continue;
                }
            }
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                tracing::warn!(event = %name, "event handler panicked; continuing with remaining handlers");
            }
        }
    }

    /// Introspection snapshot: subscribed names, publish counts, categories.
    pub fn metadata(&self) -> BusMetadata {
        let inner = self.lock();

        let mut registered: Vec<String> = Vec::new();
        let mut categories: HashMap<String, Vec<String>> = HashMap::new();
        for sub in &inner.subscriptions {
            let name = sub.name.as_str().to_string();
            if !registered.contains(&name) {
                registered.push(name.clone());
            }
            if let Some(category) = &sub.category {
                categories.entry(name).or_default().push(category.clone());
            }
        }

        let publish_counts = inner
            .publish_counts
            .iter()
            .map(|(name, count)| (name.as_str().to_string(), *count))
            .collect();

        BusMetadata {
            registered_event_names: registered,
            publish_counts,
            categories,
        }
    }

    /// Number of current subscriptions (all names).
    pub fn subscription_count(&self) -> usize {
        self.lock().subscriptions.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BusInner> {
        // A poisoning panic can only happen outside handler invocation, so
        // the subscriber list is still structurally sound.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
