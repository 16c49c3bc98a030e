use std::cell::RefCell;

use crate::events::{EventEmitter, SubscriptionId};
use crate::metric::Metric;

/// Cached metric values plus change notification.
///
/// A value stays cached until its metric, or one of its dependencies, is
/// notified. Notification always publishes, whether or not the underlying
/// value actually moved.
#[derive(Debug, Default)]
pub struct ReactiveStore {
    cache: RefCell<[Option<f64>; Metric::COUNT]>,
    changes: EventEmitter<Metric>,
}

impl ReactiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, metric: Metric) -> Option<f64> {
        self.cache.borrow()[metric.index()]
    }

    /// Return the cached value, or compute and cache it.
    ///
    /// `compute` runs without the cache borrowed, so it may read other
    /// metrics through this store.
    pub fn get_or_compute(&self, metric: Metric, compute: impl FnOnce() -> f64) -> f64 {
        if let Some(value) = self.cached(metric) {
            return value;
        }
        let value = compute();
        self.cache.borrow_mut()[metric.index()] = Some(value);
        value
    }

    /// Drop the cached value. Returns whether one was present.
    pub fn invalidate(&self, metric: Metric) -> bool {
        self.cache.borrow_mut()[metric.index()].take().is_some()
    }

    /// Invalidate `metric` and its dependents, then tell observers, the
    /// metric itself first. Returns the number of deliveries made.
    pub fn notify_property_change(&self, metric: Metric) -> usize {
        self.invalidate(metric);
        for dependent in metric.dependents() {
            self.invalidate(dependent);
        }
        let mut delivered = self.changes.publish(&metric);
        for dependent in metric.dependents() {
            delivered += self.changes.publish(&dependent);
        }
        delivered
    }

    pub fn observe(&self, observer: impl Fn(&Metric) + 'static) -> SubscriptionId {
        self.changes.subscribe(observer)
    }

    pub fn unobserve(&self, id: SubscriptionId) -> bool {
        self.changes.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.changes.len()
    }

    /// Forget every cached value and every observer.
    pub fn reset(&self) {
        *self.cache.borrow_mut() = [None; Metric::COUNT];
        self.changes.clear();
    }
}
