//! Subscription registry: which endpoints want which event types.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::message::Address;
use super::observer::{SubscriptionEvent, SubscriptionObserver};

/// The authoritative set of (event type, subscriber) pairs.
///
/// This is the only state several endpoints mutate concurrently. Every
/// mutation and every read happens under one lock, so a snapshot never
/// observes a half-applied change. Observers are notified after the lock is
/// released.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: RwLock<HashMap<String, BTreeSet<Address>>>,
    observers: RwLock<Vec<Arc<dyn SubscriptionObserver>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for subscription notifications.
    pub fn observe(&self, observer: Arc<dyn SubscriptionObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Subscribe `subscriber` to `message_type`.
    ///
    /// Idempotent. Returns `true` when the subscription is new. Observers are
    /// notified on every call as confirmation that the subscriber is live.
    pub fn subscribe(&self, message_type: &str, subscriber: &Address) -> bool {
        let added = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(message_type.to_string())
            .or_default()
            .insert(subscriber.clone());

        debug!(message_type, %subscriber, added, "subscribed");

        self.notify(&SubscriptionEvent::Subscribed {
            message_type: message_type.to_string(),
            subscriber: subscriber.clone(),
        });
        added
    }

    /// Remove one subscription. Idempotent; returns whether it existed.
    pub fn unsubscribe(&self, message_type: &str, subscriber: &Address) -> bool {
        let removed = {
            let mut subscriptions = self
                .subscriptions
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let removed = subscriptions
                .get_mut(message_type)
                .is_some_and(|set| set.remove(subscriber));
            if subscriptions.get(message_type).is_some_and(BTreeSet::is_empty) {
                subscriptions.remove(message_type);
            }
            removed
        };

        if removed {
            debug!(message_type, %subscriber, "unsubscribed");
            self.notify(&SubscriptionEvent::Unsubscribed {
                message_type: message_type.to_string(),
                subscriber: subscriber.clone(),
            });
        }
        removed
    }

    /// Remove every subscription held by `subscriber`. Returns the message
    /// types it was removed from.
    pub fn unsubscribe_all(&self, subscriber: &Address) -> Vec<String> {
        let removed: Vec<String> = {
            let mut subscriptions = self
                .subscriptions
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let mut removed = Vec::new();
            subscriptions.retain(|message_type, set| {
                if set.remove(subscriber) {
                    removed.push(message_type.clone());
                }
                !set.is_empty()
            });
            removed.sort();
            removed
        };

        for message_type in &removed {
            debug!(message_type = %message_type, %subscriber, "unsubscribed");
            self.notify(&SubscriptionEvent::Unsubscribed {
                message_type: message_type.clone(),
                subscriber: subscriber.clone(),
            });
        }
        removed
    }

    /// Snapshot of the current subscribers of `message_type`.
    pub fn subscribers_of(&self, message_type: &str) -> BTreeSet<Address> {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(message_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Message types `subscriber` is subscribed to, sorted.
    pub fn subscriptions_of(&self, subscriber: &Address) -> Vec<String> {
        let mut types: Vec<String> = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, set)| set.contains(subscriber))
            .map(|(message_type, _)| message_type.clone())
            .collect();
        types.sort();
        types
    }

    fn notify(&self, event: &SubscriptionEvent) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.notify(event);
        }
    }
}
