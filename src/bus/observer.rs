//! Subscription notifications.
//!
//! The registry tells every registered observer when an endpoint subscribes
//! or unsubscribes. Publishers use this to know that a subscriber is live
//! before sending the first event.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::message::Address;

/// A change in the subscription registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionEvent {
    /// Emitted for every `subscribe` call, including repeats.
    Subscribed {
        message_type: String,
        subscriber: Address,
    },
    /// Emitted when a subscription was actually removed.
    Unsubscribed {
        message_type: String,
        subscriber: Address,
    },
}

impl SubscriptionEvent {
    pub fn message_type(&self) -> &str {
        match self {
            SubscriptionEvent::Subscribed { message_type, .. }
            | SubscriptionEvent::Unsubscribed { message_type, .. } => message_type,
        }
    }

    pub fn subscriber(&self) -> &Address {
        match self {
            SubscriptionEvent::Subscribed { subscriber, .. }
            | SubscriptionEvent::Unsubscribed { subscriber, .. } => subscriber,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        matches!(self, SubscriptionEvent::Subscribed { .. })
    }
}

/// Receives subscription notifications from the registry.
///
/// Called after the registry lock is released, on the thread that changed
/// the subscription.
pub trait SubscriptionObserver: Send + Sync {
    fn notify(&self, event: &SubscriptionEvent);
}

impl<F> SubscriptionObserver for F
where
    F: Fn(&SubscriptionEvent) + Send + Sync,
{
    fn notify(&self, event: &SubscriptionEvent) {
        self(event)
    }
}

/// Observer that records notifications and lets callers wait for one.
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use order_bus::bus::{Address, SubscriptionRegistry, SubscriptionWatch};
///
/// let registry = SubscriptionRegistry::new();
/// let watch = Arc::new(SubscriptionWatch::new());
/// registry.observe(watch.clone());
///
/// registry.subscribe("OrderAccepted", &Address::new("Shipping"));
///
/// assert!(watch.wait_for_subscriber("OrderAccepted", "Shipping", Duration::from_millis(10)));
/// ```
#[derive(Default)]
pub struct SubscriptionWatch {
    events: Mutex<Vec<SubscriptionEvent>>,
    changed: Condvar,
}

impl SubscriptionWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications seen so far.
    pub fn events(&self) -> Vec<SubscriptionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Block until a recorded notification satisfies `predicate` or the
    /// timeout expires. Returns whether one was seen.
    pub fn wait_until<P>(&self, timeout: Duration, predicate: P) -> bool
    where
        P: Fn(&SubscriptionEvent) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            if events.iter().any(&predicate) {
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            events = self
                .changed
                .wait_timeout(events, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Wait until the endpoint at `subscriber` has subscribed to
    /// `message_type`.
    pub fn wait_for_subscriber(
        &self,
        message_type: &str,
        subscriber: &str,
        timeout: Duration,
    ) -> bool {
        self.wait_until(timeout, |event| {
            event.is_subscribed()
                && event.message_type() == message_type
                && event.subscriber().as_str() == subscriber
        })
    }
}

impl SubscriptionObserver for SubscriptionWatch {
    fn notify(&self, event: &SubscriptionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        self.changed.notify_all();
    }
}

/// Forwards subscription notifications to an `EventEmitter`.
///
/// Listeners registered with `on_subscribed` / `on_unsubscribed` receive the
/// `SubscriptionEvent`. The emitter runs each listener on its own thread;
/// `notify` waits for them before returning.
#[cfg(feature = "emitter")]
pub struct EmitterObserver {
    emitter: Mutex<event_emitter_rs::EventEmitter>,
}

#[cfg(feature = "emitter")]
impl EmitterObserver {
    pub const SUBSCRIBED: &'static str = "subscribed";
    pub const UNSUBSCRIBED: &'static str = "unsubscribed";

    pub fn new() -> Self {
        Self {
            emitter: Mutex::new(event_emitter_rs::EventEmitter::new()),
        }
    }

    /// Register a listener for new or confirmed subscriptions.
    pub fn on_subscribed<F>(&self, listener: F) -> String
    where
        F: Fn(SubscriptionEvent) + Send + Sync + 'static,
    {
        self.emitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on(Self::SUBSCRIBED, listener)
    }

    /// Register a listener for removed subscriptions.
    pub fn on_unsubscribed<F>(&self, listener: F) -> String
    where
        F: Fn(SubscriptionEvent) + Send + Sync + 'static,
    {
        self.emitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on(Self::UNSUBSCRIBED, listener)
    }
}

#[cfg(feature = "emitter")]
impl Default for EmitterObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "emitter")]
impl SubscriptionObserver for EmitterObserver {
    fn notify(&self, event: &SubscriptionEvent) {
        let name = if event.is_subscribed() {
            Self::SUBSCRIBED
        } else {
            Self::UNSUBSCRIBED
        };

        let handles = self
            .emitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .emit(name, event.clone());

        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!(notification = name, "subscription listener panicked");
            }
        }
    }
}
