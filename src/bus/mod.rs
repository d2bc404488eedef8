//! Service Bus - message envelope, routing and subscriptions
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Bus (typed client handle)                    │
//! │  - send::<Command>() / publish::<Event>()                    │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Router                              │
//! │  commands → CommandRoutes (one owner)                        │
//! │  events   → SubscriptionRegistry snapshot (fan-out)          │
//! │  bounded retry of transient failures (RetryPolicy)           │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │             Sender (enqueue) + Listener (inbound)            │
//! └─────────────────────────────────────────────────────────────┘
//!          │                                        │
//!          ▼                                        ▼
//! ┌─────────────────┐                    ┌─────────────────────┐
//! │  InMemoryQueue  │                    │  other transports   │
//! │   (included)    │                    │     (external)      │
//! └─────────────────┘                    └─────────────────────┘
//! ```
//!
//! Delivery is at-least-once per subscriber registered at publish time.
//! An event published before a subscriber registers is never replayed to it.

#[allow(clippy::module_inception)]
mod bus;
mod error;
mod in_memory_queue;
mod listener;
mod message;
mod observer;
mod registry;
mod retry;
mod router;
mod sender;

pub use bus::Bus;
pub use error::{DeliveryFailure, RouteError, TransportError};
pub use in_memory_queue::InMemoryQueue;
pub use listener::Listener;
pub use message::{Address, Envelope, Message, MessageKind};
#[cfg(feature = "emitter")]
pub use observer::EmitterObserver;
pub use observer::{SubscriptionEvent, SubscriptionObserver, SubscriptionWatch};
pub use registry::SubscriptionRegistry;
pub use retry::RetryPolicy;
pub use router::{CommandRoutes, PublishReport, Router};
pub use sender::Sender;
