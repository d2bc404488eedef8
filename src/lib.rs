//! Publish/subscribe order processing on an in-process service bus.
//!
//! - [`bus`]: envelopes, command routing, event fan-out, subscriptions
//! - [`endpoint`]: handler tables and the per-endpoint worker runtime
//! - [`host`]: configuration and the runtime context that starts endpoints
//! - [`orders`]: the Sales / Shipping workflow built on top

pub mod bus;
pub mod endpoint;
pub mod host;
pub mod orders;

pub use bus::{Address, Bus, Envelope, Message, MessageKind, RouteError};
pub use endpoint::{Context, Endpoint, HandlerError};
pub use host::{BusConfig, ConfigError, EndpointConfig, Host};

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
