//! Sender trait: the enqueue primitive the router delivers through.

use std::sync::Arc;

use super::error::TransportError;
use super::message::{Address, Envelope};

/// Trait for enqueueing an envelope onto an endpoint's inbound queue.
///
/// The router is the only caller. It decides who receives a message
/// (one owner for commands, every subscriber for events) and calls `send`
/// once per recipient with that recipient's own copy.
pub trait Sender: Send + Sync {
    /// Enqueue an envelope for the endpoint at `address`.
    fn send(&self, address: &Address, envelope: Envelope) -> Result<(), TransportError>;
}

impl<T: Sender + ?Sized> Sender for Arc<T> {
    fn send(&self, address: &Address, envelope: Envelope) -> Result<(), TransportError> {
        (**self).send(address, envelope)
    }
}
