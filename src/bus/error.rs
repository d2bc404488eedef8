//! Error types for transports and routing.

use thiserror::Error;

use super::message::{Address, MessageKind};

/// Failure reported by a transport when enqueueing or dequeueing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The queue is not open (never opened, or already closed).
    #[error("queue unavailable: {0}")]
    Unavailable(Address),
    /// The queue is at capacity.
    #[error("queue full: {address} (capacity {capacity})")]
    Full { address: Address, capacity: usize },
    /// The transport refused the message permanently.
    #[error("message rejected: {0}")]
    Rejected(String),
}

impl TransportError {
    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Unavailable(_) | TransportError::Full { .. }
        )
    }
}

/// A message that could not be handed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("delivery of {message_type} {message_id} to {address} failed after {attempts} attempt(s): {error}")]
pub struct DeliveryFailure {
    pub address: Address,
    pub message_id: String,
    pub message_type: String,
    pub attempts: u32,
    pub error: TransportError,
}

/// Error returned synchronously by the router.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No endpoint owns this command type.
    #[error("unroutable command: {0}")]
    UnroutableCommand(String),
    /// A command was published or an event was sent.
    #[error("{message_type} is a {actual}, expected a {expected}")]
    WrongKind {
        message_type: String,
        expected: MessageKind,
        actual: MessageKind,
    },
    /// The message could not be encoded.
    #[error("encode failed: {0}")]
    Encode(#[from] bitcode::Error),
    /// The single owner of a command could not accept it.
    #[error(transparent)]
    DeliveryFailed(#[from] DeliveryFailure),
}
