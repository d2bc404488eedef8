//! Error types for message handlers.

use std::error::Error as StdError;

use thiserror::Error;

use crate::bus::RouteError;

/// Error returned by a handler, or raised while invoking it.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// No handler registered for this message type.
    #[error("no handler for message type: {0}")]
    NoHandler(String),
    /// The handler asked for a different message than the one delivered.
    #[error("expected {expected}, received {actual}")]
    WrongMessage { expected: String, actual: String },
    /// Payload decode failed.
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    /// Outgoing message encode failed.
    #[error("encode failed: {0}")]
    EncodeFailed(String),
    /// An outgoing message could not be routed.
    #[error("routing failed: {0}")]
    Route(#[from] RouteError),
    /// Business logic rejected the message.
    #[error("rejected: {0}")]
    Rejected(String),
    /// The handler panicked; the worker caught it and kept running.
    #[error("handler panicked: {0}")]
    Panicked(String),
    /// Other error.
    #[error("handler error: {0}")]
    Other(Box<dyn StdError + Send + Sync>),
}

impl HandlerError {
    /// Wrap any error as `HandlerError::Other`.
    pub fn other(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        HandlerError::Other(err.into())
    }
}
