//! Listener trait: the inbound side of an endpoint's queue.

use std::sync::Arc;
use std::time::Duration;

use super::error::TransportError;
use super::message::{Address, Envelope};

/// Trait for owning and draining an inbound queue (point-to-point).
///
/// Each address has exactly one listener: the worker of the endpoint that
/// owns it.
pub trait Listener: Send + Sync {
    /// Open the queue for `address`. Opening an open queue is a no-op.
    fn open(&self, address: &Address) -> Result<(), TransportError>;

    /// Take the next envelope, blocking until one is available or the
    /// timeout expires.
    fn listen(&self, address: &Address, timeout: Duration)
        -> Result<Option<Envelope>, TransportError>;

    /// Close the queue and return whatever was still pending, oldest first.
    ///
    /// After this returns, sends to `address` fail with
    /// `TransportError::Unavailable`.
    fn close(&self, address: &Address) -> Vec<Envelope>;
}

impl<T: Listener + ?Sized> Listener for Arc<T> {
    fn open(&self, address: &Address) -> Result<(), TransportError> {
        (**self).open(address)
    }

    fn listen(
        &self,
        address: &Address,
        timeout: Duration,
    ) -> Result<Option<Envelope>, TransportError> {
        (**self).listen(address, timeout)
    }

    fn close(&self, address: &Address) -> Vec<Envelope> {
        (**self).close(address)
    }
}
