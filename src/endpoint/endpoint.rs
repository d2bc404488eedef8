//! Endpoint: handler table and dispatch.
//!
//! An `Endpoint` is a named address plus a table from message type to
//! handler function. The table is built explicitly at startup; there is no
//! discovery.
//!
//! ## Example
//!
//! ```ignore
//! let shipping = Endpoint::new("Shipping")
//!     .handle_message(|ctx, accepted: OrderAccepted| {
//!         ctx.publish(&OrderShipped { order_id: accepted.order_id })
//!     });
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::bus::{Address, Envelope, Message, Router};

use super::context::Context;
use super::error::HandlerError;

type HandlerFn = dyn Fn(&Context<'_>) -> Result<(), HandlerError> + Send + Sync;
type FailureFn = dyn Fn(&Envelope, &HandlerError) + Send + Sync;

/// A named endpoint with one handler per message type.
pub struct Endpoint {
    address: Address,
    handlers: HashMap<String, Box<HandlerFn>>,
    on_failure: Option<Box<FailureFn>>,
}

impl Endpoint {
    pub fn new(name: impl Into<Address>) -> Self {
        Self {
            address: name.into(),
            handlers: HashMap::new(),
            on_failure: None,
        }
    }

    /// Register a handler for a message type.
    ///
    /// Returns `self` for chaining. Registering the same type twice replaces
    /// the earlier handler.
    pub fn handle<F>(mut self, message_type: &str, handler: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.handlers
            .insert(message_type.to_string(), Box::new(handler));
        self
    }

    /// Register a handler that receives the decoded message.
    pub fn handle_message<M, F>(self, handler: F) -> Self
    where
        M: Message + 'static,
        F: Fn(&Context<'_>, M) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.handle(M::MESSAGE_TYPE, move |ctx| {
            let message = ctx.message::<M>()?;
            handler(ctx, message)
        })
    }

    /// Called with every message whose handler failed.
    ///
    /// The runtime never re-enqueues a failed message; this hook is where a
    /// retry or dead-letter policy can be attached.
    pub fn on_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Envelope, &HandlerError) + Send + Sync + 'static,
    {
        self.on_failure = Some(Box::new(hook));
        self
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn handles(&self, message_type: &str) -> bool {
        self.handlers.contains_key(message_type)
    }

    /// Registered message types, sorted.
    pub fn message_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Run the handler for `envelope` and return the messages it produced.
    ///
    /// Nothing is returned when the handler fails; its outgoing messages are
    /// discarded.
    pub fn dispatch(
        &self,
        envelope: &Envelope,
        router: &Router,
    ) -> Result<Vec<Envelope>, HandlerError> {
        let handler = self
            .handlers
            .get(envelope.message_type())
            .ok_or_else(|| HandlerError::NoHandler(envelope.message_type().to_string()))?;

        let ctx = Context::new(&self.address, envelope, router);
        handler(&ctx)?;
        Ok(ctx.into_outgoing())
    }

    pub(crate) fn report_failure(&self, envelope: &Envelope, error: &HandlerError) {
        if let Some(hook) = &self.on_failure {
            hook(envelope, error);
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("address", &self.address)
            .field("handlers", &self.message_types())
            .finish()
    }
}
