//! Context passed to message handlers.
//!
//! Carries the inbound envelope and collects the messages a handler wants to
//! send or publish. Outgoing messages are only dispatched after the handler
//! returns `Ok`.

use std::cell::RefCell;

use crate::bus::{Address, Envelope, Message, MessageKind, RouteError, Router};

use super::error::HandlerError;

/// The context passed to every handler.
///
/// ## Example
///
/// ```ignore
/// pub fn handle(ctx: &Context) -> Result<(), HandlerError> {
///     let accepted = ctx.message::<OrderAccepted>()?;
///     ctx.publish(&OrderShipped { order_id: accepted.order_id })
/// }
/// ```
pub struct Context<'a> {
    endpoint: &'a Address,
    envelope: &'a Envelope,
    router: &'a Router,
    outgoing: RefCell<Vec<Envelope>>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(endpoint: &'a Address, envelope: &'a Envelope, router: &'a Router) -> Self {
        Self {
            endpoint,
            envelope,
            router,
            outgoing: RefCell::new(Vec::new()),
        }
    }

    /// Decode the inbound message as `M`.
    pub fn message<M: Message>(&self) -> Result<M, HandlerError> {
        if !self.envelope.is::<M>() {
            return Err(HandlerError::WrongMessage {
                expected: M::MESSAGE_TYPE.to_string(),
                actual: self.envelope.message_type().to_string(),
            });
        }
        self.envelope
            .decode()
            .map_err(|e| HandlerError::DecodeFailed(e.to_string()))
    }

    /// The inbound envelope.
    pub fn envelope(&self) -> &Envelope {
        self.envelope
    }

    /// Address of the endpoint handling the message.
    pub fn endpoint(&self) -> &Address {
        self.endpoint
    }

    /// Publish an event once the handler succeeds.
    pub fn publish<M: Message>(&self, event: &M) -> Result<(), HandlerError> {
        self.push(event, MessageKind::Event)
    }

    /// Send a command once the handler succeeds.
    ///
    /// The route is checked now, so an unroutable command fails the handler.
    pub fn send<M: Message>(&self, command: &M) -> Result<(), HandlerError> {
        if M::KIND == MessageKind::Command {
            self.router.route_for(M::MESSAGE_TYPE)?;
        }
        self.push(command, MessageKind::Command)
    }

    /// Messages queued so far.
    pub fn outgoing(&self) -> Vec<Envelope> {
        self.outgoing.borrow().clone()
    }

    pub(crate) fn into_outgoing(self) -> Vec<Envelope> {
        self.outgoing.into_inner()
    }

    fn push<M: Message>(&self, message: &M, expected: MessageKind) -> Result<(), HandlerError> {
        if M::KIND != expected {
            return Err(RouteError::WrongKind {
                message_type: M::MESSAGE_TYPE.to_string(),
                expected,
                actual: M::KIND,
            }
            .into());
        }

        let envelope = Envelope::encode(message)
            .map_err(|e| HandlerError::EncodeFailed(e.to_string()))?
            .with_origin(self.endpoint.clone())
            .with_causation_id(self.envelope.id());
        self.outgoing.borrow_mut().push(envelope);
        Ok(())
    }
}
