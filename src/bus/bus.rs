//! Bus - typed client handle over the router.

use std::sync::Arc;

use super::{Address, Envelope, Message, PublishReport, RouteError, Router};

/// Typed handle for sending commands and publishing events.
///
/// Cheap to clone. Clients outside any endpoint use it to kick off work;
/// handlers use their `Context` instead so outgoing messages are tied to the
/// message being handled.
///
/// ## Example
///
/// ```ignore
/// let bus = host.bus();
/// bus.send(&RegisterOrder { order_id: 1, customer_name: "John".into(), amount: 500.into() })?;
/// ```
#[derive(Clone)]
pub struct Bus {
    router: Arc<Router>,
    origin: Option<Address>,
}

impl Bus {
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            origin: None,
        }
    }

    /// Stamp outgoing envelopes with an origin address.
    pub fn with_origin(mut self, origin: impl Into<Address>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Send a command to its owning endpoint.
    pub fn send<M: Message>(&self, command: &M) -> Result<Address, RouteError> {
        self.router.send_command(self.envelope(command)?)
    }

    /// Publish an event to its current subscribers.
    pub fn publish<M: Message>(&self, event: &M) -> Result<PublishReport, RouteError> {
        self.router.publish_event(self.envelope(event)?)
    }

    /// Send a prebuilt envelope, routed by its kind.
    pub fn dispatch(&self, envelope: Envelope) -> Result<PublishReport, RouteError> {
        match envelope.kind() {
            super::MessageKind::Command => {
                let owner = self.router.send_command(envelope)?;
                Ok(PublishReport {
                    delivered: vec![owner],
                    failed: Vec::new(),
                })
            }
            super::MessageKind::Event => self.router.publish_event(envelope),
        }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    fn envelope<M: Message>(&self, message: &M) -> Result<Envelope, RouteError> {
        let envelope = Envelope::encode(message)?;
        Ok(match &self.origin {
            Some(origin) => envelope.with_origin(origin.clone()),
            None => envelope,
        })
    }
}
