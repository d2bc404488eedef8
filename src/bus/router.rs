//! Router: decides who receives a message and hands it to the transport.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use super::error::{DeliveryFailure, RouteError};
use super::message::{Address, Envelope, MessageKind};
use super::registry::SubscriptionRegistry;
use super::retry::RetryPolicy;
use super::sender::Sender;

/// Static map from command type to its single owning endpoint.
///
/// Built once at configuration time. There are no mutators.
#[derive(Clone, Debug, Default)]
pub struct CommandRoutes {
    routes: HashMap<String, Address>,
}

impl CommandRoutes {
    pub fn owner_of(&self, message_type: &str) -> Option<&Address> {
        self.routes.get(message_type)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Address)> {
        self.routes.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, A> FromIterator<(K, A)> for CommandRoutes
where
    K: Into<String>,
    A: Into<Address>,
{
    fn from_iter<I: IntoIterator<Item = (K, A)>>(iter: I) -> Self {
        Self {
            routes: iter
                .into_iter()
                .map(|(k, a)| (k.into(), a.into()))
                .collect(),
        }
    }
}

/// Outcome of publishing one event.
#[derive(Debug, Default)]
pub struct PublishReport {
    /// Subscribers whose queue accepted the event.
    pub delivered: Vec<Address>,
    /// Subscribers that could not be reached after retries.
    pub failed: Vec<DeliveryFailure>,
}

impl PublishReport {
    /// Whether nobody was subscribed when the event was published.
    pub fn is_unobserved(&self) -> bool {
        self.delivered.is_empty() && self.failed.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Routes commands point-to-point and fans events out to subscribers.
///
/// Delivery runs on the caller's thread, recipient by recipient, so messages
/// from one publisher reach each subscriber in publish order. Transient
/// transport errors are retried according to the `RetryPolicy`; the backoff
/// only delays the calling endpoint.
pub struct Router {
    registry: Arc<SubscriptionRegistry>,
    routes: CommandRoutes,
    sender: Arc<dyn Sender>,
    retry: RetryPolicy,
}

impl Router {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        routes: CommandRoutes,
        sender: Arc<dyn Sender>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            registry,
            routes,
            sender,
            retry,
        }
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn routes(&self) -> &CommandRoutes {
        &self.routes
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Owner of a command type, or `UnroutableCommand`.
    pub fn route_for(&self, message_type: &str) -> Result<&Address, RouteError> {
        self.routes
            .owner_of(message_type)
            .ok_or_else(|| RouteError::UnroutableCommand(message_type.to_string()))
    }

    /// Send a command to its single owning endpoint.
    ///
    /// Returns the address it was delivered to.
    pub fn send_command(&self, envelope: Envelope) -> Result<Address, RouteError> {
        expect_kind(&envelope, MessageKind::Command)?;
        let owner = self.route_for(envelope.message_type())?.clone();

        self.deliver(&owner, envelope)?;
        Ok(owner)
    }

    /// Publish an event to every endpoint subscribed at this moment.
    ///
    /// Publishing with no subscribers is not an error; the report is empty.
    /// A failed subscriber is logged and reported without affecting the
    /// others.
    pub fn publish_event(&self, envelope: Envelope) -> Result<PublishReport, RouteError> {
        expect_kind(&envelope, MessageKind::Event)?;
        let subscribers: BTreeSet<Address> = self.registry.subscribers_of(envelope.message_type());

        let mut report = PublishReport::default();
        if subscribers.is_empty() {
            debug!(
                message_type = envelope.message_type(),
                message_id = envelope.id(),
                "published with no subscribers"
            );
            return Ok(report);
        }

        for subscriber in subscribers {
            match self.deliver(&subscriber, envelope.clone()) {
                Ok(()) => report.delivered.push(subscriber),
                Err(failure) => {
                    warn!(
                        message_type = envelope.message_type(),
                        message_id = envelope.id(),
                        subscriber = %failure.address,
                        attempts = failure.attempts,
                        error = %failure.error,
                        "event delivery failed"
                    );
                    report.failed.push(failure);
                }
            }
        }
        Ok(report)
    }

    fn deliver(&self, address: &Address, envelope: Envelope) -> Result<(), DeliveryFailure> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.sender.send(address, envelope.clone()) {
                Ok(()) => {
                    debug!(
                        message_type = envelope.message_type(),
                        message_id = envelope.id(),
                        %address,
                        attempt,
                        "delivered"
                    );
                    return Ok(());
                }
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    let wait = self.retry.backoff(attempt);
                    debug!(%address, attempt, error = %error, ?wait, "delivery retry");
                    thread::sleep(wait);
                    attempt += 1;
                }
                Err(error) => {
                    return Err(DeliveryFailure {
                        address: address.clone(),
                        message_id: envelope.id().to_string(),
                        message_type: envelope.message_type().to_string(),
                        attempts: attempt,
                        error,
                    });
                }
            }
        }
    }
}

fn expect_kind(envelope: &Envelope, expected: MessageKind) -> Result<(), RouteError> {
    if envelope.kind() == expected {
        Ok(())
    } else {
        Err(RouteError::WrongKind {
            message_type: envelope.message_type().to_string(),
            expected,
            actual: envelope.kind(),
        })
    }
}
