//! Error types for configuration and host startup.

use thiserror::Error;

use crate::bus::TransportError;

/// Error raised while loading or validating configuration, or starting a host.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("endpoint configured twice: {0}")]
    DuplicateEndpoint(String),
    #[error("route for {message_type} targets unknown endpoint {endpoint}")]
    UnknownRouteTarget {
        message_type: String,
        endpoint: String,
    },
    #[error("route for {message_type} targets {endpoint}, which does not handle it")]
    RouteNotHandled {
        message_type: String,
        endpoint: String,
    },
    #[error("{endpoint} subscribes to {message_type} but does not handle it")]
    SubscriptionNotHandled {
        endpoint: String,
        message_type: String,
    },
    #[error("no handlers registered for configured endpoint {0}")]
    MissingEndpoint(String),
    #[error("endpoint {0} has handlers but no configuration")]
    UnconfiguredEndpoint(String),
    #[error("{endpoint} is configured to handle {message_type} but has no handler for it")]
    MissingHandler {
        endpoint: String,
        message_type: String,
    },
    #[error("invalid retry policy: {0}")]
    InvalidRetry(String),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
