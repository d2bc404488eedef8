//! Bus configuration: endpoints, command routes, retry and polling.
//!
//! ```json
//! {
//!   "endpoints": [
//!     { "name": "Sales", "handles": ["RegisterOrder"] },
//!     { "name": "Shipping", "handles": ["OrderAccepted"], "subscribes": ["OrderAccepted"] }
//!   ],
//!   "routes": { "RegisterOrder": "Sales" },
//!   "retry": { "max_attempts": 5 },
//!   "poll_interval_ms": 50
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bus::{CommandRoutes, RetryPolicy};

use super::error::ConfigError;

const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// One endpoint's declaration: its name, the message types it handles and
/// the event types it subscribes to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    #[serde(default)]
    pub handles: Vec<String>,
    #[serde(default)]
    pub subscribes: Vec<String>,
}

impl EndpointConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handles: Vec::new(),
            subscribes: Vec::new(),
        }
    }

    pub fn handles(mut self, message_type: impl Into<String>) -> Self {
        self.handles.push(message_type.into());
        self
    }

    /// Subscribe to an event type. Also declares it as handled.
    pub fn subscribes(mut self, message_type: impl Into<String>) -> Self {
        let message_type = message_type.into();
        if !self.handles.contains(&message_type) {
            self.handles.push(message_type.clone());
        }
        self.subscribes.push(message_type);
        self
    }
}

/// Everything the host needs at startup. Immutable once the host runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub endpoints: Vec<EndpointConfig>,
    /// Command type → owning endpoint name.
    pub routes: BTreeMap<String, String>,
    pub retry: RetryPolicy,
    /// How long a worker blocks on an empty queue before checking for stop.
    pub poll_interval_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            routes: BTreeMap::new(),
            retry: RetryPolicy::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl BusConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration from a reader.
    pub fn from_reader(reader: impl Read) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn endpoint(mut self, endpoint: EndpointConfig) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Route a command type to the endpoint that owns it.
    pub fn route(mut self, message_type: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.routes.insert(message_type.into(), endpoint.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn find_endpoint(&self, name: &str) -> Option<&EndpointConfig> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// The static command map.
    pub fn command_routes(&self) -> CommandRoutes {
        self.routes
            .iter()
            .map(|(message_type, endpoint)| (message_type.clone(), endpoint.clone()))
            .collect()
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for endpoint in &self.endpoints {
            if !names.insert(endpoint.name.as_str()) {
                return Err(ConfigError::DuplicateEndpoint(endpoint.name.clone()));
            }
            if let Some(missing) = endpoint
                .subscribes
                .iter()
                .find(|t| !endpoint.handles.contains(t))
            {
                return Err(ConfigError::SubscriptionNotHandled {
                    endpoint: endpoint.name.clone(),
                    message_type: missing.clone(),
                });
            }
        }

        for (message_type, target) in &self.routes {
            let endpoint =
                self.find_endpoint(target)
                    .ok_or_else(|| ConfigError::UnknownRouteTarget {
                        message_type: message_type.clone(),
                        endpoint: target.clone(),
                    })?;
            if !endpoint.handles.contains(message_type) {
                return Err(ConfigError::RouteNotHandled {
                    message_type: message_type.clone(),
                    endpoint: target.clone(),
                });
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.retry.multiplier == 0 {
            return Err(ConfigError::InvalidRetry(
                "multiplier must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
