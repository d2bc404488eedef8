//! Host: the explicitly constructed runtime context for a set of endpoints.
//!
//! A `Host` owns the subscription registry, the router and one worker per
//! endpoint. Nothing is global: every endpoint receives the router it uses
//! when its worker starts.
//!
//! ## Example
//!
//! ```ignore
//! let host = Host::builder(orders::bus_config())
//!     .endpoint(orders::sales_endpoint())
//!     .endpoint(orders::shipping_endpoint())
//!     .start()?;
//!
//! host.bus().send(&RegisterOrder { order_id: 1, customer_name: "John".into(), amount: 500.into() })?;
//!
//! let stats = host.shutdown();
//! ```

mod config;
mod error;

pub use config::{BusConfig, EndpointConfig};
pub use error::ConfigError;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::info;

use crate::bus::{
    Address, Bus, InMemoryQueue, Listener, Router, Sender, SubscriptionObserver,
    SubscriptionRegistry,
};
use crate::endpoint::{self, Endpoint, EndpointHandle, EndpointStats};

/// Builder for a `Host`.
pub struct HostBuilder {
    config: BusConfig,
    endpoints: Vec<Endpoint>,
    transport: Option<(Arc<dyn Sender>, Arc<dyn Listener>)>,
    registry: Option<Arc<SubscriptionRegistry>>,
    observers: Vec<Arc<dyn SubscriptionObserver>>,
}

impl HostBuilder {
    /// Add an endpoint's handler table.
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Use a transport instead of a fresh `InMemoryQueue`.
    pub fn transport<T>(mut self, transport: T) -> Self
    where
        T: Sender + Listener + 'static,
    {
        let transport = Arc::new(transport);
        self.transport = Some((transport.clone(), transport));
        self
    }

    /// Share an existing registry.
    pub fn registry(mut self, registry: Arc<SubscriptionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Observe subscriptions from the moment endpoints start.
    pub fn observer(mut self, observer: Arc<dyn SubscriptionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Validate the configuration against the registered endpoints and start
    /// one worker per endpoint.
    ///
    /// Returns once every endpoint has subscribed to its configured events.
    pub fn start(self) -> Result<Host, ConfigError> {
        let HostBuilder {
            config,
            endpoints,
            transport,
            registry,
            observers,
        } = self;

        config.validate()?;
        let mut endpoints = match_endpoints(&config, endpoints)?;

        let registry = registry.unwrap_or_default();
        for observer in observers {
            registry.observe(observer);
        }

        let (sender, listener) = transport.unwrap_or_else(|| {
            let queue = Arc::new(InMemoryQueue::new());
            (queue.clone() as Arc<dyn Sender>, queue as Arc<dyn Listener>)
        });

        let router = Arc::new(Router::new(
            registry.clone(),
            config.command_routes(),
            sender,
            config.retry.clone(),
        ));

        let mut workers = Vec::with_capacity(config.endpoints.len());
        for declared in &config.endpoints {
            let Some(endpoint) = endpoints.remove(&declared.name) else {
                continue;
            };
            let started = endpoint::spawn(
                endpoint,
                declared.subscribes.clone(),
                router.clone(),
                listener.clone(),
                config.poll_interval(),
            );
            match started {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    for worker in workers {
                        worker.stop();
                    }
                    return Err(e.into());
                }
            }
        }

        info!(
            endpoints = config.endpoints.len(),
            routes = config.routes.len(),
            "host started"
        );

        Ok(Host {
            bus: Bus::new(router.clone()),
            router,
            registry,
            workers,
        })
    }
}

/// Pair every configured endpoint with its handler table.
fn match_endpoints(
    config: &BusConfig,
    endpoints: Vec<Endpoint>,
) -> Result<HashMap<String, Endpoint>, ConfigError> {
    let mut by_name = HashMap::new();
    for endpoint in endpoints {
        let name = endpoint.address().to_string();
        if by_name.contains_key(&name) {
            return Err(ConfigError::DuplicateEndpoint(name));
        }
        by_name.insert(name, endpoint);
    }

    for declared in &config.endpoints {
        let endpoint = by_name
            .get(&declared.name)
            .ok_or_else(|| ConfigError::MissingEndpoint(declared.name.clone()))?;
        if let Some(missing) = declared.handles.iter().find(|t| !endpoint.handles(t)) {
            return Err(ConfigError::MissingHandler {
                endpoint: declared.name.clone(),
                message_type: missing.clone(),
            });
        }
    }

    if let Some(extra) = by_name
        .keys()
        .find(|name| config.find_endpoint(name).is_none())
    {
        return Err(ConfigError::UnconfiguredEndpoint(extra.clone()));
    }

    Ok(by_name)
}

/// A running set of endpoints sharing one router.
pub struct Host {
    bus: Bus,
    router: Arc<Router>,
    registry: Arc<SubscriptionRegistry>,
    workers: Vec<EndpointHandle>,
}

impl Host {
    pub fn builder(config: BusConfig) -> HostBuilder {
        HostBuilder {
            config,
            endpoints: Vec::new(),
            transport: None,
            registry: None,
            observers: Vec::new(),
        }
    }

    /// Client handle for sending commands and publishing events.
    pub fn bus(&self) -> Bus {
        self.bus.clone()
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Addresses of the running endpoints, in start order.
    pub fn endpoints(&self) -> Vec<&Address> {
        self.workers.iter().map(EndpointHandle::address).collect()
    }

    /// Stop every endpoint and wait for them to drain.
    ///
    /// All workers are signalled first so they unsubscribe and close their
    /// queues together; each then handles what was already queued.
    pub fn shutdown(self) -> BTreeMap<Address, EndpointStats> {
        for worker in &self.workers {
            worker.signal_stop();
        }

        let stats: BTreeMap<Address, EndpointStats> = self
            .workers
            .into_iter()
            .map(|worker| (worker.address().clone(), worker.join()))
            .collect();

        info!(endpoints = stats.len(), "host stopped");
        stats
    }
}
