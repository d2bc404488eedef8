//! Scenario harness: runs Sales and Shipping on a host next to a log
//! endpoint that records every order event.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use order_bus::bus::{Message, SubscriptionWatch};
use order_bus::endpoint::EndpointStats;
use order_bus::orders::{self, OrderAccepted, OrderId, OrderRefused, OrderShipped, OrderStatus};
use order_bus::{Address, Bus, BusConfig, Endpoint, EndpointConfig, Envelope, Host};

pub const ORDER_LOG: &str = "OrderLog";
pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Records order events as they are published.
#[derive(Clone, Default)]
pub struct OrderLog {
    seen: Arc<Mutex<Vec<Envelope>>>,
}

impl OrderLog {
    pub fn endpoint(&self) -> Endpoint {
        let mut endpoint = Endpoint::new(ORDER_LOG);
        for message_type in Self::watched() {
            let seen = self.seen.clone();
            endpoint = endpoint.handle(message_type, move |ctx| {
                seen.lock().unwrap().push(ctx.envelope().clone());
                Ok(())
            });
        }
        endpoint
    }

    pub fn config() -> EndpointConfig {
        Self::watched()
            .into_iter()
            .fold(EndpointConfig::new(ORDER_LOG), EndpointConfig::subscribes)
    }

    fn watched() -> [&'static str; 3] {
        [
            OrderAccepted::MESSAGE_TYPE,
            OrderRefused::MESSAGE_TYPE,
            OrderShipped::MESSAGE_TYPE,
        ]
    }

    /// How many `M` events were seen for `order_id`.
    pub fn count<M: Message>(&self, order_id: OrderId) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.is::<M>())
            .filter(|e| OrderStatus::from_envelope(e).map(|(id, _)| id) == Some(order_id))
            .count()
    }

    pub fn total<M: Message>(&self) -> usize {
        self.seen.lock().unwrap().iter().filter(|e| e.is::<M>()).count()
    }

    /// Orders Sales decided on, in arrival order.
    pub fn decided(&self) -> Vec<OrderId> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.is::<OrderAccepted>() || e.is::<OrderRefused>())
            .filter_map(|e| OrderStatus::from_envelope(e).map(|(id, _)| id))
            .collect()
    }

    /// Message types seen for one order, in arrival order.
    pub fn history(&self, order_id: OrderId) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|e| OrderStatus::from_envelope(e).map(|(id, _)| id) == Some(order_id))
            .map(|e| e.message_type().to_string())
            .collect()
    }

    /// Replay the seen events through the order state machine.
    pub fn statuses(&self) -> Result<HashMap<OrderId, OrderStatus>, String> {
        let mut statuses = HashMap::new();
        for envelope in self.seen.lock().unwrap().iter() {
            let (order_id, next) =
                OrderStatus::from_envelope(envelope).ok_or("unknown message")?;
            let current: OrderStatus = statuses.get(&order_id).copied().unwrap_or_default();
            let updated = current
                .transition(next)
                .map_err(|e| format!("order {order_id}: {e}"))?;
            statuses.insert(order_id, updated);
        }
        Ok(statuses)
    }
}

/// A running Sales + Shipping + OrderLog host.
pub struct Scenario {
    pub host: Host,
    pub log: OrderLog,
    pub watch: Arc<SubscriptionWatch>,
}

impl Scenario {
    pub fn start() -> Self {
        Self::start_with(orders::bus_config(), orders::shipping_endpoint())
    }

    /// Start with a custom config and Shipping endpoint.
    pub fn start_with(config: BusConfig, shipping: Endpoint) -> Self {
        init_tracing();
        let log = OrderLog::default();
        let watch = Arc::new(SubscriptionWatch::new());

        let host = Host::builder(
            config
                .endpoint(OrderLog::config())
                .with_poll_interval(Duration::from_millis(5)),
        )
        .observer(watch.clone())
        .endpoint(orders::sales_endpoint())
        .endpoint(shipping)
        .endpoint(log.endpoint())
        .start()
        .expect("host starts");

        Self { host, log, watch }
    }

    pub fn bus(&self) -> Bus {
        self.host.bus()
    }

    pub fn shutdown(self) -> (OrderLog, HashMap<Address, EndpointStats>) {
        let stats = self.host.shutdown().into_iter().collect();
        (self.log, stats)
    }
}

/// Poll until `condition` holds or `timeout` expires.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
