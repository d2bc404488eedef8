use std::sync::{Arc, Mutex};

use order_bus::bus::{Message, SubscriptionWatch};
use order_bus::orders::{self, OrderAccepted, OrderShipped, RegisterOrder, SHIPPING};
use order_bus::{Address, BusConfig, ConfigError, Endpoint, Host};
use rust_decimal::Decimal;

use crate::support::{init_tracing, wait_until, TIMEOUT};

const ORDERS_WITH_LEDGER: &str = r#"{
    "endpoints": [
        { "name": "Sales", "handles": ["RegisterOrder"] },
        { "name": "Shipping", "handles": ["OrderAccepted"], "subscribes": ["OrderAccepted"] },
        { "name": "Ledger", "handles": ["OrderShipped"], "subscribes": ["OrderShipped"] }
    ],
    "routes": { "RegisterOrder": "Sales" },
    "retry": { "max_attempts": 3, "initial_backoff_ms": 1 },
    "poll_interval_ms": 5
}"#;

fn start(endpoints: Vec<Endpoint>) -> Result<Host, ConfigError> {
    endpoints
        .into_iter()
        .fold(Host::builder(orders::bus_config()), |builder, endpoint| {
            builder.endpoint(endpoint)
        })
        .start()
}

#[test]
fn start_requires_every_configured_endpoint() {
    let result = start(vec![orders::sales_endpoint()]);
    assert!(matches!(
        result.err(),
        Some(ConfigError::MissingEndpoint(ref name)) if name == SHIPPING
    ));
}

#[test]
fn start_requires_a_handler_for_every_handled_type() {
    let result = start(vec![orders::sales_endpoint(), Endpoint::new(SHIPPING)]);
    assert!(matches!(
        result.err(),
        Some(ConfigError::MissingHandler { ref endpoint, ref message_type })
            if endpoint == SHIPPING && message_type == OrderAccepted::MESSAGE_TYPE
    ));
}

#[test]
fn start_rejects_unconfigured_endpoint() {
    let result = start(vec![
        orders::sales_endpoint(),
        orders::shipping_endpoint(),
        Endpoint::new("Billing"),
    ]);
    assert!(matches!(
        result.err(),
        Some(ConfigError::UnconfiguredEndpoint(ref name)) if name == "Billing"
    ));
}

#[test]
fn start_rejects_duplicate_endpoint() {
    let result = start(vec![
        orders::sales_endpoint(),
        orders::sales_endpoint(),
        orders::shipping_endpoint(),
    ]);
    assert!(matches!(result.err(), Some(ConfigError::DuplicateEndpoint(_))));
}

#[test]
fn start_validates_routes() {
    let config = BusConfig::new().route(RegisterOrder::MESSAGE_TYPE, "Sales");
    let result = Host::builder(config).start();
    assert!(matches!(
        result.err(),
        Some(ConfigError::UnknownRouteTarget { .. })
    ));
}

#[test]
fn host_runs_from_json_config() {
    init_tracing();
    let shipped = Arc::new(Mutex::new(Vec::new()));
    let ledger = {
        let shipped = shipped.clone();
        Endpoint::new("Ledger").handle_message(move |_, event: OrderShipped| {
            shipped.lock().unwrap().push(event.order_id);
            Ok(())
        })
    };

    let config = BusConfig::from_json(ORDERS_WITH_LEDGER).unwrap();
    assert_eq!(config.retry.max_attempts, 3);

    let host = Host::builder(config)
        .endpoint(orders::sales_endpoint())
        .endpoint(orders::shipping_endpoint())
        .endpoint(ledger)
        .start()
        .unwrap();
    assert_eq!(
        host.endpoints(),
        vec![
            &Address::from("Sales"),
            &Address::from("Shipping"),
            &Address::from("Ledger")
        ]
    );

    for (order_id, amount) in [(1, 120), (2, 800), (3, 500)] {
        host.bus()
            .send(&RegisterOrder {
                order_id,
                customer_name: "Ada".into(),
                amount: Decimal::from(amount),
            })
            .unwrap();
    }

    assert!(wait_until(TIMEOUT, || shipped.lock().unwrap().len() == 2));
    host.shutdown();
    assert_eq!(*shipped.lock().unwrap(), vec![1, 3]);
}

#[test]
fn shutdown_removes_every_subscription() {
    init_tracing();
    let watch = Arc::new(SubscriptionWatch::new());
    let host = Host::builder(orders::bus_config())
        .observer(watch.clone())
        .endpoint(orders::sales_endpoint())
        .endpoint(orders::shipping_endpoint())
        .start()
        .unwrap();

    let registry = host.registry().clone();
    let shipping = Address::from(SHIPPING);
    assert_eq!(registry.subscriptions_of(&shipping), vec!["OrderAccepted"]);

    let stats = host.shutdown();
    assert_eq!(stats.len(), 2);
    assert!(registry.subscriptions_of(&shipping).is_empty());
    assert!(registry.subscribers_of(OrderAccepted::MESSAGE_TYPE).is_empty());

    let events = watch.events();
    assert_eq!(events.len(), 2);
    assert!(events[0].is_subscribed());
    assert!(!events[1].is_subscribed());
    assert_eq!(events[1].subscriber(), &shipping);
}

#[cfg(feature = "emitter")]
#[test]
fn emitter_observer_sees_subscriptions() {
    use order_bus::bus::EmitterObserver;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let observer = EmitterObserver::new();
    {
        let seen = seen.clone();
        observer.on_subscribed(move |event| {
            seen.lock()
                .unwrap()
                .push(format!("{} -> {}", event.message_type(), event.subscriber()));
        });
    }

    let host = Host::builder(orders::bus_config())
        .observer(Arc::new(observer))
        .endpoint(orders::sales_endpoint())
        .endpoint(orders::shipping_endpoint())
        .start()
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["OrderAccepted -> Shipping"]);
    host.shutdown();
}
