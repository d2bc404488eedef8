use std::time::Duration;

use order_bus::bus::RetryPolicy;
use order_bus::{Address, BusConfig, EndpointConfig, Host, RouteError};

use crate::support::{
    init_tracing, ticker, wait_until, Burst, Cancel, Recorder, Tick, Unreachable, TIMEOUT,
};

fn config() -> BusConfig {
    BusConfig::new()
        .endpoint(EndpointConfig::new("Ticker").handles("Burst"))
        .endpoint(EndpointConfig::new("Recorder").subscribes("Tick"))
        .route("Burst", "Ticker")
        .with_poll_interval(Duration::from_millis(5))
}

#[test]
fn ticks_arrive_in_publish_order() {
    init_tracing();
    let recorder = Recorder::default();
    let host = Host::builder(config())
        .endpoint(ticker("Ticker"))
        .endpoint(recorder.endpoint("Recorder"))
        .start()
        .unwrap();

    host.bus().send(&Burst { count: 200 }).unwrap();
    assert!(wait_until(TIMEOUT, || recorder.ticks().len() == 200));

    host.shutdown();
    assert_eq!(recorder.ticks(), (0..200).collect::<Vec<_>>());
}

#[test]
fn unreachable_subscriber_does_not_block_the_others() {
    init_tracing();
    let recorder = Recorder::default();
    let broken = Recorder::default();
    let host = Host::builder(
        config()
            .endpoint(EndpointConfig::new("Broken").subscribes("Tick"))
            .with_retry(RetryPolicy::no_retry()),
    )
    .transport(Unreachable::new("Broken"))
    .endpoint(ticker("Ticker"))
    .endpoint(recorder.endpoint("Recorder"))
    .endpoint(broken.endpoint("Broken"))
    .start()
    .unwrap();

    let report = host.bus().publish(&Tick { seq: 7 }).unwrap();
    assert_eq!(report.delivered, vec![Address::from("Recorder")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].address, Address::from("Broken"));
    assert!(!report.is_complete());

    host.bus().send(&Burst { count: 3 }).unwrap();
    assert!(wait_until(TIMEOUT, || recorder.ticks().len() == 4));

    let stats = host.shutdown();
    let ticker = &stats[&Address::from("Ticker")];
    assert_eq!(ticker.published, 3);
    assert_eq!(ticker.delivery_failures, 3);
    assert!(broken.ticks().is_empty());
}

#[test]
fn command_to_unreachable_owner_fails_fast() {
    init_tracing();
    let host = Host::builder(config())
        .transport(Unreachable::new("Ticker"))
        .endpoint(ticker("Ticker"))
        .endpoint(Recorder::default().endpoint("Recorder"))
        .start()
        .unwrap();

    let err = host.bus().send(&Burst { count: 1 }).unwrap_err();
    match err {
        RouteError::DeliveryFailed(failure) => {
            assert_eq!(failure.address, Address::from("Ticker"));
            assert_eq!(failure.attempts, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    host.shutdown();
}

#[test]
fn unrouted_command_is_rejected() {
    let host = Host::builder(config())
        .endpoint(ticker("Ticker"))
        .endpoint(Recorder::default().endpoint("Recorder"))
        .start()
        .unwrap();

    assert!(matches!(
        host.bus().send(&Cancel { order_id: 1 }),
        Err(RouteError::UnroutableCommand(ref t)) if t == "Cancel"
    ));
    assert!(matches!(
        host.bus().send(&Tick { seq: 0 }),
        Err(RouteError::WrongKind { .. })
    ));

    host.shutdown();
}
