use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use order_bus::bus::{InMemoryQueue, Listener, Sender, TransportError};
use order_bus::{Address, Endpoint, Envelope, Message, MessageKind};
use serde::{Deserialize, Serialize};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Ask the ticker to publish `count` ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Burst {
    pub count: u32,
}

impl Message for Burst {
    const MESSAGE_TYPE: &'static str = "Burst";
    const KIND: MessageKind = MessageKind::Command;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    pub seq: u32,
}

impl Message for Tick {
    const MESSAGE_TYPE: &'static str = "Tick";
    const KIND: MessageKind = MessageKind::Event;
}

/// A command nobody owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cancel {
    pub order_id: u64,
}

impl Message for Cancel {
    const MESSAGE_TYPE: &'static str = "Cancel";
    const KIND: MessageKind = MessageKind::Command;
}

pub fn ticker(name: &str) -> Endpoint {
    Endpoint::new(name).handle_message(|ctx, burst: Burst| {
        for seq in 0..burst.count {
            ctx.publish(&Tick { seq })?;
        }
        Ok(())
    })
}

/// Collects tick sequence numbers.
#[derive(Clone, Default)]
pub struct Recorder {
    ticks: Arc<Mutex<Vec<u32>>>,
}

impl Recorder {
    pub fn endpoint(&self, name: &str) -> Endpoint {
        let ticks = self.ticks.clone();
        Endpoint::new(name).handle_message(move |_, tick: Tick| {
            ticks.lock().unwrap().push(tick.seq);
            Ok(())
        })
    }

    pub fn ticks(&self) -> Vec<u32> {
        self.ticks.lock().unwrap().clone()
    }
}

/// In-memory transport that refuses every delivery to one address.
pub struct Unreachable {
    inner: InMemoryQueue,
    down: Address,
}

impl Unreachable {
    pub fn new(down: &str) -> Self {
        Self {
            inner: InMemoryQueue::new(),
            down: Address::from(down),
        }
    }
}

impl Sender for Unreachable {
    fn send(&self, address: &Address, envelope: Envelope) -> Result<(), TransportError> {
        if *address == self.down {
            return Err(TransportError::Rejected(format!("{address} is down")));
        }
        self.inner.send(address, envelope)
    }
}

impl Listener for Unreachable {
    fn open(&self, address: &Address) -> Result<(), TransportError> {
        self.inner.open(address)
    }

    fn listen(
        &self,
        address: &Address,
        timeout: Duration,
    ) -> Result<Option<Envelope>, TransportError> {
        self.inner.listen(address, timeout)
    }

    fn close(&self, address: &Address) -> Vec<Envelope> {
        self.inner.close(address)
    }
}

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
