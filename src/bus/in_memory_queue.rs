//! In-memory transport for tests and single-process hosting.
//!
//! One FIFO queue per endpoint address, implementing both `Sender` and
//! `Listener`. With `with_journal()` every accepted send is also recorded so
//! tests can inspect what travelled over the bus.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use super::{Address, Envelope, Listener, Sender, TransportError};

/// In-memory transport.
///
/// Features:
/// - Thread-safe (share across threads via `Clone`)
/// - One FIFO queue per address, opened and closed by the owning endpoint
/// - Optional per-queue capacity, reported as `TransportError::Full`
/// - Opt-in journal of every accepted send (`with_journal`)
///
/// ## Example
///
/// ```
/// use std::time::Duration;
/// use order_bus::bus::{Address, Envelope, InMemoryQueue, Listener, MessageKind, Sender};
///
/// let queue = InMemoryQueue::new();
/// let shipping = Address::new("Shipping");
/// queue.open(&shipping).unwrap();
///
/// queue
///     .send(&shipping, Envelope::new("m-1", "OrderAccepted", MessageKind::Event, vec![]))
///     .unwrap();
///
/// let envelope = queue.listen(&shipping, Duration::from_millis(10)).unwrap();
/// assert_eq!(envelope.unwrap().message_type(), "OrderAccepted");
/// ```
#[derive(Clone)]
pub struct InMemoryQueue {
    queues: Arc<Mutex<HashMap<Address, VecDeque<Envelope>>>>,
    /// Signalled on every send and close.
    available: Arc<Condvar>,
    capacity: Option<usize>,
    journal: Option<Arc<RwLock<Vec<(Address, Envelope)>>>>,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    /// Create a transport with unbounded queues.
    pub fn new() -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            available: Arc::new(Condvar::new()),
            capacity: None,
            journal: None,
        }
    }

    /// Record every accepted send. The journal is never trimmed; use it in
    /// tests, not in long-running hosts.
    pub fn with_journal(mut self) -> Self {
        self.journal = Some(Arc::new(RwLock::new(Vec::new())));
        self
    }

    /// Whether sends are being recorded.
    pub fn is_journaled(&self) -> bool {
        self.journal.is_some()
    }

    /// Create a transport whose queues hold at most `capacity` envelopes.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    /// Whether the queue for `address` is open.
    pub fn is_open(&self, address: &Address) -> bool {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(address)
    }

    /// Number of envelopes waiting on `address`.
    pub fn pending(&self, address: &Address) -> usize {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .map_or(0, VecDeque::len)
    }

    /// Every accepted send, in order. Empty unless journaled.
    pub fn sent(&self) -> Vec<(Address, Envelope)> {
        self.journal
            .as_ref()
            .map(|journal| {
                journal
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            })
            .unwrap_or_default()
    }

    /// Envelopes sent to one address, in order.
    pub fn sent_to(&self, address: &Address) -> Vec<Envelope> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| to == address)
            .map(|(_, envelope)| envelope)
            .collect()
    }

    /// Message types of every accepted send, in order.
    pub fn message_types(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|(_, envelope)| envelope.message_type().to_string())
            .collect()
    }

    /// All sent envelopes of one message type.
    pub fn find_all_by_type(&self, message_type: &str) -> Vec<Envelope> {
        self.sent()
            .into_iter()
            .filter(|(_, envelope)| envelope.message_type() == message_type)
            .map(|(_, envelope)| envelope)
            .collect()
    }

    /// Clear the journal (useful between test phases).
    pub fn clear_journal(&self) {
        if let Some(journal) = &self.journal {
            journal
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
    }
}

impl Sender for InMemoryQueue {
    fn send(&self, address: &Address, envelope: Envelope) -> Result<(), TransportError> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = queues
            .get_mut(address)
            .ok_or_else(|| TransportError::Unavailable(address.clone()))?;

        if let Some(capacity) = self.capacity {
            if queue.len() >= capacity {
                return Err(TransportError::Full {
                    address: address.clone(),
                    capacity,
                });
            }
        }

        if let Some(journal) = &self.journal {
            journal
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push((address.clone(), envelope.clone()));
        }
        queue.push_back(envelope);
        drop(queues);

        self.available.notify_all();
        Ok(())
    }
}

impl Listener for InMemoryQueue {
    fn open(&self, address: &Address) -> Result<(), TransportError> {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(address.clone())
            .or_default();
        Ok(())
    }

    fn listen(
        &self,
        address: &Address,
        timeout: Duration,
    ) -> Result<Option<Envelope>, TransportError> {
        let deadline = Instant::now() + timeout;
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            let queue = queues
                .get_mut(address)
                .ok_or_else(|| TransportError::Unavailable(address.clone()))?;

            if let Some(envelope) = queue.pop_front() {
                return Ok(Some(envelope));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            queues = self
                .available
                .wait_timeout(queues, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn close(&self, address: &Address) -> Vec<Envelope> {
        let pending = self
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(address)
            .map(Vec::from)
            .unwrap_or_default();

        self.available.notify_all();
        pending
    }
}
