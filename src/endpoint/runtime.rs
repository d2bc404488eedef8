//! Endpoint worker threads.
//!
//! Each endpoint runs on its own thread: it subscribes to its configured
//! event types, then takes messages off its inbound queue one at a time,
//! runs the handler, and dispatches whatever the handler produced.
//!
//! On stop the worker unsubscribes, closes its queue and handles every
//! message that was still pending (drain-to-completion) before exiting.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::bus::{Address, Envelope, Listener, MessageKind, Router, TransportError};

use super::endpoint::Endpoint;
use super::error::HandlerError;

/// Statistics from an endpoint worker.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EndpointStats {
    /// Messages whose handler succeeded.
    pub handled: usize,
    /// Messages whose handler failed (HandlerFailed).
    pub failed: usize,
    /// Events published by handlers.
    pub published: usize,
    /// Commands sent by handlers.
    pub sent: usize,
    /// Recipients that could not be reached after retries.
    pub delivery_failures: usize,
    /// Messages handled while draining at shutdown.
    pub drained: usize,
    /// Poll cycles completed.
    pub polls: usize,
}

/// Handle to a running endpoint worker. Drop or call `stop()` to shut down.
pub struct EndpointHandle {
    address: Address,
    stop_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<EndpointStats>>,
}

impl EndpointHandle {
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Stop the worker and wait for it to drain. Returns stats.
    pub fn stop(mut self) -> EndpointStats {
        let _ = self.stop_tx.send(());
        self.join()
    }

    /// Signal stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }

    /// Wait for a stopped worker to finish.
    pub fn join(mut self) -> EndpointStats {
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                error!(endpoint = %self.address, "endpoint worker panicked");
                EndpointStats::default()
            }),
            None => EndpointStats::default(),
        }
    }
}

impl Drop for EndpointHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}

/// Start an endpoint worker.
///
/// Opens the endpoint's queue, spawns the worker and waits until it has
/// subscribed to every type in `subscriptions`, so events published after
/// this returns reach it.
pub fn spawn(
    endpoint: Endpoint,
    subscriptions: Vec<String>,
    router: Arc<Router>,
    listener: Arc<dyn Listener>,
    poll_interval: Duration,
) -> Result<EndpointHandle, TransportError> {
    let address = endpoint.address().clone();
    listener.open(&address)?;

    let (stop_tx, stop_rx) = mpsc::channel();
    let (ready_tx, ready_rx) = mpsc::channel();

    let queue = listener.clone();
    let spawned = thread::Builder::new()
        .name(format!("endpoint-{address}"))
        .spawn(move || {
            let worker = Worker {
                endpoint,
                router,
                listener,
            };
            worker.run(&subscriptions, &stop_rx, ready_tx, poll_interval)
        });
    let handle = match spawned {
        Ok(handle) => handle,
        Err(e) => return Err(abandon(&*queue, &address, &e)),
    };

    if ready_rx.recv().is_err() {
        warn!(endpoint = %address, "endpoint worker exited before becoming ready");
    }

    Ok(EndpointHandle {
        address,
        stop_tx,
        handle: Some(handle),
    })
}

/// Close a queue whose worker never started.
fn abandon(listener: &dyn Listener, address: &Address, cause: &std::io::Error) -> TransportError {
    let dropped = listener.close(address);
    error!(
        endpoint = %address,
        error = %cause,
        dropped = dropped.len(),
        "failed to spawn worker"
    );
    TransportError::Rejected(format!("failed to spawn worker: {cause}"))
}

struct Worker {
    endpoint: Endpoint,
    router: Arc<Router>,
    listener: Arc<dyn Listener>,
}

impl Worker {
    fn address(&self) -> &Address {
        self.endpoint.address()
    }

    fn run(
        &self,
        subscriptions: &[String],
        stop_rx: &mpsc::Receiver<()>,
        ready_tx: mpsc::Sender<()>,
        poll_interval: Duration,
    ) -> EndpointStats {
        let mut stats = EndpointStats::default();

        for message_type in subscriptions {
            self.router.registry().subscribe(message_type, self.address());
        }
        info!(
            endpoint = %self.address(),
            handlers = ?self.endpoint.message_types(),
            subscriptions = ?subscriptions,
            "endpoint started"
        );
        let _ = ready_tx.send(());

        loop {
            match stop_rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            stats.polls += 1;

            match self.listener.listen(self.address(), poll_interval) {
                Ok(Some(envelope)) => self.process(&envelope, &mut stats),
                Ok(None) => {}
                Err(TransportError::Unavailable(_)) => {
                    warn!(
                        endpoint = %self.address(),
                        "queue closed underneath the worker, stopping"
                    );
                    break;
                }
                Err(e) => {
                    warn!(endpoint = %self.address(), error = %e, "listen failed");
                    thread::sleep(poll_interval);
                }
            }
        }

        self.router.registry().unsubscribe_all(self.address());
        let pending = self.listener.close(self.address());
        debug!(endpoint = %self.address(), pending = pending.len(), "draining");
        for envelope in pending {
            self.process(&envelope, &mut stats);
            stats.drained += 1;
        }

        info!(endpoint = %self.address(), ?stats, "endpoint stopped");
        stats
    }

    fn process(&self, envelope: &Envelope, stats: &mut EndpointStats) {
        debug!(
            endpoint = %self.address(),
            message_type = envelope.message_type(),
            message_id = envelope.id(),
            "handling"
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.endpoint.dispatch(envelope, &self.router)
        }))
        .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(&*payload))));

        match outcome {
            Ok(outgoing) => {
                stats.handled += 1;
                for message in outgoing {
                    self.forward(message, stats);
                }
            }
            Err(err) => {
                stats.failed += 1;
                error!(
                    endpoint = %self.address(),
                    message_type = envelope.message_type(),
                    message_id = envelope.id(),
                    error = %err,
                    "handler failed"
                );
                let reported = panic::catch_unwind(AssertUnwindSafe(|| {
                    self.endpoint.report_failure(envelope, &err)
                }));
                if reported.is_err() {
                    warn!(endpoint = %self.address(), "failure hook panicked");
                }
            }
        }
    }

    fn forward(&self, message: Envelope, stats: &mut EndpointStats) {
        let message_type = message.message_type().to_string();

        match message.kind() {
            MessageKind::Command => match self.router.send_command(message) {
                Ok(_) => stats.sent += 1,
                Err(e) => {
                    stats.delivery_failures += 1;
                    warn!(endpoint = %self.address(), %message_type, error = %e, "send failed");
                }
            },
            MessageKind::Event => match self.router.publish_event(message) {
                Ok(report) => {
                    stats.published += 1;
                    stats.delivery_failures += report.failed.len();
                }
                Err(e) => {
                    stats.delivery_failures += 1;
                    warn!(endpoint = %self.address(), %message_type, error = %e, "publish failed");
                }
            },
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
