//! Unbounded FIFO queue handle
//!
//! `Queue<T>` owns the request channels of one arbiter task plus the means to
//! stop it. All state lives in the arbiter; the handle only sends requests.

use crate::core::sync::handle_mutex_poison;
use crate::queue::config::QueueConfig;
use crate::queue::consumer::Popper;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::internal::{Arbiter, ConsumerEvent, Request};
use crate::queue::types::QueueStats;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Channel-backed FIFO queue with an unbounded backlog
///
/// Pushing never waits for a consumer or for capacity. Items are received
/// through the [`Popper`] returned by [`Queue::pop`], in push order, each by
/// exactly one receive.
///
/// # Lifecycle
///
/// The queue starts running as soon as it is created and must be created
/// inside a Tokio runtime. Call [`Queue::close`] when finished: it stops the
/// arbiter and waits for it to exit. Dropping the queue also stops the
/// arbiter, but without waiting.
///
/// After close, `push`, `flush` and `discard` are silent no-ops, `recv`
/// yields `None` and `try_recv` / `stats` return [`QueueError::Closed`].
///
/// # Example
///
/// ```rust,no_run
/// # use chanqueue::queue::api::Queue;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let queue = Queue::new();
/// for i in 0..3 {
///     queue.push(i);
/// }
///
/// let popper = queue.pop();
/// assert_eq!(popper.recv().await, Some(0));
///
/// queue.flush().await;
/// assert!(popper.try_recv().await.unwrap_err().is_empty());
///
/// queue.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Queue<T> {
    name: String,
    requests: mpsc::UnboundedSender<Request<T>>,
    events: mpsc::UnboundedSender<ConsumerEvent<T>>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    arbiter: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Queue<T> {
    /// Create a running queue with the default configuration
    pub fn new() -> Self {
        Self::spawn(QueueConfig::default())
    }

    /// Create a running queue after validating `config`
    pub fn with_config(config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        Ok(Self::spawn(config))
    }

    pub(crate) fn spawn(config: QueueConfig) -> Self {
        let (requests, request_rx) = mpsc::unbounded_channel();
        let (events, event_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = oneshot::channel();

        let name = config.name.clone();
        let arbiter = Arbiter::new(config, request_rx, event_rx);
        let handle = tokio::spawn(arbiter.run(shutdown_rx));

        Self {
            name,
            requests,
            events,
            shutdown: Mutex::new(Some(shutdown)),
            arbiter: tokio::sync::Mutex::new(Some(handle)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an item to the back of the queue
    pub fn push(&self, item: T) {
        if self.requests.send(Request::Push(item)).is_err() {
            log::trace!("Queue '{}' is closed, dropping pushed item", self.name);
        }
    }

    /// Receiving endpoint for items at the front of the queue
    pub fn pop(&self) -> Popper<T> {
        Popper::new(self.requests.clone(), self.events.clone())
    }

    /// Drop every item currently waiting in the backlog
    ///
    /// Returns once the arbiter has emptied the backlog; nothing pushed before
    /// this call is delivered afterwards.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.requests.send(Request::Flush(ack)).is_err() {
            log::trace!("Queue '{}' is closed, ignoring flush", self.name);
            return;
        }
        let _ = done.await;
    }

    /// Enable or disable discard mode
    ///
    /// While enabled, pushed items are dropped before reaching the backlog.
    /// Items already in the backlog are still delivered.
    pub async fn discard(&self, enabled: bool) {
        let (ack, done) = oneshot::channel();
        if self.requests.send(Request::Discard(enabled, ack)).is_err() {
            log::trace!("Queue '{}' is closed, ignoring discard", self.name);
            return;
        }
        let _ = done.await;
    }

    /// Snapshot of the backlog and lifetime counters
    pub async fn stats(&self) -> QueueResult<QueueStats> {
        let (reply, snapshot) = oneshot::channel();
        self.requests
            .send(Request::Stats(reply))
            .map_err(|_| QueueError::Closed)?;
        snapshot.await.map_err(|_| QueueError::Closed)
    }

    /// True once close has been requested or the arbiter has stopped
    pub fn is_closed(&self) -> bool {
        let signalled = self
            .shutdown
            .lock()
            .map(|shutdown| shutdown.is_none())
            .unwrap_or(true);
        signalled || self.requests.is_closed()
    }

    /// Stop the arbiter and wait until it has exited
    ///
    /// Items still in the backlog are abandoned. Closing an already closed
    /// queue returns `Ok(())`; concurrent callers all return after teardown.
    pub async fn close(&self) -> QueueResult<()> {
        self.signal_close()?;

        let mut arbiter = self.arbiter.lock().await;
        let Some(handle) = arbiter.take() else {
            return Ok(());
        };

        handle.await.map_err(|e| QueueError::ArbiterFailed {
            message: e.to_string(),
        })?;

        log::debug!("Queue '{}' closed", self.name);
        Ok(())
    }
}

impl<T> Queue<T> {
    /// Ask the arbiter to stop without waiting for it
    ///
    /// Returns `true` if this call delivered the signal.
    pub(crate) fn signal_close(&self) -> QueueResult<bool> {
        let mut shutdown = handle_mutex_poison(self.shutdown.lock(), |message| {
            QueueError::OperationFailed { message }
        })?;

        match shutdown.take() {
            Some(signal) => {
                // The arbiter may already be gone if every popper was dropped
                let _ = signal.send(());
                log::debug!("Queue '{}' close requested", self.name);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[cfg(test)]
    pub(crate) fn poison_shutdown_lock(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.shutdown.lock();
            panic!("poisoning the shutdown lock");
        }));
    }
}

impl<T: Send + 'static> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}
