//! Broadcaster implementation
//!
//! The broadcaster owns one queue per subscriber. Publishing pushes a clone of
//! the item into every registered queue, so each subscriber drains at its own
//! pace without holding up the others.

use crate::broadcast::subscriber::Subscriber;
use crate::core::error_handling::log_error_with_context;
use crate::core::sync::handle_mutex_poison;
use crate::queue::api::{BroadcasterConfig, Queue, QueueError, QueueResult};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

struct RegistryState<T> {
    /// Next subscriber id; ids are never reused
    next_id: u64,
    closed: bool,
    /// Shared with each subscriber so either side can wait for teardown
    queues: HashMap<u64, Arc<Queue<T>>>,
}

/// Subscriber queues shared between a broadcaster and its subscriber handles
pub(crate) struct Registry<T> {
    config: BroadcasterConfig,
    state: Mutex<RegistryState<T>>,
}

impl<T: Send + 'static> Registry<T> {
    fn lock(&self) -> QueueResult<MutexGuard<'_, RegistryState<T>>> {
        handle_mutex_poison(self.state.lock(), |message| QueueError::OperationFailed {
            message,
        })
    }

    /// Unregister a subscriber and signal its queue to stop
    ///
    /// Returns `false` if the id is no longer registered.
    pub(crate) fn remove(&self, id: u64) -> QueueResult<bool> {
        let mut state = self.lock()?;
        let Some(queue) = state.queues.remove(&id) else {
            return Ok(false);
        };
        queue.signal_close()?;
        log::debug!(
            "Subscriber {} removed, {} remaining",
            id,
            state.queues.len()
        );
        Ok(true)
    }
}

impl<T> Drop for Registry<T> {
    fn drop(&mut self) {
        // Subscribers still hold their queues; stop them with the broadcaster
        let state = match self.state.get_mut() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        for queue in state.queues.values() {
            let _ = queue.signal_close();
        }
    }
}

/// Fan-out publisher over independent subscriber queues
///
/// Cloning a `Broadcaster` yields another handle to the same registry.
///
/// # Example
///
/// ```rust,no_run
/// # use chanqueue::broadcast::api::Broadcaster;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let broadcaster = Broadcaster::new();
/// let sub1 = broadcaster.subscribe()?;
/// let sub2 = broadcaster.subscribe()?;
///
/// broadcaster.publish("item")?;
/// assert_eq!(sub1.receive().recv().await, Some("item"));
/// assert_eq!(sub2.receive().recv().await, Some("item"));
///
/// sub1.close().await?;
/// broadcaster.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Broadcaster<T> {
    registry: Arc<Registry<T>>,
}

impl<T> Clone for Broadcaster<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T: Send + 'static> Broadcaster<T> {
    pub fn new() -> Self {
        Self::from_config(BroadcasterConfig::default())
    }

    /// Create a broadcaster whose subscriber queues use `config.subscriber`
    pub fn with_config(config: BroadcasterConfig) -> QueueResult<Self> {
        config.subscriber.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: BroadcasterConfig) -> Self {
        Self {
            registry: Arc::new(Registry {
                config,
                state: Mutex::new(RegistryState {
                    next_id: 0,
                    closed: false,
                    queues: HashMap::new(),
                }),
            }),
        }
    }

    /// Register a new subscriber with its own running queue
    ///
    /// Must be called inside a Tokio runtime. Fails with
    /// [`QueueError::BroadcasterClosed`] once the broadcaster is closed.
    pub fn subscribe(&self) -> QueueResult<Subscriber<T>> {
        let mut state = self.registry.lock()?;
        if state.closed {
            return Err(QueueError::BroadcasterClosed);
        }

        let id = state.next_id;
        state.next_id += 1;

        let queue = Arc::new(Queue::spawn(self.registry.config.subscriber_config(id)));
        state.queues.insert(id, Arc::clone(&queue));
        log::debug!(
            "Subscriber {} registered, {} active",
            id,
            state.queues.len()
        );

        Ok(Subscriber::new(id, Arc::downgrade(&self.registry), queue))
    }

    /// Number of currently registered subscribers
    pub fn subscriber_count(&self) -> QueueResult<usize> {
        Ok(self.registry.lock()?.queues.len())
    }

    pub fn is_closed(&self) -> bool {
        self.registry
            .lock()
            .map(|state| state.closed)
            .unwrap_or(true)
    }

    /// Close every registered subscriber queue and refuse new subscribers
    ///
    /// Queues are unregistered and signalled under the registry lock, then
    /// awaited after it is released. A failure on one queue does not stop
    /// the others from closing; the first error is returned. Calling close
    /// again is a no-op.
    pub async fn close(&self) -> QueueResult<()> {
        let mut first_error = None;
        let queues: Vec<Arc<Queue<T>>> = {
            let mut state = self.registry.lock()?;
            state.closed = true;
            let queues: Vec<Arc<Queue<T>>> =
                state.queues.drain().map(|(_, queue)| queue).collect();
            for queue in &queues {
                if let Err(e) = queue.signal_close() {
                    log_error_with_context(
                        &e,
                        &format!("Signalling subscriber queue '{}'", queue.name()),
                    );
                    first_error.get_or_insert(e);
                }
            }
            queues
        };

        if !queues.is_empty() {
            log::debug!("Broadcaster closing {} subscriber queue(s)", queues.len());
        }

        let results = join_all(queues.iter().map(|queue| queue.close())).await;

        for (queue, result) in queues.iter().zip(results) {
            if let Err(e) = result {
                log_error_with_context(&e, &format!("Closing subscriber queue '{}'", queue.name()));
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<T: Clone + Send + 'static> Broadcaster<T> {
    /// Push a copy of `item` to every registered subscriber
    ///
    /// Never waits on a slow subscriber. Returns the number of subscribers
    /// the item was pushed to; after close this is always zero.
    pub fn publish(&self, item: T) -> QueueResult<usize> {
        let state = self.registry.lock()?;
        for queue in state.queues.values() {
            queue.push(item.clone());
        }
        Ok(state.queues.len())
    }
}

impl<T: Send + 'static> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}
