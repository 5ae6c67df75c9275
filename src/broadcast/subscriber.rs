//! Subscriber handle
//!
//! A subscriber pairs its id with the queue its broadcaster feeds. The queue
//! is shared with the broadcaster's registry until either side closes it.

use crate::broadcast::broadcaster::Registry;
use crate::queue::api::{Popper, Queue, QueueResult};
use std::sync::{Arc, Weak};

/// Receiving side of one broadcaster subscription
///
/// Dropping a subscriber unregisters it, like [`Subscriber::close`] but
/// without waiting for its queue to stop.
pub struct Subscriber<T: Send + 'static> {
    id: u64,
    registry: Weak<Registry<T>>,
    queue: Arc<Queue<T>>,
}

impl<T: Send + 'static> Subscriber<T> {
    pub(crate) fn new(id: u64, registry: Weak<Registry<T>>, queue: Arc<Queue<T>>) -> Self {
        Self {
            id,
            registry,
            queue,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Endpoint yielding the items published since this subscriber registered
    pub fn receive(&self) -> Popper<T> {
        self.queue.pop()
    }

    /// Unregister from the broadcaster and wait for this subscriber's queue
    /// to stop
    ///
    /// Safe to call more than once. If the broadcaster is closing the queue
    /// at the same time, this still returns only after the queue has stopped.
    pub async fn close(&self) -> QueueResult<()> {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id)?;
        }
        self.queue.close().await
    }
}

impl<T: Send + 'static> Drop for Subscriber<T> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let _ = registry.remove(self.id);
        }
        // Stops the arbiter even when the broadcaster is already gone
        let _ = self.queue.signal_close();
    }
}
