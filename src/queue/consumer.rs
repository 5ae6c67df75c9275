//! Consumer side of a queue
//!
//! A [`Popper`] is the receivable returned by `Queue::pop`. It can be cloned
//! and shared between tasks; every item is handed to exactly one receive.

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::internal::{ConsumerEvent, Delivery, Request};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Receiving endpoint of a queue
///
/// # Example
///
/// ```rust,no_run
/// # use chanqueue::queue::api::Queue;
/// # async fn example() {
/// let queue = Queue::new();
/// queue.push("item");
///
/// let popper = queue.pop();
/// assert_eq!(popper.recv().await, Some("item"));
///
/// queue.close().await.unwrap();
/// assert_eq!(popper.recv().await, None);
/// # }
/// ```
pub struct Popper<T> {
    requests: mpsc::UnboundedSender<Request<T>>,
    events: mpsc::UnboundedSender<ConsumerEvent<T>>,
}

impl<T> Clone for Popper<T> {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
            events: self.events.clone(),
        }
    }
}

impl<T: Send + 'static> Popper<T> {
    pub(crate) fn new(
        requests: mpsc::UnboundedSender<Request<T>>,
        events: mpsc::UnboundedSender<ConsumerEvent<T>>,
    ) -> Self {
        Self { requests, events }
    }

    /// Wait for the next item
    ///
    /// Returns `None` once the queue is closed; a closed queue never yields
    /// another item. Cancelling this future never loses an item: one that was
    /// already handed over goes back to the head of the backlog, unless a
    /// flush has cut it off in the meantime.
    pub async fn recv(&self) -> Option<T> {
        let (slot, reply) = oneshot::channel();
        self.events.send(ConsumerEvent::Wait(slot)).ok()?;

        let mut handoff = Handoff::new(reply, self.events.clone());
        handoff.wait().await
    }

    /// Take the head item if one is ready, without waiting for a push
    ///
    /// Returns `Err(QueueError::Empty)` when the backlog is empty and
    /// `Err(QueueError::Closed)` when the queue has been closed.
    pub async fn try_recv(&self) -> QueueResult<T> {
        let (slot, reply) = oneshot::channel();
        self.requests
            .send(Request::TryPop(slot))
            .map_err(|_| QueueError::Closed)?;

        let mut handoff = Handoff::new(reply, self.events.clone());
        match handoff.wait().await {
            Some(item) => Ok(item),
            // The arbiter drops the slot both for "empty" and when it stops;
            // only the latter closes the request stream.
            None if self.requests.is_closed() => Err(QueueError::Closed),
            None => Err(QueueError::Empty),
        }
    }

    /// Wait at most `timeout` for the next item
    pub async fn recv_timeout(&self, timeout: Duration) -> QueueResult<T> {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(Some(item)) => Ok(item),
            Ok(None) => Err(QueueError::Closed),
            Err(_) => Err(QueueError::Empty),
        }
    }

    /// True once the queue's arbiter has stopped
    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }
}

/// Pending hand-off of one item from the arbiter
///
/// A received item is confirmed with its ticket before `wait` returns. If
/// dropped before that, an item that already left the backlog is sent back
/// to the arbiter instead of being lost with the reply slot.
struct Handoff<T> {
    reply: oneshot::Receiver<Delivery<T>>,
    events: mpsc::UnboundedSender<ConsumerEvent<T>>,
    done: bool,
}

impl<T> Handoff<T> {
    fn new(
        reply: oneshot::Receiver<Delivery<T>>,
        events: mpsc::UnboundedSender<ConsumerEvent<T>>,
    ) -> Self {
        Self {
            reply,
            events,
            done: false,
        }
    }

    async fn wait(&mut self) -> Option<T> {
        let result = (&mut self.reply).await;
        self.done = true;

        let Delivery { ticket, item } = result.ok()?;
        // Lets the arbiter move on to the next receiver
        let _ = self.events.send(ConsumerEvent::Taken(ticket));
        Some(item)
    }
}

impl<T> Drop for Handoff<T> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.reply.close();
        if let Ok(Delivery { ticket, item }) = self.reply.try_recv() {
            log::trace!("Returning item from cancelled receive to the backlog");
            // A closed queue abandons the item along with its backlog
            let _ = self.events.send(ConsumerEvent::Returned(ticket, item));
        }
    }
}
