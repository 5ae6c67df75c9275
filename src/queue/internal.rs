//! Internal arbiter run-loop
//!
//! The arbiter is the only owner of a queue's backlog. Callers talk to it
//! through two channels:
//! - `requests`: an ordered stream of push / flush / discard / try-pop /
//!   stats requests
//! - `events`: consumer traffic, i.e. blocked receives registering a reply
//!   slot and receipts for items already handed over
//!
//! Because pushes travel on the same ordered stream as flush and discard, a
//! flush acknowledged after N pushes has seen all N of them.
//!
//! ```text
//!  push, flush, discard, try_recv ──► requests ──┐
//!                                                ├──► backlog ──► one hand-off
//!  recv, taken, returned ───────────► events ────┘                at a time
//!  close ────────────────────────────► shutdown      (checked first)
//! ```
//!
//! # Hand-offs
//!
//! Every item leaves the backlog under a ticket. Until its receiver reports
//! the ticket as taken or returned, no other receiver is served, so a
//! returned item can go back to the head without overtaking anything. A
//! flush retires every ticket issued before it; an item returned under a
//! retired ticket is dropped as flushed.

use crate::queue::config::QueueConfig;
use crate::queue::types::QueueStats;
use std::collections::VecDeque;
use tokio::sync::{mpsc, oneshot};

/// Waiting receivers are swept for abandoned slots whenever their number
/// reaches this many (or twice the live count after the last sweep)
const PRUNE_THRESHOLD: usize = 64;

/// An item in transit to one receiver
pub(crate) struct Delivery<T> {
    pub(crate) ticket: u64,
    pub(crate) item: T,
}

/// Reply slot a consumer hands to the arbiter to receive one item
pub(crate) type Waiter<T> = oneshot::Sender<Delivery<T>>;

pub(crate) enum Request<T> {
    Push(T),
    Flush(oneshot::Sender<()>),
    Discard(bool, oneshot::Sender<()>),
    /// Hand over the head item if there is one; the slot is dropped otherwise
    TryPop(Waiter<T>),
    Stats(oneshot::Sender<QueueStats>),
}

pub(crate) enum ConsumerEvent<T> {
    /// A receive blocked until the next item
    Wait(Waiter<T>),
    /// The receiver holding this ticket kept its item
    Taken(u64),
    /// The receiver holding this ticket was cancelled and gave its item back
    Returned(u64, T),
}

enum Event<T> {
    Request(Option<Request<T>>),
    Consumer(Option<ConsumerEvent<T>>),
}

enum Step {
    Continue,
    Stop,
}

pub(crate) struct Arbiter<T> {
    // Dropped first, so a try-pop released at shutdown already sees the
    // request stream closed
    requests: mpsc::UnboundedReceiver<Request<T>>,
    events: mpsc::UnboundedReceiver<ConsumerEvent<T>>,
    name: String,
    high_water_mark: Option<usize>,
    above_high_water: bool,
    backlog: VecDeque<T>,
    discard: bool,
    stats: QueueStats,
    /// Blocked receives in arrival order
    waiting: VecDeque<Waiter<T>>,
    /// Try-pops held back while a hand-off is unconfirmed
    tries: VecDeque<Waiter<T>>,
    prune_at: usize,
    next_ticket: u64,
    /// Tickets below this were issued before the last flush
    flush_floor: u64,
    /// Hand-off whose receiver has not yet reported back
    outstanding: Option<u64>,
}

impl<T: Send + 'static> Arbiter<T> {
    pub(crate) fn new(
        config: QueueConfig,
        requests: mpsc::UnboundedReceiver<Request<T>>,
        events: mpsc::UnboundedReceiver<ConsumerEvent<T>>,
    ) -> Self {
        Self {
            requests,
            events,
            name: config.name,
            high_water_mark: config.high_water_mark,
            above_high_water: false,
            backlog: VecDeque::with_capacity(config.initial_capacity),
            discard: false,
            stats: QueueStats::default(),
            waiting: VecDeque::new(),
            tries: VecDeque::new(),
            prune_at: PRUNE_THRESHOLD,
            next_ticket: 0,
            flush_floor: 0,
            outstanding: None,
        }
    }

    /// Run until close is signalled or every handle to the queue is gone
    pub(crate) async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        log::debug!("Queue '{}' arbiter started", self.name);

        loop {
            // Close wins over any amount of pending traffic
            let event = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                event = self.next_event() => event,
            };

            if let Step::Stop = self.on_event(event) {
                break;
            }
            self.serve();
        }

        log::debug!(
            "Queue '{}' arbiter stopped, abandoning {} item(s)",
            self.name,
            self.backlog.len()
        );
    }

    /// Next request or consumer event, picked fairly when both are ready
    async fn next_event(&mut self) -> Event<T> {
        tokio::select! {
            request = self.requests.recv() => Event::Request(request),
            event = self.events.recv() => Event::Consumer(event),
        }
    }

    fn on_event(&mut self, event: Event<T>) -> Step {
        match event {
            Event::Request(Some(request)) => self.on_request(request),
            Event::Consumer(Some(event)) => self.on_consumer(event),
            // Every handle dropped without close
            Event::Request(None) | Event::Consumer(None) => return Step::Stop,
        }
        Step::Continue
    }

    fn on_request(&mut self, request: Request<T>) {
        match request {
            Request::Push(item) => {
                if self.discard {
                    self.stats.discarded += 1;
                    log::trace!("Queue '{}' discarded pushed item", self.name);
                } else {
                    self.backlog.push_back(item);
                    self.stats.pushed += 1;
                    self.check_high_water();
                }
            }
            Request::Flush(ack) => {
                let flushed = self.backlog.len();
                self.backlog.clear();
                self.stats.flushed += flushed as u64;
                self.above_high_water = false;
                self.flush_floor = self.next_ticket;
                self.outstanding = None;
                log::trace!("Queue '{}' flushed {} item(s)", self.name, flushed);
                let _ = ack.send(());
            }
            Request::Discard(enabled, ack) => {
                if self.discard != enabled {
                    log::debug!("Queue '{}' discard mode set to {}", self.name, enabled);
                }
                self.discard = enabled;
                let _ = ack.send(());
            }
            Request::TryPop(slot) => self.tries.push_back(slot),
            Request::Stats(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn on_consumer(&mut self, event: ConsumerEvent<T>) {
        match event {
            ConsumerEvent::Wait(waiter) => {
                self.waiting.push_back(waiter);
                if self.waiting.len() >= self.prune_at {
                    self.waiting.retain(|waiter| !waiter.is_closed());
                    self.prune_at = (self.waiting.len() * 2).max(PRUNE_THRESHOLD);
                }
            }
            ConsumerEvent::Taken(ticket) => {
                if self.outstanding == Some(ticket) {
                    self.outstanding = None;
                }
            }
            ConsumerEvent::Returned(ticket, item) => {
                self.stats.delivered = self.stats.delivered.saturating_sub(1);
                if ticket < self.flush_floor {
                    self.stats.flushed += 1;
                    log::trace!(
                        "Queue '{}' dropped an item returned after a flush",
                        self.name
                    );
                    return;
                }
                if self.outstanding == Some(ticket) {
                    self.outstanding = None;
                }
                self.backlog.push_front(item);
            }
        }
    }

    /// Hand the head item to the next receiver, one hand-off at a time
    fn serve(&mut self) {
        while self.outstanding.is_none() && !self.backlog.is_empty() {
            let slot = match self.tries.pop_front() {
                Some(slot) => slot,
                None => match self.waiting.pop_front() {
                    Some(slot) => slot,
                    None => break,
                },
            };
            self.hand_over(slot);
        }

        if self.backlog.is_empty() {
            // Dropping the slots answers the try-pops with "empty"
            self.tries.clear();
        }
    }

    /// Move the head item into the slot, keeping it at the head if the
    /// receiving side has already gone away
    fn hand_over(&mut self, slot: Waiter<T>) {
        let Some(item) = self.backlog.pop_front() else {
            return;
        };

        let ticket = self.next_ticket;
        match slot.send(Delivery { ticket, item }) {
            Ok(()) => {
                self.next_ticket += 1;
                self.outstanding = Some(ticket);
                self.stats.delivered += 1;
                if self.backlog.is_empty() {
                    self.above_high_water = false;
                }
            }
            Err(Delivery { item, .. }) => self.backlog.push_front(item),
        }
    }

    fn check_high_water(&mut self) {
        let Some(mark) = self.high_water_mark else {
            return;
        };

        let len = self.backlog.len();
        if len >= mark && !self.above_high_water {
            self.above_high_water = true;
            log::warn!(
                "Queue '{}' backlog reached high-water mark: {} item(s) (mark: {})",
                self.name,
                len,
                mark
            );
        } else if len < mark {
            self.above_high_water = false;
        }
    }

    fn snapshot(&self) -> QueueStats {
        QueueStats {
            backlog_len: self.backlog.len(),
            discarding: self.discard,
            waiting: self.waiting.iter().filter(|waiter| !waiter.is_closed()).count(),
            ..self.stats.clone()
        }
    }
}
