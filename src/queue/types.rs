//! Type definitions for the queue system
//!
//! Statistics are produced by the arbiter itself, so a snapshot is always
//! consistent with the backlog at the moment the request was handled.

/// Snapshot of a queue's state and lifetime counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Items currently waiting in the backlog
    pub backlog_len: usize,
    /// Whether pushes are currently being discarded
    pub discarding: bool,
    /// Receives currently blocked waiting for an item
    pub waiting: usize,
    /// Items accepted into the backlog
    pub pushed: u64,
    /// Items dropped because discard mode was enabled
    pub discarded: u64,
    /// Items handed to a receiver
    pub delivered: u64,
    /// Items removed from the backlog by flush
    pub flushed: u64,
}

impl QueueStats {
    /// Items that entered the backlog and have not left it by any route
    pub fn in_flight(&self) -> u64 {
        self.pushed
            .saturating_sub(self.delivered)
            .saturating_sub(self.flushed)
    }
}
