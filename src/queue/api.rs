//! Public API for the queue system
//!
//! This module provides the complete public API for the unbounded queue.
//! External modules should import from here rather than directly from internal modules.

// Queue handle and its receiving endpoint
pub use crate::queue::consumer::Popper;
pub use crate::queue::unbounded::Queue;

// Configuration
pub use crate::queue::config::{BroadcasterConfig, QueueConfig, DEFAULT_INITIAL_CAPACITY};

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

// Statistics
pub use crate::queue::types::QueueStats;
