//! Public API for the broadcast system
//!
//! External modules should import from here rather than directly from internal modules.

pub use crate::broadcast::broadcaster::Broadcaster;
pub use crate::broadcast::subscriber::Subscriber;

// Errors and configuration are shared with the queue
pub use crate::queue::api::{BroadcasterConfig, QueueError, QueueResult};
