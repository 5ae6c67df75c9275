//! Unbounded channel-backed queues with broadcast fan-out
//!
//! - [`queue`]: FIFO queue driven by a single arbiter task, with flush,
//!   discard and cancellation-safe receives
//! - [`broadcast`]: publisher that copies each item into one queue per
//!   subscriber
//! - [`core`]: logging, error reporting and lock helpers shared by both

pub mod broadcast;
pub mod core;
pub mod queue;
