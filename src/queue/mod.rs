//! Unbounded Arbiter Queue Component
//!
//! A FIFO queue with an effectively endless buffer, built from bounded
//! synchronisation primitives. Each queue runs one background arbiter task
//! that owns the backlog and serialises every access to it.
//!
//! # Overview
//!
//! - **Never-blocking producers**: `push` is accepted whether or not anyone is
//!   receiving
//! - **Rendezvous consumers**: a receive completes only when a real item is
//!   handed over, or when the queue closes
//! - **Out-of-band control**: `flush`, `discard` and `close` interleave safely
//!   with in-flight pushes and receives
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐ ┌──────────┐            ┌──────────┐ ┌──────────┐
//! │Producer A│ │Producer B│            │Consumer A│ │Consumer B│
//! └────┬─────┘ └────┬─────┘            └────▲─────┘ └────▲─────┘
//!      │ push       │ push                  │ recv       │ recv
//!      ▼            ▼                       │            │
//! ┌─────────────────────────────────────────┴────────────┴─────┐
//! │                     Arbiter task (per queue)               │
//! │   ┌───┬───┬───┬───┬───┬───┐                                │
//! │   │ 1 │ 2 │ 3 │ 4 │ 5 │...│  backlog, owned exclusively    │
//! │   └───┴───┴───┴───┴───┴───┘                                │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use chanqueue::queue::api::Queue;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = Queue::new();
//! queue.push(1);
//! queue.discard(true).await;
//! queue.push(2); // dropped
//! queue.discard(false).await;
//! queue.push(3);
//!
//! let popper = queue.pop();
//! assert_eq!(popper.recv().await, Some(1));
//! assert_eq!(popper.recv().await, Some(3));
//!
//! queue.close().await?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod config;
pub(crate) mod consumer;
pub(crate) mod error;
pub(crate) mod internal;
pub(crate) mod types;
pub(crate) mod unbounded;

// Public API module - the only public interface for the queue system
pub mod api;

#[cfg(test)]
mod tests;
