//! Broadcast Component
//!
//! Fan-out on top of the unbounded queue. A [`api::Broadcaster`] keeps a
//! registry of subscribers, each backed by its own [`crate::queue::api::Queue`].
//! Publishing pushes a copy of the item to every subscriber registered at
//! that moment, so a slow subscriber only grows its own backlog.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────┐
//!      publish ─────►│ Broadcaster │
//!                    └──────┬──────┘
//!            ┌──────────────┼──────────────┐
//!            ▼              ▼              ▼
//!       ┌─────────┐    ┌─────────┐    ┌─────────┐
//!       │ Queue 0 │    │ Queue 1 │    │ Queue 2 │
//!       └────┬────┘    └────┬────┘    └────┬────┘
//!            ▼              ▼              ▼
//!       Subscriber 0   Subscriber 1   Subscriber 2
//! ```
//!
//! Subscribers only see items published after they registered. Closing a
//! subscriber removes it from the registry; closing the broadcaster closes
//! every remaining subscriber and rejects new ones.

pub(crate) mod broadcaster;
pub(crate) mod subscriber;

// Public API module - the only public interface for the broadcast system
pub mod api;

#[cfg(test)]
mod tests;
