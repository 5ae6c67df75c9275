//! Queue Error Types

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("Queue is empty")]
    Empty,

    #[error("Queue is closed")]
    Closed,

    #[error("Broadcaster is closed")]
    BroadcasterClosed,

    #[error("Queue arbiter failed: {message}")]
    ArbiterFailed { message: String },

    #[error("Invalid queue configuration: {message}")]
    Config { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

impl QueueError {
    /// True when a receive attempt found nothing ready on a live queue
    pub fn is_empty(&self) -> bool {
        matches!(self, QueueError::Empty)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, QueueError::Closed | QueueError::BroadcasterClosed)
    }
}

impl crate::core::error_handling::ContextualError for QueueError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, QueueError::Config { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            QueueError::Config { message } => Some(message),
            _ => None,
        }
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
