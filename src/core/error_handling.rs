//! Generic error handling utilities
//!
//! Provides unified error logging that can work across different error types
//! while keeping user-facing messages separate from system detail.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)` with a helpful, actionable message; otherwise it returns
/// `None`.
pub trait ContextualError: std::error::Error {
    /// True if this error carries a message the user can act on directly
    /// (for example an invalid configuration value)
    fn is_user_actionable(&self) -> bool;

    /// The specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log an error with a detail level based on its specificity
///
/// User-actionable errors log their own message; system errors log the
/// operation context. Full detail always goes to debug level.
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message().filter(|_| error.is_user_actionable()) {
        Some(user_msg) => log::error!("{}: {}", operation_context, user_msg),
        None => log::error!("{} failed", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
