//! Synchronization utilities for robust mutex handling
//!
//! Registry and handle locks are short-lived std mutexes. A poisoned lock
//! means a panic happened while it was held; callers turn that into their own
//! error type instead of propagating the panic.

use std::sync::LockResult;

/// Handle poisoned mutex cases with consistent error handling
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use chanqueue::core::sync::handle_mutex_poison;
/// use chanqueue::queue::api::QueueError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(
///     mutex.lock(),
///     |message| QueueError::OperationFailed { message }
/// ).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned). \
             A panic occurred while holding a lock. PoisonError: {:?}",
            poison_err
        ))
    })
}
