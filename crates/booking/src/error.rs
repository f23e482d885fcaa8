use stayhub_core::error::CoreError;

/// Error type for coordinator operations.
///
/// Domain failures (validation, conflict, precondition, not-found) travel
/// as [`CoreError`] so the HTTP layer maps them to stable user-visible
/// categories; `Database` covers infrastructure failures that surface as a
/// generic retryable error.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl BookingError {
    /// Shorthand for a conflict-category error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        BookingError::Core(CoreError::Conflict(msg.into()))
    }

    /// Shorthand for a validation-category error.
    pub fn validation(msg: impl Into<String>) -> Self {
        BookingError::Core(CoreError::Validation(msg.into()))
    }
}
