//! Common result and error types for the estimator.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates a broken invariant inside the estimator (a bug), not a
/// user-facing problem. Inconsistent or out-of-range user input is corrected
/// or clamped and reported through a `DiagnosticSink` instead.
pub type XbarResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in the estimator, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal estimator error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
