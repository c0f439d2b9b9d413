/// Unified error types for the manila file service
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum Error {
    /// Document store errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Creation-time validation errors; the message is the
    /// machine-checkable reason ("Missing name", "Parent not found", ...)
    #[error("{0}")]
    Validation(String),

    /// Record absent, malformed id, or access denied. Deliberately
    /// undistinguished so callers cannot probe for existence.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Blob read/write failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// Document store or cache unreachable; degrades the operation,
    /// never crashes the process
    #[error("Dependency unavailable: {0}")]
    Unavailable(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status class for this error kind.
    ///
    /// The transport layer lives outside this crate; this mapping is the
    /// one-to-one contract it derives its responses from.
    pub fn status_class(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::Unavailable(_) => 503,
            Error::Database(_) | Error::Storage(_) | Error::Internal(_) | Error::Io(_) => 500,
        }
    }

    /// Shorthand for validation failures with a reason string
    pub fn validation(reason: impl Into<String>) -> Self {
        Error::Validation(reason.into())
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, Error>;
