//! # Error Handling
//!
//! Error types for Koyomi operations.
//!
//! ## Design Principles
//!
//! 1. **Explicit outcomes**: not-found and invalid-key are distinct kinds,
//!    not storage faults
//! 2. **Recoverable vs fatal**: the session retries exactly once on
//!    recoverable storage faults; everything else propagates
//! 3. **Never-caught**: `Interrupted` bypasses all recovery

use thiserror::Error;

/// Result type alias for Koyomi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Primary error type for Koyomi
#[derive(Error, Debug)]
pub enum Error {
    /// Exact point lookup found no row. Callers may translate this to a
    /// default value; the session never retries it.
    #[error("point not found: {duration}/{field}/{item} at time {time}")]
    NotFound {
        duration: String,
        field: String,
        item: String,
        time: i64,
    },

    /// Reserved field-name suffix used directly, or an otherwise
    /// unusable series key (e.g. empty field list for a multi-field hull).
    #[error("invalid key: {message}")]
    InvalidKey { message: String },

    /// Failure from the backing storage engine during resolve/read/write.
    /// Recovered once via close + reopen + retry; a second occurrence
    /// propagates to the caller.
    #[error("storage fault: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("IO error: {message}")]
    Io { message: String, source: std::io::Error },

    /// Operator-requested cancellation. Never caught by the retry path.
    #[error("interrupted")]
    Interrupted,

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Whether the session's close/reopen/retry path applies.
    ///
    /// Only faults that plausibly stem from a corrupted in-memory handle
    /// qualify; caller errors and interruption always propagate directly.
    pub fn is_recoverable_fault(&self) -> bool {
        match self {
            Error::Storage { .. } => true,
            Error::Io { .. } => true,
            Error::Internal { .. } => true,
            Error::NotFound { .. } => false,
            Error::InvalidKey { .. } => false,
            Error::Interrupted => false,
        }
    }

    /// Get error code for monitoring
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "NOT_FOUND",
            Error::InvalidKey { .. } => "INVALID_KEY",
            Error::Storage { .. } => "STORAGE_FAULT",
            Error::Io { .. } => "IO_ERROR",
            Error::Interrupted => "INTERRUPTED",
            Error::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Shorthand for a storage fault with no underlying source.
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            message: message.into(),
            source: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
