use thiserror::Error;

/// Failure kinds surfaced by every messaging operation.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// Token is missing, malformed, expired or names a user that no longer exists.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// A message, container or user id does not resolve.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Length, format or mutually-exclusive-field violation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authenticated, target resolves, but the caller lacks membership or ownership.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Store, lock or runtime failure. Not the caller's fault.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MessagingError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidInput(what.into())
    }

    pub fn forbidden(what: impl Into<String>) -> Self {
        Self::Forbidden(what.into())
    }
}

impl From<anyhow::Error> for MessagingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", err))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MessagingError>;
