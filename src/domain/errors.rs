//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

/// Coarse classification of an [`ApiError`], for callers that branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Non-2xx response.
    Http,
    /// Request aborted by its timeout or by the caller's cancellation token.
    Aborted,
    /// DNS, connection refused and other transport failures.
    Network,
    /// Success body that could not be decoded, or a request body that could not be encoded.
    Decode,
}

/// Failure of a single backend call. Never retried by the client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{method} {path} failed: {status} {status_text} {detail}")]
    Http {
        method: String,
        path: String,
        status: u16,
        status_text: String,
        detail: String,
    },

    #[error("{method} {path} aborted due to timeout or cancellation")]
    Aborted { method: String, path: String },

    #[error("network request to {url} failed")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{method} {path} returned an unreadable body: {reason}")]
    Decode {
        method: String,
        path: String,
        reason: String,
    },
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Http { .. } => ErrorCode::Http,
            ApiError::Aborted { .. } => ErrorCode::Aborted,
            ApiError::Network { .. } => ErrorCode::Network,
            ApiError::Decode { .. } => ErrorCode::Decode,
        }
    }

    /// HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.code() == ErrorCode::Aborted
    }
}

#[derive(Error, Debug)]
pub enum DomainError {
    /// Form input refused before any request is issued.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// A page operation that needs a loaded selection was called without one.
    #[error("Nothing selected: {0}")]
    NotLoaded(String),

    #[error("Prompt failed: {0}")]
    Ui(String),
}

impl DomainError {
    /// True when the failure is an aborted request (timeout, cancellation, superseded load).
    pub fn is_aborted(&self) -> bool {
        matches!(self, DomainError::Api(e) if e.is_aborted())
    }
}
