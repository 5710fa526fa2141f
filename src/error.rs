// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the system.
//! Internal layers speak [`AppError`]; every public repository operation
//! normalizes it into a [`ContentError`] that names the operation that failed.

use crate::error_recovery::Transient;
use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded, back off and retry
    RateLimited,
    /// The requested object does not exist or is inaccessible
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request body contains invalid JSON
    InvalidJson,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Conflict with current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }

    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::ServiceUnavailable
                | Self::InternalError
                | Self::HttpStatus(429 | 502 | 503 | 504)
        )
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// How a request failed on the wire.
///
/// Derived from the transport error's structure (reqwest flags and the
/// `std::io::ErrorKind` in its source chain), never from its message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request or response timed out.
    Timeout,
    /// The peer reset or aborted an established connection.
    ConnectionReset,
    /// The response body stopped arriving mid-transfer.
    Interrupted,
    /// No connection could be established (DNS, refused, TLS).
    Connect,
    /// Request building, redirects, decoding and anything else.
    Other,
}

impl TransportErrorKind {
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ConnectionReset | Self::Interrupted
        )
    }

    /// Classifies a reqwest error by walking its source chain.
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }

        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            if let Some(io) = cause.downcast_ref::<std::io::Error>() {
                match io.kind() {
                    std::io::ErrorKind::TimedOut => return Self::Timeout,
                    std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe => return Self::ConnectionReset,
                    std::io::ErrorKind::UnexpectedEof => return Self::Interrupted,
                    _ => {}
                }
            }
            source = cause.source();
        }

        if err.is_body() {
            Self::Interrupted
        } else if err.is_connect() {
            Self::Connect
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::ConnectionReset => write!(f, "connection reset"),
            Self::Interrupted => write!(f, "interrupted transfer"),
            Self::Connect => write!(f, "connect"),
            Self::Other => write!(f, "transport"),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid Notion ID format: {0}")]
    InvalidId(String),

    #[error("Network failure ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    #[error("Notion API returned an error ({code}): {message}")]
    NotionService {
        code: NotionErrorCode,
        message: String,
        status: u16,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),

    /// A key that must identify exactly one record matched several.
    #[error("Found {count} records for '{key}'; expected at most one (duplicate source data?)")]
    DuplicateRecords { key: String, count: usize },

    #[error("Cache read failed: {message}")]
    Cache { message: String },

    #[error("Maximum recursion depth ({0}) exceeded")]
    RecursionLimitExceeded(usize),

    /// A dependent repository operation failed; its message is kept verbatim.
    #[error(transparent)]
    SubOperation(Box<ContentError>),

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AppError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { kind, .. } => kind.is_transient(),
            Self::NotionService { code, .. } => code.is_retryable(),
            _ => false,
        }
    }
}

impl Transient for AppError {
    fn is_transient(&self) -> bool {
        AppError::is_transient(self)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport {
            kind: TransportErrorKind::classify(&err),
            message: err.to_string(),
        }
    }
}

// Allow converting from anyhow::Error, preserving error chain
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: format!("{:#}", err),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        AppError::SubOperation(Box::new(err))
    }
}

/// The single failure shape returned by every public repository operation.
///
/// Callers branch on success/failure only; the message keeps the name of the
/// operation that failed plus the underlying cause.
#[derive(Error, Debug)]
#[error("{operation}: {source}")]
pub struct ContentError {
    operation: &'static str,
    #[source]
    source: AppError,
}

impl ContentError {
    pub fn new(operation: &'static str, source: impl Into<AppError>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }

    /// Name of the repository operation that failed.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// The underlying failure, for diagnostics.
    pub fn cause(&self) -> &AppError {
        &self.source
    }
}

/// Result type alias for repository operations
pub type ContentResult<T> = std::result::Result<T, ContentError>;

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidationError;

    #[test]
    fn transient_classification() {
        let timeout = AppError::Transport {
            kind: TransportErrorKind::Timeout,
            message: "operation timed out".to_string(),
        };
        let refused = AppError::Transport {
            kind: TransportErrorKind::Connect,
            message: "connection refused".to_string(),
        };
        let rate_limited = AppError::NotionService {
            code: NotionErrorCode::RateLimited,
            message: "slow down".to_string(),
            status: 429,
        };
        let not_found = AppError::NotionService {
            code: NotionErrorCode::ObjectNotFound,
            message: "gone".to_string(),
            status: 404,
        };

        assert!(timeout.is_transient());
        assert!(rate_limited.is_transient());
        assert!(!refused.is_transient());
        assert!(!not_found.is_transient());
        assert!(!AppError::Validation(ValidationError::EmptyField("slug")).is_transient());
    }

    #[test]
    fn content_error_keeps_operation_and_cause() {
        let inner = ContentError::new(
            "fetch_posts",
            AppError::DuplicateRecords {
                key: "hello-world".to_string(),
                count: 2,
            },
        );
        let outer = ContentError::new("fetch_post", inner);

        assert_eq!(outer.operation(), "fetch_post");
        assert_eq!(
            outer.to_string(),
            "fetch_post: fetch_posts: Found 2 records for 'hello-world'; expected at most one (duplicate source data?)"
        );
    }

    #[test]
    fn anyhow_errors_are_coerced() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "Internal error: boom");
    }

    #[test]
    fn error_code_round_trip() {
        for code in ["rate_limited", "object_not_found", "validation_error"] {
            assert_eq!(NotionErrorCode::from_api_response(code).to_string(), code);
        }
        assert_eq!(NotionErrorCode::from_http_status(502).to_string(), "http_502");
        assert!(NotionErrorCode::from_http_status(502).is_retryable());
    }
}
