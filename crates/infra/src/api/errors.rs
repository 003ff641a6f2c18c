//! API-specific error types
//!
//! Provides error classification for API operations with retry metadata.

use std::time::Duration;

use mediadesk_common::auth::RefreshError;
use mediadesk_domain::MediadeskError;
use thiserror::Error;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication errors (401, 403) - recoverable via token refresh
    Authentication,
    /// Refresh budget exhausted - terminal until a new login
    SessionInvalid,
    /// Rate limiting errors (429) - retry with backoff
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except auth) - non-retryable
    Client,
    /// Network/connection errors - retryable
    Network,
    /// Configuration errors - non-retryable
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Session invalid: re-authentication required")]
    SessionInvalid,

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) => ApiErrorCategory::Authentication,
            Self::SessionInvalid => ApiErrorCategory::SessionInvalid,
            Self::RateLimit(_) => ApiErrorCategory::RateLimit,
            Self::Server(_) => ApiErrorCategory::Server,
            Self::Client(_) => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) | Self::Cancelled => ApiErrorCategory::Config,
        }
    }

    /// Check if this error should be retried
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }
}

/// Refresh failures surface through the dispatcher as API errors.
impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::SessionInvalid => Self::SessionInvalid,
            other => Self::Auth(other.to_string()),
        }
    }
}

/// Transport-level failures from the HTTP client.
impl From<MediadeskError> for ApiError {
    fn from(err: MediadeskError) -> Self {
        match err {
            MediadeskError::Network(message) => Self::Network(message),
            MediadeskError::Auth(message) => Self::Auth(message),
            MediadeskError::Config(message) => Self::Config(message),
            MediadeskError::NotFound(message) | MediadeskError::InvalidInput(message) => {
                Self::Client(message)
            }
            MediadeskError::Internal(message) => Self::Server(message),
        }
    }
}
