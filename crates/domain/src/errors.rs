//! Error types used throughout the client core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Mediadesk
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum MediadeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Mediadesk operations
pub type Result<T> = std::result::Result<T, MediadeskError>;
