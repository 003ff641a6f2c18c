//! Upload-specific error types
//!
//! The taxonomy distinguishes where in the pipeline a failure happened:
//! before any network call (`Validation`), during chunk transfer
//! (`Transfer`), or after all bytes arrived (`Finalization`: the bytes
//! are on the server, only the artifact derivation failed).

use mediadesk_common::auth::RefreshError;
use thiserror::Error;

use crate::api::ApiError;

/// Upload pipeline errors
#[derive(Debug, Error)]
pub enum UploadError {
    /// Payload rejected before any byte was sent (size ceiling, type
    /// allow-list, empty payload)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A chunk could not be transferred within the retry schedule
    #[error("Chunk transfer failed: {0}")]
    Transfer(String),

    /// All bytes were transferred but the artifact could not be derived
    #[error("Finalization failed: {0}")]
    Finalization(String),

    /// Token refresh failed while recovering from an auth-expired chunk
    #[error("Authentication failed during upload: {0}")]
    Auth(#[from] RefreshError),

    /// Session negotiation or another dispatched call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The payload could not be read
    #[error("Failed to read upload source: {0}")]
    Source(#[from] std::io::Error),

    /// The caller cancelled the upload
    #[error("Upload cancelled")]
    Cancelled,
}
