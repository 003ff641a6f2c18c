//! Wire-level types shared across the client core
//!
//! Every Mediadesk API response is wrapped in the same envelope shape
//! (`errorCode` / `message` / `result`). [`ApiEnvelope`] is the single type
//! used to decode it; call sites never probe fallback fields by hand.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::ENVELOPE_SUCCESS_CODE;

/// Uniform response wrapper used by every Mediadesk API endpoint.
///
/// `errorCode == 0` is the success sentinel; any other value means the
/// operation failed even when the HTTP status is 200.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub error_code: i32,

    /// Human-readable failure description supplied by the server.
    #[serde(default)]
    pub message: Option<String>,

    /// Operation payload, present on success.
    #[serde(default)]
    pub result: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the envelope into its payload.
    ///
    /// # Errors
    /// Returns [`EnvelopeError`] if the error code is not the success
    /// sentinel, or if a successful envelope is missing its payload.
    pub fn into_result(self) -> std::result::Result<T, EnvelopeError> {
        if self.error_code != ENVELOPE_SUCCESS_CODE {
            return Err(EnvelopeError { code: self.error_code, message: self.message });
        }

        self.result.ok_or(EnvelopeError {
            code: ENVELOPE_SUCCESS_CODE,
            message: Some("envelope result is missing".to_string()),
        })
    }

    /// Extract the server message from a raw response body, if the body is
    /// an envelope at all. Used when mapping non-success HTTP statuses.
    #[must_use]
    pub fn extract_message(body: &str) -> Option<String> {
        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(body).ok()?;
        envelope.message
    }
}

/// Failure reported inside a response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeError {
    pub code: i32,
    pub message: Option<String>,
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} (code {})", message, self.code),
            None => write!(f, "server reported error code {}", self.code),
        }
    }
}

impl std::error::Error for EnvelopeError {}

/// Identity snapshot of the signed-in admin user.
///
/// Stored alongside the tokens and invalidated together with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub login_id: String,
    pub display_name: String,
}

/// Artifact descriptor returned once an upload has been finalized.
///
/// Owned by the caller; the server keeps deriving renditions in the
/// background, so the optional URLs may lag the `stream_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamArtifacts {
    pub stream_id: String,
    pub embed_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub hls_url: Option<String>,
    #[serde(default)]
    pub dash_url: Option<String>,
}
