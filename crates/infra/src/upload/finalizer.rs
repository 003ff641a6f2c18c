//! Completion finalizer
//!
//! One call, made exactly once per successful transfer: it asks the server
//! to derive the playable artifact (transcoding, thumbnails) from the raw
//! bytes already on its side. Failures here are a distinct error class
//! from transfer failures and are never retried by this layer.

use std::sync::Arc;

use mediadesk_domain::constants::UPLOAD_SESSIONS_PATH;
use mediadesk_domain::StreamArtifacts;
use tracing::{info, instrument};

use super::errors::UploadError;
use super::types::UploadSession;
use crate::api::ApiClient;

/// Converts a fully-transferred session into a stream artifact.
pub struct CompletionFinalizer {
    api: Arc<ApiClient>,
}

impl CompletionFinalizer {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Finalize a session whose bytes have all been accepted.
    ///
    /// # Errors
    /// Returns [`UploadError::Finalization`] when the session is not fully
    /// transferred or the server fails to derive the artifact.
    #[instrument(skip(self, session), fields(session_key = %session.session_key))]
    pub async fn finalize(&self, session: &UploadSession) -> Result<StreamArtifacts, UploadError> {
        if !session.is_fully_transferred() {
            return Err(UploadError::Finalization(format!(
                "session {} has transferred {}/{} bytes",
                session.session_key, session.bytes_uploaded, session.total_bytes
            )));
        }

        let path = format!("{UPLOAD_SESSIONS_PATH}/{}/complete", session.session_key);
        let artifacts: StreamArtifacts = self
            .api
            .post(&path, &serde_json::json!({}))
            .await
            .map_err(|e| UploadError::Finalization(e.to_string()))?;

        info!(stream_id = %artifacts.stream_id, "upload finalized");
        Ok(artifacts)
    }
}
