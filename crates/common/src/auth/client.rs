//! Refresh wire client
//!
//! Performs the actual `POST /auth/refresh` exchange. Exactly one network
//! attempt per call: the coordinator owns the retry budget, so transport
//! retries here would double-count failures against it.

use std::time::Duration;

use async_trait::async_trait;
use mediadesk_domain::ApiEnvelope;
use reqwest::Client;
use tracing::debug;

use super::traits::{RefreshError, RefreshTransport};
use super::types::RefreshResult;

/// HTTP transport for the refresh endpoint
#[derive(Debug, Clone)]
pub struct RefreshClient {
    http: Client,
    refresh_url: String,
}

impl RefreshClient {
    /// Create a refresh client for the given API base URL and refresh path.
    #[must_use]
    pub fn new(base_url: &str, refresh_path: &str, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { http, refresh_url: format!("{base_url}{refresh_path}") }
    }

    /// The absolute URL this client posts to.
    #[must_use]
    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }
}

#[async_trait]
impl RefreshTransport for RefreshClient {
    async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<RefreshResult, RefreshError> {
        debug!(url = %self.refresh_url, "refreshing access token");

        let response = self
            .http
            .post(&self.refresh_url)
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = ApiEnvelope::<()>::extract_message(&body)
                .unwrap_or_else(|| format!("refresh endpoint returned status {status}"));
            return Err(RefreshError::Rejected(message));
        }

        let envelope: ApiEnvelope<RefreshResult> = response
            .json()
            .await
            .map_err(|e| RefreshError::Network(format!("malformed refresh response: {e}")))?;

        envelope.into_result().map_err(|e| RefreshError::Rejected(e.to_string()))
    }
}
