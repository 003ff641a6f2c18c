//! Upload session manager
//!
//! Drives the whole pipeline: preconditions, session negotiation, the
//! sequential chunk loop with fixed-schedule retries, the
//! restart-from-zero recovery after an authentication expiry, and the
//! final completion call.

use std::fmt;
use std::sync::Arc;

use mediadesk_common::resilience::{
    run_with_schedule, BackoffSchedule, RetryDecision, RetryError, RetryPolicy,
};
use mediadesk_domain::constants::{REQUEST_ID_HEADER, UPLOAD_SESSIONS_PATH};
use mediadesk_domain::{ApiEnvelope, StreamArtifacts, UploadConfig};
use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::errors::UploadError;
use super::finalizer::CompletionFinalizer;
use super::progress::ProgressReporter;
use super::source::ChunkSource;
use super::types::{SessionLocator, UploadSession, UploadState};
use crate::api::{ApiClient, ApiError, TokenProvider};
use crate::http::HttpClient;

/// Session-creation request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest<'a> {
    file_name: &'a str,
    content_type: &'a str,
    total_bytes: u64,
}

/// Per-attempt chunk failure classification.
#[derive(Debug)]
enum ChunkError {
    /// 401/403: the access token lapsed mid-transfer
    AuthExpired,
    /// Transport failure or 5xx/429: worth another attempt on the schedule
    Retryable(String),
    /// Any other rejection: retrying cannot help
    Fatal(String),
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthExpired => write!(f, "authentication expired"),
            Self::Retryable(message) | Self::Fatal(message) => write!(f, "{message}"),
        }
    }
}

struct ChunkRetryPolicy;

impl RetryPolicy<ChunkError> for ChunkRetryPolicy {
    fn classify(&self, error: &ChunkError, _attempt: u32) -> RetryDecision {
        match error {
            ChunkError::Retryable(_) => RetryDecision::Retry,
            ChunkError::AuthExpired | ChunkError::Fatal(_) => RetryDecision::Stop,
        }
    }
}

/// How a transfer attempt ended, seen from the restart loop.
enum TransferAbort {
    /// Auth expiry aborted the session; the manager may restart once
    AuthExpired,
    /// Terminal failure, surfaced to the caller as-is
    Fatal(UploadError),
}

/// Chunked, restartable upload pipeline
pub struct UploadManager {
    api: Arc<ApiClient>,
    chunk_http: HttpClient,
    tokens: Arc<dyn TokenProvider>,
    finalizer: CompletionFinalizer,
    config: UploadConfig,
}

impl UploadManager {
    /// Create an upload manager on top of a dispatcher.
    ///
    /// Session creation and finalization go through the dispatcher (and so
    /// benefit from its transparent refresh); chunk requests use a
    /// dedicated single-attempt HTTP client because the fixed backoff
    /// schedule owns their retry budget.
    ///
    /// # Errors
    /// Returns error if the chunk HTTP client cannot be built.
    pub fn new(api: Arc<ApiClient>, config: UploadConfig) -> Result<Self, ApiError> {
        let chunk_http = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(config.chunk_timeout_secs))
            .max_attempts(1)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build chunk client: {e}")))?;

        let tokens = api.token_provider();
        let finalizer = CompletionFinalizer::new(api.clone());

        Ok(Self { api, chunk_http, tokens, finalizer, config })
    }

    /// Upload a payload and return the finalized artifact descriptor.
    ///
    /// `on_progress` receives `bytes_uploaded / total_bytes` after each
    /// accepted chunk; values never decrease and reach 1.0 exactly once,
    /// on success.
    ///
    /// # Errors
    /// See [`UploadError`] for the failure taxonomy.
    pub async fn upload<F>(
        &self,
        source: &dyn ChunkSource,
        on_progress: F,
    ) -> Result<StreamArtifacts, UploadError>
    where
        F: FnMut(f64),
    {
        self.upload_cancellable(source, on_progress, CancellationToken::new()).await
    }

    /// Like [`Self::upload`], with a cancellation token for user-initiated
    /// aborts. Cancellation is observed between chunks.
    ///
    /// # Errors
    /// Returns [`UploadError::Cancelled`] when the token fires; otherwise
    /// see [`UploadError`].
    #[instrument(skip_all, fields(file_name = %source.file_name(), total_bytes = source.total_bytes()))]
    pub async fn upload_cancellable<F>(
        &self,
        source: &dyn ChunkSource,
        mut on_progress: F,
        cancel: CancellationToken,
    ) -> Result<StreamArtifacts, UploadError>
    where
        F: FnMut(f64),
    {
        self.validate(source)?;

        let mut progress = ProgressReporter::new(source.total_bytes());
        let mut auth_restarts = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(UploadError::Cancelled);
            }

            let mut session = self.create_session(source).await?;
            info!(session_key = %session.session_key, "upload session created");

            match self
                .transfer(source, &mut session, &mut progress, &mut on_progress, &cancel)
                .await
            {
                Ok(()) => return self.finalizer.finalize(&session).await,
                Err(TransferAbort::AuthExpired) if auth_restarts == 0 => {
                    auth_restarts += 1;
                    warn!(
                        session_key = %session.session_key,
                        bytes_uploaded = session.bytes_uploaded,
                        "chunk rejected for authentication, refreshing and restarting from byte zero"
                    );
                    self.tokens.fresh_token().await.map_err(UploadError::Auth)?;
                }
                Err(TransferAbort::AuthExpired) => {
                    return Err(UploadError::Transfer(
                        "chunk rejected for authentication even after a token refresh".to_string(),
                    ));
                }
                Err(TransferAbort::Fatal(err)) => return Err(err),
            }
        }
    }

    /// Synchronous preconditions; violations cost zero network calls.
    fn validate(&self, source: &dyn ChunkSource) -> Result<(), UploadError> {
        let total = source.total_bytes();
        if total == 0 {
            return Err(UploadError::Validation("upload source is empty".to_string()));
        }
        if total > self.config.max_file_bytes {
            return Err(UploadError::Validation(format!(
                "file size {total} exceeds the {} byte ceiling",
                self.config.max_file_bytes
            )));
        }

        let content_type = source.content_type();
        if !self.config.allowed_types.iter().any(|t| t.eq_ignore_ascii_case(content_type)) {
            return Err(UploadError::Validation(format!(
                "content type {content_type} is not allowed"
            )));
        }

        Ok(())
    }

    /// Negotiate a fresh session with the server.
    async fn create_session(&self, source: &dyn ChunkSource) -> Result<UploadSession, UploadError> {
        let request = CreateSessionRequest {
            file_name: source.file_name(),
            content_type: source.content_type(),
            total_bytes: source.total_bytes(),
        };

        let locator: SessionLocator = self.api.post(UPLOAD_SESSIONS_PATH, &request).await?;
        Ok(UploadSession::new(locator, source.total_bytes()))
    }

    /// Sequential chunk loop for one session.
    async fn transfer<F>(
        &self,
        source: &dyn ChunkSource,
        session: &mut UploadSession,
        progress: &mut ProgressReporter,
        on_progress: &mut F,
        cancel: &CancellationToken,
    ) -> Result<(), TransferAbort>
    where
        F: FnMut(f64),
    {
        session.advance(UploadState::Uploading);

        let schedule = BackoffSchedule::from_secs(&self.config.backoff_secs);
        let total = session.total_bytes;
        let upload_url = session.upload_url.clone();

        while session.bytes_uploaded < total {
            if cancel.is_cancelled() {
                session.advance(UploadState::Aborted);
                return Err(TransferAbort::Fatal(UploadError::Cancelled));
            }

            let offset = session.bytes_uploaded;
            let want = (total - offset).min(self.config.chunk_bytes);
            let chunk = match source.read_chunk(offset, want).await {
                Ok(chunk) => chunk,
                Err(err) => {
                    session.advance(UploadState::Failed);
                    return Err(TransferAbort::Fatal(err.into()));
                }
            };

            let sent = run_with_schedule(&schedule, &ChunkRetryPolicy, || {
                self.try_send_chunk(&upload_url, total, offset, &chunk)
            })
            .await;

            match sent {
                Ok(()) => {
                    session.bytes_uploaded = offset + chunk.len() as u64;
                    debug!(
                        session_key = %session.session_key,
                        offset,
                        chunk_len = chunk.len(),
                        "chunk accepted"
                    );
                    progress.advance(session.bytes_uploaded, on_progress);
                }
                Err(RetryError::NonRetryable { source: ChunkError::AuthExpired }) => {
                    session.advance(UploadState::Aborted);
                    return Err(TransferAbort::AuthExpired);
                }
                Err(RetryError::NonRetryable { source }) => {
                    session.advance(UploadState::Failed);
                    return Err(TransferAbort::Fatal(UploadError::Transfer(source.to_string())));
                }
                Err(RetryError::AttemptsExhausted { attempts, source }) => {
                    session.advance(UploadState::Failed);
                    return Err(TransferAbort::Fatal(UploadError::Transfer(format!(
                        "chunk at offset {offset} failed after {attempts} attempts: {source}"
                    ))));
                }
            }
        }

        session.advance(UploadState::Completed);
        Ok(())
    }

    /// One chunk request; exactly one HTTP attempt.
    async fn try_send_chunk(
        &self,
        upload_url: &str,
        total: u64,
        offset: u64,
        chunk: &[u8],
    ) -> Result<(), ChunkError> {
        let end = offset + chunk.len() as u64 - 1;
        let mut builder = self
            .chunk_http
            .request(Method::PUT, upload_url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_RANGE, format!("bytes {offset}-{end}/{total}"))
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .body(chunk.to_vec());

        if let Some(token) = self.tokens.current_token().await {
            builder = builder.bearer_auth(token);
        }

        let response = self.chunk_http.send(builder).await.map_err(|err| match err {
            mediadesk_domain::MediadeskError::Network(message) => ChunkError::Retryable(message),
            other => ChunkError::Fatal(other.to_string()),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ChunkError::AuthExpired);
        }

        let body = response.text().await.unwrap_or_default();
        let message = ApiEnvelope::<()>::extract_message(&body)
            .unwrap_or_else(|| format!("chunk at offset {offset} returned status {status}"));

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(ChunkError::Retryable(message))
        } else {
            Err(ChunkError::Fatal(message))
        }
    }
}
