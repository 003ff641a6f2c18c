//! Request dispatcher with transparent token-refresh replay
//!
//! Wraps every outbound API call: attaches the current bearer token and a
//! correlation id, and on an authentication-failure status hands the
//! request to the refresh coordinator and replays it exactly once with the
//! token that refresh produced. A successful refresh is invisible to
//! callers.

use std::sync::Arc;
use std::time::Duration;

use mediadesk_domain::constants::REQUEST_ID_HEADER;
use mediadesk_domain::ApiEnvelope;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::auth::TokenProvider;
use super::errors::ApiError;
use super::request::ApiRequest;
use crate::http::HttpClient;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the admin API (e.g., "https://api.mediadesk.app/v1")
    pub base_url: String,
    /// Timeout for API requests
    pub timeout: Duration,
    /// Path of the refresh endpoint; requests to it never re-enter refresh
    pub refresh_path: String,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        let defaults = mediadesk_domain::ClientConfig::default();
        Self {
            base_url: defaults.api.base_url,
            timeout: Duration::from_secs(defaults.api.timeout_secs),
            refresh_path: defaults.auth.refresh_path,
        }
    }
}

/// API request dispatcher
pub struct ApiClient {
    http: Arc<HttpClient>,
    tokens: Arc<dyn TokenProvider>,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn new(config: ApiClientConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(3)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))?;

        Ok(Self { http: Arc::new(http), tokens, config })
    }

    /// Create a builder for fluent configuration.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// The token provider this client dispatches with.
    #[must_use]
    pub fn token_provider(&self) -> Arc<dyn TokenProvider> {
        self.tokens.clone()
    }

    /// The configured API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Send a request, transparently recovering from token expiry.
    ///
    /// All statuses other than the authentication failures pass through
    /// unchanged; use [`Self::execute`] or the typed helpers for envelope
    /// decoding and status mapping.
    ///
    /// # Errors
    /// Returns error on transport failure, timeout, or when the refresh
    /// triggered by an authentication failure fails.
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.config.base_url, request.path());
        let mut replayed = false;
        let mut token_override: Option<String> = None;

        loop {
            let mut builder = self
                .http
                .request(request.method().clone(), &url)
                .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

            let token = match token_override.clone() {
                Some(token) => Some(token),
                None => self.tokens.current_token().await,
            };
            if let Some(token) = token {
                builder = builder.bearer_auth(token);
            }

            if !request.query_params().is_empty() {
                builder = builder.query(request.query_params());
            }
            if let Some(body) = request.body() {
                builder = builder.json(body);
            }

            let response = match tokio::time::timeout(self.config.timeout, self.http.send(builder))
                .await
            {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => return Err(err.into()),
                Err(_) => return Err(ApiError::Timeout(self.config.timeout)),
            };

            let status = response.status();
            if Self::is_auth_failure(status)
                && !replayed
                && request.path() != self.config.refresh_path
            {
                debug!(%status, "request failed authentication, obtaining fresh token");
                replayed = true;
                let fresh = self.tokens.fresh_token().await?;
                token_override = Some(fresh);
                continue;
            }

            return Ok(response);
        }
    }

    /// Send a request and decode its envelope into `T`.
    ///
    /// # Errors
    /// Returns the mapped status error for non-success responses, or a
    /// client error when the envelope cannot be decoded or reports failure.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.send(&request).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(path = %request.path(), %status, "API request failed");
            return Err(map_status_error(status, request.path(), &body));
        }

        let result = decode_envelope(response).await?;
        info!(path = %request.path(), "API request successful");
        Ok(result)
    }

    /// Execute a GET request.
    ///
    /// # Errors
    /// See [`Self::execute`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::get(path)).await
    }

    /// Execute a POST request with a JSON body.
    ///
    /// # Errors
    /// See [`Self::execute`].
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    /// Execute a DELETE request.
    ///
    /// # Errors
    /// See [`Self::execute`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::delete(path)).await
    }

    fn is_auth_failure(status: StatusCode) -> bool {
        status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
    }
}

/// Map a non-success HTTP status onto the error taxonomy, preferring the
/// server's envelope message when the body carries one.
pub(crate) fn map_status_error(status: StatusCode, path: &str, body: &str) -> ApiError {
    let message = ApiEnvelope::<()>::extract_message(body)
        .unwrap_or_else(|| format!("{path} returned status {status}"));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ApiError::Auth(message)
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        ApiError::RateLimit(message)
    } else if status.is_server_error() {
        ApiError::Server(message)
    } else if status.is_client_error() {
        ApiError::Client(message)
    } else {
        ApiError::Network(message)
    }
}

/// Decode a success response's envelope into its payload.
pub(crate) async fn decode_envelope<T: DeserializeOwned>(
    response: Response,
) -> Result<T, ApiError> {
    let envelope: ApiEnvelope<T> = response
        .json()
        .await
        .map_err(|e| ApiError::Client(format!("Failed to parse response: {e}")))?;

    envelope.into_result().map_err(|e| ApiError::Client(e.to_string()))
}

/// Builder for the API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl ApiClientBuilder {
    /// Set the API configuration.
    #[must_use]
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the token provider.
    #[must_use]
    pub fn tokens(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Build the API client.
    ///
    /// # Errors
    /// Returns error if the token provider is missing or client creation
    /// fails.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let tokens =
            self.tokens.ok_or_else(|| ApiError::Config("Token provider not set".to_string()))?;

        ApiClient::new(config, tokens)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use mediadesk_common::auth::RefreshError;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Clone)]
    struct StaticTokens {
        token: String,
    }

    #[async_trait]
    impl TokenProvider for StaticTokens {
        async fn current_token(&self) -> Option<String> {
            Some(self.token.clone())
        }

        async fn fresh_token(&self) -> Result<String, RefreshError> {
            Err(RefreshError::Rejected("static provider cannot refresh".to_string()))
        }
    }

    /// Provider whose `fresh_token` rotates to a second token and counts
    /// refreshes.
    struct RotatingTokens {
        refreshes: AtomicUsize,
        stale: String,
        fresh: String,
    }

    impl RotatingTokens {
        fn new(stale: &str, fresh: &str) -> Self {
            Self {
                refreshes: AtomicUsize::new(0),
                stale: stale.to_string(),
                fresh: fresh.to_string(),
            }
        }
    }

    #[async_trait]
    impl TokenProvider for RotatingTokens {
        async fn current_token(&self) -> Option<String> {
            if self.refreshes.load(Ordering::SeqCst) == 0 {
                Some(self.stale.clone())
            } else {
                Some(self.fresh.clone())
            }
        }

        async fn fresh_token(&self) -> Result<String, RefreshError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(self.fresh.clone())
        }
    }

    #[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
    struct Article {
        title: String,
    }

    fn envelope(result: serde_json::Value) -> serde_json::Value {
        serde_json::json!({"errorCode": 0, "message": null, "result": result})
    }

    fn client_for(server: &MockServer, tokens: Arc<dyn TokenProvider>) -> ApiClient {
        let config = ApiClientConfig { base_url: server.uri(), ..Default::default() };
        ApiClient::new(config, tokens).unwrap()
    }

    #[tokio::test]
    async fn test_get_attaches_bearer_and_request_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/articles/1"))
            .and(header("Authorization", "Bearer t1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(envelope(serde_json::json!({"title": "hello"}))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(StaticTokens { token: "t1".to_string() }));

        let article: Article = client.get("/articles/1").await.unwrap();
        assert_eq!(article.title, "hello");

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_401_triggers_refresh_and_single_replay() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/articles"))
            .and(header("Authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/articles"))
            .and(header("Authorization", "Bearer fresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(envelope(serde_json::json!({"title": "replayed"}))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tokens = Arc::new(RotatingTokens::new("stale", "fresh"));
        let client = client_for(&server, tokens.clone());

        let article: Article = client.get("/articles").await.unwrap();
        assert_eq!(article.title, "replayed");
        assert_eq!(tokens.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_replayed_request_is_not_replayed_again() {
        let server = MockServer::start().await;

        // 401 regardless of token: the replay must not loop
        Mock::given(method("GET"))
            .and(path("/articles"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let tokens = Arc::new(RotatingTokens::new("stale", "fresh"));
        let client = client_for(&server, tokens.clone());

        let result: Result<Article, ApiError> = client.get("/articles").await;
        assert!(matches!(result.unwrap_err(), ApiError::Auth(_)));
        assert_eq!(tokens.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_path_never_reenters_refresh() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = Arc::new(RotatingTokens::new("stale", "fresh"));
        let client = client_for(&server, tokens.clone());

        let result: Result<Article, ApiError> =
            client.execute(ApiRequest::post("/auth/refresh")).await;

        assert!(matches!(result.unwrap_err(), ApiError::Auth(_)));
        assert_eq!(tokens.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/articles"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(StaticTokens { token: "stale".to_string() }));

        let result: Result<Article, ApiError> = client.get("/articles").await;
        assert!(matches!(result.unwrap_err(), ApiError::Auth(_)));
    }

    #[tokio::test]
    async fn test_other_statuses_pass_through() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(
                serde_json::json!({"errorCode": 40, "message": "no such article"}),
            ))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(StaticTokens { token: "t1".to_string() }));

        let result: Result<Article, ApiError> = client.get("/missing").await;
        match result.unwrap_err() {
            ApiError::Client(message) => assert!(message.contains("no such article")),
            other => panic!("expected client error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_envelope_failure_on_http_200() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/articles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"errorCode": 7, "message": "board archived"}),
            ))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(StaticTokens { token: "t1".to_string() }));

        let result: Result<Article, ApiError> = client.get("/articles").await;
        match result.unwrap_err() {
            ApiError::Client(message) => assert!(message.contains("board archived")),
            other => panic!("expected client error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_builder_requires_token_provider() {
        assert!(ApiClient::builder().build().is_err());

        let client = ApiClient::builder()
            .tokens(Arc::new(StaticTokens { token: "t1".to_string() }))
            .build();
        assert!(client.is_ok());
    }
}
