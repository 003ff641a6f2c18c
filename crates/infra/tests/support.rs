//! Shared helpers for infra integration tests.

use std::sync::Arc;
use std::time::Duration;

use mediadesk_common::auth::{
    Credentials, MemoryCredentialStore, RefreshClient, RefreshCoordinator,
};
use mediadesk_domain::UserProfile;
use mediadesk_infra::{ApiClient, ApiClientConfig};
use once_cell::sync::Lazy;
use wiremock::MockServer;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
});

/// Initialize test tracing once per process.
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

pub fn test_user() -> UserProfile {
    UserProfile {
        id: "u-1".to_string(),
        login_id: "editor".to_string(),
        display_name: "Editor".to_string(),
    }
}

/// Credentials whose access token the mock servers treat as expired.
pub fn stale_credentials() -> Credentials {
    Credentials::new("stale-access".to_string(), "refresh-1".to_string(), test_user())
}

/// Success envelope for the refresh endpoint.
pub fn refresh_success_body(access: &str) -> serde_json::Value {
    serde_json::json!({
        "errorCode": 0,
        "message": null,
        "result": {
            "accessToken": access,
            "refreshToken": "refresh-2",
            "user": {"id": "u-1", "loginId": "editor", "displayName": "Editor"}
        }
    })
}

/// Wrap a payload in the standard response envelope.
pub fn envelope(result: serde_json::Value) -> serde_json::Value {
    serde_json::json!({"errorCode": 0, "message": null, "result": result})
}

pub type TestCoordinator = RefreshCoordinator<RefreshClient, MemoryCredentialStore>;

/// Full client stack (memory store → refresh client → coordinator →
/// dispatcher) pointed at a mock server.
pub fn client_stack(
    server: &MockServer,
    credentials: Credentials,
    max_retries: u32,
) -> (Arc<ApiClient>, Arc<TestCoordinator>, Arc<MemoryCredentialStore>) {
    init_tracing();

    let store = Arc::new(MemoryCredentialStore::with_credentials(credentials));
    let refresh = RefreshClient::new(&server.uri(), "/auth/refresh", Duration::from_secs(5));
    let coordinator = Arc::new(RefreshCoordinator::new(refresh, store.clone(), max_retries));

    let config = ApiClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(10),
        refresh_path: "/auth/refresh".to_string(),
    };
    let api = Arc::new(ApiClient::new(config, coordinator.clone()).unwrap());

    (api, coordinator, store)
}
