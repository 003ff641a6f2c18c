//! Integration tests for the auth layer: the refresh coordinator driving
//! the real HTTP refresh client against a mock server.

use std::sync::Arc;
use std::time::Duration;

use mediadesk_common::auth::{
    Credentials, MemoryCredentialStore, RefreshClient, RefreshCoordinator, RefreshError,
    SessionEvent,
};
use mediadesk_domain::UserProfile;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_user() -> UserProfile {
    UserProfile {
        id: "u-1".to_string(),
        login_id: "editor".to_string(),
        display_name: "Editor".to_string(),
    }
}

fn stale_credentials() -> Credentials {
    Credentials::new("stale-access".to_string(), "refresh-1".to_string(), test_user())
}

fn refresh_success_body(access: &str) -> serde_json::Value {
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

fn coordinator_for(
    server: &MockServer,
    store: Arc<MemoryCredentialStore>,
    max_retries: u32,
) -> Arc<RefreshCoordinator<RefreshClient, MemoryCredentialStore>> {
    let client = RefreshClient::new(&server.uri(), "/auth/refresh", Duration::from_secs(5));
    Arc::new(RefreshCoordinator::new(client, store, max_retries))
}

#[tokio::test]
async fn concurrent_callers_observe_a_single_refresh_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("Authorization", "Bearer stale-access"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(refresh_success_body("fresh-access"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::with_credentials(stale_credentials()));
    let coordinator = coordinator_for(&server, store.clone(), 3);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.obtain_fresh_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "fresh-access");
    }

    // The stored credential set rotated exactly once
    let stored = coordinator.current_credentials().await.unwrap();
    assert_eq!(stored.access_token, "fresh-access");
    assert_eq!(stored.refresh_token, "refresh-2");
}

#[tokio::test]
async fn repeated_refresh_failures_invalidate_the_session_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            serde_json::json!({"errorCode": 4010, "message": "refresh token revoked"}),
        ))
        .expect(3)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::with_credentials(stale_credentials()));
    let coordinator = coordinator_for(&server, store.clone(), 3);
    let mut events = coordinator.subscribe();

    for _ in 0..2 {
        assert!(matches!(
            coordinator.obtain_fresh_token().await,
            Err(RefreshError::Rejected(_))
        ));
    }
    assert_eq!(coordinator.obtain_fresh_token().await, Err(RefreshError::SessionInvalid));

    // Credentials cleared; further attempts short-circuit without a call
    assert!(!coordinator.is_authenticated().await);
    assert_eq!(coordinator.obtain_fresh_token().await, Err(RefreshError::NotAuthenticated));

    // The global signal fired exactly once
    assert_eq!(events.recv().await.unwrap(), SessionEvent::SessionInvalid);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn success_resets_the_failure_budget() {
    let server = MockServer::start().await;

    // Two failures, then a success, then two more failures: the budget of
    // three is never exhausted because the success resets it.
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_success_body("fresh-access")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::with_credentials(stale_credentials()));
    let coordinator = coordinator_for(&server, store, 3);

    assert!(coordinator.obtain_fresh_token().await.is_err());
    assert!(coordinator.obtain_fresh_token().await.is_err());
    assert_eq!(coordinator.obtain_fresh_token().await.unwrap(), "fresh-access");

    // Two more failures: still below the (reset) budget
    assert!(matches!(
        coordinator.obtain_fresh_token().await,
        Err(RefreshError::Rejected(_))
    ));
    assert!(matches!(
        coordinator.obtain_fresh_token().await,
        Err(RefreshError::Rejected(_))
    ));
    assert!(coordinator.is_authenticated().await);
}
