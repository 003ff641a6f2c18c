//! Token access for the dispatcher
//!
//! The dispatcher needs two things from the auth layer: the current access
//! token, and a way to obtain a fresh one through the single-flight
//! coordinator. [`TokenProvider`] abstracts both so tests can drive the
//! dispatcher with scripted tokens.

use async_trait::async_trait;
use mediadesk_common::auth::{
    CredentialStore, RefreshCoordinator, RefreshError, RefreshTransport,
};

/// Trait for providing access tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, if any, without forcing a refresh.
    async fn current_token(&self) -> Option<String>;

    /// Obtain a fresh token, coordinating with any refresh already in
    /// flight.
    ///
    /// # Errors
    /// Propagates the coordinator's refresh failure.
    async fn fresh_token(&self) -> Result<String, RefreshError>;
}

#[async_trait]
impl<T, S> TokenProvider for RefreshCoordinator<T, S>
where
    T: RefreshTransport + 'static,
    S: CredentialStore + 'static,
{
    async fn current_token(&self) -> Option<String> {
        self.current_access_token().await
    }

    async fn fresh_token(&self) -> Result<String, RefreshError> {
        self.obtain_fresh_token().await
    }
}
