//! Traits for credential storage and the refresh transport
//!
//! These traits are the injection seams of the auth layer: the coordinator
//! is generic over both so tests construct it with in-memory mocks.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{Credentials, RefreshResult};

/// Error type for credential store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend rejected the operation
    #[error("Credential store backend error: {0}")]
    Backend(String),

    /// Stored data could not be decoded
    #[error("Stored credentials are corrupted: {0}")]
    Corrupted(String),
}

/// Error type for refresh operations
///
/// Cloneable so a single refresh failure can be fanned out to every caller
/// parked on the in-flight refresh.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// The refresh endpoint rejected the call
    #[error("Refresh rejected: {0}")]
    Rejected(String),

    /// Refresh retries are exhausted; the session is gone and the user
    /// must authenticate again
    #[error("Session invalid: re-authentication required")]
    SessionInvalid,

    /// The refresh call never reached the server, or the response was
    /// unreadable
    #[error("Network error during refresh: {0}")]
    Network(String),

    /// No credentials are stored
    #[error("Not authenticated (no stored credentials)")]
    NotAuthenticated,

    /// The credential store failed mid-refresh
    #[error("Credential store error: {0}")]
    Store(String),
}

impl RefreshError {
    /// Whether this failure counts against the bounded refresh budget.
    ///
    /// Only outcomes of an actual refresh call are counted; a missing
    /// credential set or a broken store never made one.
    #[must_use]
    pub fn counts_against_budget(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::Network(_))
    }
}

/// Durable storage for the credential set
///
/// The store is process-wide shared state. The refresh coordinator is its
/// sole writer; everything else only reads.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the stored credential set, if any.
    ///
    /// # Errors
    /// Returns error if the backend fails; a missing credential set is
    /// `Ok(None)`.
    async fn load(&self) -> Result<Option<Credentials>, StoreError>;

    /// Replace the stored credential set atomically.
    ///
    /// # Errors
    /// Returns error if the backend rejects the write.
    async fn store(&self, credentials: &Credentials) -> Result<(), StoreError>;

    /// Remove every stored credential (logout, refresh exhaustion).
    ///
    /// # Errors
    /// Returns error if the backend rejects the deletion.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Transport performing the actual refresh call
///
/// Implementations make exactly one network attempt per invocation; the
/// coordinator owns the retry budget.
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    /// Exchange the current token pair for a fresh one.
    ///
    /// # Arguments
    /// * `access_token` - current (possibly expired) access token, sent as
    ///   the bearer credential
    /// * `refresh_token` - current refresh token, sent in the request body
    ///
    /// # Errors
    /// Returns [`RefreshError::Rejected`] when the server declines the
    /// exchange and [`RefreshError::Network`] when the call fails before a
    /// decodable response arrives.
    async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<RefreshResult, RefreshError>;
}
