//! Credential store implementations
//!
//! Two backends: an in-memory store (process lifetime; also the test
//! double) and a platform-keychain store. Both persist the whole
//! credential set as one unit so a partial write can never leave a token
//! pair half-rotated.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::traits::{CredentialStore, StoreError};
use super::types::Credentials;

/// In-memory credential store
///
/// Credentials live for the lifetime of the process. This is the default
/// backend for headless runs and the store used throughout the test
/// suites.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<Credentials>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a store that already holds credentials.
    #[must_use]
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self { inner: RwLock::new(Some(credentials)) }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credentials>, StoreError> {
        Ok(self.inner.read().await.clone())
    }

    async fn store(&self, credentials: &Credentials) -> Result<(), StoreError> {
        *self.inner.write().await = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.inner.write().await = None;
        Ok(())
    }
}

/// Platform-keychain credential store
///
/// Persists the credential set in the system keychain (macOS Keychain,
/// Windows Credential Manager, Linux Secret Service) under a single
/// account entry, serialized as JSON. The keyring API is blocking, so
/// every call is pushed onto the blocking pool.
pub struct KeyringCredentialStore {
    service: String,
    account: String,
}

impl KeyringCredentialStore {
    /// Create a store bound to a keychain service/account pair
    /// (e.g., `"Mediadesk"` / `"main"`).
    #[must_use]
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self { service: service.into(), account: account.into() }
    }

    fn entry(&self) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn load(&self) -> Result<Option<Credentials>, StoreError> {
        let entry = self.entry()?;
        let secret = tokio::task::spawn_blocking(move || entry.get_password())
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        match secret {
            Ok(raw) => {
                let credentials = serde_json::from_str(&raw)
                    .map_err(|e| StoreError::Corrupted(e.to_string()))?;
                Ok(Some(credentials))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }

    async fn store(&self, credentials: &Credentials) -> Result<(), StoreError> {
        let raw = serde_json::to_string(credentials)
            .map_err(|e| StoreError::Corrupted(e.to_string()))?;
        let entry = self.entry()?;

        debug!(service = %self.service, account = %self.account, "storing credentials");

        tokio::task::spawn_blocking(move || entry.set_password(&raw))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let entry = self.entry()?;

        debug!(service = %self.service, account = %self.account, "clearing credentials");

        let outcome = tokio::task::spawn_blocking(move || entry.delete_credential())
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        match outcome {
            // Clearing an empty store is a no-op, not an error
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }
}
