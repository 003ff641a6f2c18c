//! Single-flight refresh coordinator
//!
//! Ensures at most one token refresh is ever in flight. Callers that hit
//! an authentication failure while a refresh is already running are parked
//! on oneshot channels and released together when it settles, every one of
//! them with the token produced by that refresh, never a different one.
//!
//! Consecutive refresh-call failures are counted against a fixed budget;
//! exhausting it clears the stored credentials and publishes a
//! process-wide [`SessionEvent::SessionInvalid`] so the UI layer can send
//! the user back to login.

use std::sync::Arc;

use tokio::sync::{broadcast, oneshot, Mutex};
use tracing::{debug, info, instrument, warn};

use super::traits::{CredentialStore, RefreshError, RefreshTransport};
use super::types::Credentials;

/// Process-wide authentication events published by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The refresh budget is exhausted; stored credentials were cleared and
    /// the user must authenticate again.
    SessionInvalid,
}

/// Mutable refresh state, guarded by one mutex.
///
/// `in_progress` is true only for the window bounding exactly one network
/// call. `retry_count` is compared against the budget only when a refresh
/// call fails, and resets to zero on any success.
struct RefreshState {
    in_progress: bool,
    retry_count: u32,
    waiters: Vec<oneshot::Sender<Result<String, RefreshError>>>,
}

/// Single-flight token refresh coordinator
///
/// Generic over the refresh transport and the credential store so tests
/// construct it fresh with in-memory mocks. The coordinator is the sole
/// writer of the credential store.
pub struct RefreshCoordinator<T, S> {
    transport: Arc<T>,
    store: Arc<S>,
    max_retries: u32,
    state: Mutex<RefreshState>,
    session_events: broadcast::Sender<SessionEvent>,
}

impl<T, S> RefreshCoordinator<T, S>
where
    T: RefreshTransport,
    S: CredentialStore,
{
    /// Create a new coordinator.
    ///
    /// # Arguments
    /// * `transport` - performs the actual refresh call (one attempt each)
    /// * `store` - credential persistence backend
    /// * `max_retries` - consecutive refresh failures tolerated before the
    ///   session is declared invalid
    #[must_use]
    pub fn new(transport: T, store: Arc<S>, max_retries: u32) -> Self {
        let (session_events, _) = broadcast::channel(16);
        Self {
            transport: Arc::new(transport),
            store,
            max_retries: max_retries.max(1),
            state: Mutex::new(RefreshState {
                in_progress: false,
                retry_count: 0,
                waiters: Vec::new(),
            }),
            session_events,
        }
    }

    /// Obtain a fresh access token, coordinating with any refresh already
    /// in flight.
    ///
    /// If a refresh is running, the caller suspends until it settles and
    /// shares its outcome. Otherwise this call performs exactly one
    /// refresh round-trip.
    ///
    /// # Errors
    /// Returns the refresh failure, or [`RefreshError::SessionInvalid`]
    /// once the retry budget is exhausted.
    #[instrument(skip(self))]
    pub async fn obtain_fresh_token(&self) -> Result<String, RefreshError> {
        let waiter = {
            let mut state = self.state.lock().await;
            if state.in_progress {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.in_progress = true;
                None
            }
        };

        if let Some(rx) = waiter {
            debug!("refresh already in flight, waiting for it to settle");
            return match rx.await {
                Ok(outcome) => outcome,
                Err(_) => Err(RefreshError::Network("in-flight refresh was dropped".to_string())),
            };
        }

        let outcome = self.run_refresh().await;
        self.settle(outcome).await
    }

    /// Perform the single refresh round-trip and persist the rotated
    /// credential set.
    async fn run_refresh(&self) -> Result<String, RefreshError> {
        let current = self
            .store
            .load()
            .await
            .map_err(|e| RefreshError::Store(e.to_string()))?
            .ok_or(RefreshError::NotAuthenticated)?;

        let refreshed =
            self.transport.refresh(&current.access_token, &current.refresh_token).await?;

        let next: Credentials = refreshed.into();
        let token = next.access_token.clone();

        self.store.store(&next).await.map_err(|e| RefreshError::Store(e.to_string()))?;

        info!("access token refreshed");
        Ok(token)
    }

    /// Fold the refresh outcome into the state machine and release every
    /// parked caller with it.
    async fn settle(&self, outcome: Result<String, RefreshError>) -> Result<String, RefreshError> {
        let mut state = self.state.lock().await;

        let outcome = match outcome {
            Ok(token) => {
                state.retry_count = 0;
                Ok(token)
            }
            Err(err) if err.counts_against_budget() => {
                state.retry_count += 1;
                if state.retry_count >= self.max_retries {
                    state.retry_count = 0;
                    if let Err(store_err) = self.store.clear().await {
                        warn!(error = %store_err, "failed to clear credentials after refresh exhaustion");
                    }
                    warn!(max_retries = self.max_retries, "refresh budget exhausted, session is invalid");
                    let _ = self.session_events.send(SessionEvent::SessionInvalid);
                    Err(RefreshError::SessionInvalid)
                } else {
                    debug!(retry_count = state.retry_count, "refresh failed, budget remaining");
                    Err(err)
                }
            }
            Err(err) => Err(err),
        };

        state.in_progress = false;
        let waiters = std::mem::take(&mut state.waiters);
        drop(state);

        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }

        outcome
    }

    /// Current access token, if any, without forcing a refresh.
    pub async fn current_access_token(&self) -> Option<String> {
        self.store.load().await.ok().flatten().map(|c| c.access_token)
    }

    /// Current credential set, if any.
    pub async fn current_credentials(&self) -> Option<Credentials> {
        self.store.load().await.ok().flatten()
    }

    /// Check if credentials are stored.
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.store.load().await, Ok(Some(_)))
    }

    /// Store a fresh credential set after an out-of-band login and reset
    /// the refresh budget.
    ///
    /// # Errors
    /// Returns [`RefreshError::Store`] if persistence fails.
    pub async fn login(&self, credentials: Credentials) -> Result<(), RefreshError> {
        self.store.store(&credentials).await.map_err(|e| RefreshError::Store(e.to_string()))?;
        self.state.lock().await.retry_count = 0;
        info!(user = %credentials.user.login_id, "credentials stored");
        Ok(())
    }

    /// Clear every stored credential and reset the refresh budget.
    ///
    /// # Errors
    /// Returns [`RefreshError::Store`] if the backend rejects the deletion.
    pub async fn logout(&self) -> Result<(), RefreshError> {
        self.store.clear().await.map_err(|e| RefreshError::Store(e.to_string()))?;
        self.state.lock().await.retry_count = 0;
        info!("credentials cleared (logged out)");
        Ok(())
    }

    /// Subscribe to session events (currently only
    /// [`SessionEvent::SessionInvalid`]).
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session_events.subscribe()
    }

    /// The configured refresh budget.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl<T, S> std::fmt::Debug for RefreshCoordinator<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator").field("max_retries", &self.max_retries).finish()
    }
}
