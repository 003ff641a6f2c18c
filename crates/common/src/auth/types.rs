//! Credential types
//!
//! [`Credentials`] is the unit of persistence: both tokens and the user
//! snapshot are written together after a login or refresh and invalidated
//! together on logout or refresh exhaustion.

use chrono::{DateTime, Utc};
use mediadesk_domain::constants::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};
use mediadesk_domain::UserProfile;
use serde::{Deserialize, Serialize};

/// Bearer credentials with metadata
///
/// Absolute expiration timestamps are computed at creation time from the
/// fixed token TTLs (access: 1 day, refresh: 7 days).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Access token attached as a bearer credential to every API call
    pub access_token: String,

    /// Refresh token exchanged for a new token pair when the access token
    /// expires
    pub refresh_token: String,

    /// Identity snapshot of the signed-in user
    pub user: UserProfile,

    /// Absolute access-token expiration (UTC)
    pub access_expires_at: DateTime<Utc>,

    /// Absolute refresh-token expiration (UTC)
    pub refresh_expires_at: DateTime<Utc>,
}

impl Credentials {
    /// Create a credential set with expirations derived from the fixed TTLs.
    #[must_use]
    pub fn new(access_token: String, refresh_token: String, user: UserProfile) -> Self {
        let now = Utc::now();
        Self {
            access_token,
            refresh_token,
            user,
            access_expires_at: now + chrono::Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            refresh_expires_at: now + chrono::Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        }
    }

    /// Check if the access token is expired or will expire within the given
    /// threshold.
    #[must_use]
    pub fn is_access_expired(&self, threshold_seconds: i64) -> bool {
        Utc::now() + chrono::Duration::seconds(threshold_seconds) >= self.access_expires_at
    }

    /// Check if the refresh token itself has lapsed (a refresh attempt with
    /// it can only fail).
    #[must_use]
    pub fn is_refresh_expired(&self) -> bool {
        Utc::now() >= self.refresh_expires_at
    }

    /// Seconds remaining before the access token expires (negative once
    /// past expiry).
    #[must_use]
    pub fn seconds_until_access_expiry(&self) -> i64 {
        (self.access_expires_at - Utc::now()).num_seconds()
    }
}

/// Payload of a successful refresh call (the `result` field of the
/// response envelope).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResult {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

impl From<RefreshResult> for Credentials {
    fn from(result: RefreshResult) -> Self {
        Self::new(result.access_token, result.refresh_token, result.user)
    }
}
