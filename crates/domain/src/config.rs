//! Configuration structures
//!
//! Pure data; loading lives in `mediadesk-infra::config`.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the admin API (e.g., "https://api.mediadesk.app/v1")
    pub base_url: String,
    /// Timeout for ordinary API requests, in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: "https://api.mediadesk.app/v1".to_string(), timeout_secs: 30 }
    }
}

/// Token refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Path of the refresh endpoint, relative to the API base URL
    pub refresh_path: String,
    /// Consecutive refresh failures tolerated before the session is
    /// declared invalid
    pub max_refresh_retries: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            refresh_path: constants::REFRESH_PATH.to_string(),
            max_refresh_retries: constants::MAX_REFRESH_RETRIES,
        }
    }
}

/// Upload pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Fixed chunk size in bytes; only the final chunk may be smaller
    pub chunk_bytes: u64,
    /// Hard ceiling on payload size, checked before any network call
    pub max_file_bytes: u64,
    /// Per-chunk request timeout, in seconds
    pub chunk_timeout_secs: u64,
    /// Content types accepted by the pipeline
    pub allowed_types: Vec<String>,
    /// Delay schedule between chunk retries, in seconds
    pub backoff_secs: Vec<u64>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: constants::UPLOAD_CHUNK_BYTES,
            max_file_bytes: constants::MAX_UPLOAD_BYTES,
            chunk_timeout_secs: 120,
            allowed_types: constants::ALLOWED_UPLOAD_TYPES
                .iter()
                .map(ToString::to_string)
                .collect(),
            backoff_secs: constants::CHUNK_BACKOFF_SECS.to_vec(),
        }
    }
}

/// Root configuration for the client core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}
