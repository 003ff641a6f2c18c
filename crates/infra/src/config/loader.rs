//! Configuration loader
//!
//! Builds a [`ClientConfig`] from defaults, environment variables, or a
//! config file.
//!
//! ## Loading Strategy
//! 1. Start from the built-in defaults
//! 2. Overlay any `MEDIADESK_*` environment variables that are set
//! 3. `load_from_file` reads a complete config from JSON or TOML instead
//!
//! ## Environment Variables
//! - `MEDIADESK_API_BASE_URL`: API base URL
//! - `MEDIADESK_API_TIMEOUT_SECS`: request timeout in seconds
//! - `MEDIADESK_MAX_REFRESH_RETRIES`: refresh failure budget
//! - `MEDIADESK_UPLOAD_CHUNK_BYTES`: upload chunk size in bytes
//! - `MEDIADESK_UPLOAD_MAX_BYTES`: upload size ceiling in bytes
//! - `MEDIADESK_UPLOAD_CHUNK_TIMEOUT_SECS`: per-chunk timeout in seconds

use std::path::Path;
use std::str::FromStr;

use mediadesk_domain::{ClientConfig, MediadeskError, Result};

/// Load configuration: defaults overlaid with environment variables.
///
/// # Errors
/// Returns `MediadeskError::Config` if a set variable has an invalid value.
pub fn load() -> Result<ClientConfig> {
    let config = load_from_env()?;
    tracing::info!(base_url = %config.api.base_url, "configuration loaded");
    Ok(config)
}

/// Load configuration from environment variables on top of the defaults.
///
/// Unset variables keep their default values; set variables must parse.
///
/// # Errors
/// Returns `MediadeskError::Config` on an unparsable value.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::default();

    if let Ok(base_url) = std::env::var("MEDIADESK_API_BASE_URL") {
        config.api.base_url = base_url;
    }
    if let Some(timeout) = env_parsed::<u64>("MEDIADESK_API_TIMEOUT_SECS")? {
        config.api.timeout_secs = timeout;
    }
    if let Some(retries) = env_parsed::<u32>("MEDIADESK_MAX_REFRESH_RETRIES")? {
        config.auth.max_refresh_retries = retries;
    }
    if let Some(chunk) = env_parsed::<u64>("MEDIADESK_UPLOAD_CHUNK_BYTES")? {
        config.upload.chunk_bytes = chunk;
    }
    if let Some(ceiling) = env_parsed::<u64>("MEDIADESK_UPLOAD_MAX_BYTES")? {
        config.upload.max_file_bytes = ceiling;
    }
    if let Some(timeout) = env_parsed::<u64>("MEDIADESK_UPLOAD_CHUNK_TIMEOUT_SECS")? {
        config.upload.chunk_timeout_secs = timeout;
    }

    Ok(config)
}

/// Load a complete configuration from a JSON or TOML file (detected by
/// extension).
///
/// # Errors
/// Returns `MediadeskError::Config` if the file cannot be read or parsed.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<ClientConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| MediadeskError::Config(format!("cannot read {}: {e}", path.display())))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&raw)
            .map_err(|e| MediadeskError::Config(format!("invalid JSON config: {e}"))),
        Some("toml") => toml::from_str(&raw)
            .map_err(|e| MediadeskError::Config(format!("invalid TOML config: {e}"))),
        other => Err(MediadeskError::Config(format!(
            "unsupported config extension {other:?} for {}",
            path.display()
        ))),
    }
}

fn env_parsed<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| MediadeskError::Config(format!("invalid value for {name}: {e}"))),
        Err(_) => Ok(None),
    }
}
