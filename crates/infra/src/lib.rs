//! # Mediadesk Infrastructure
//!
//! Network-facing implementations for the Mediadesk client core.
//!
//! This crate contains:
//! - The retrying HTTP client wrapper
//! - The request dispatcher (`ApiClient`) with transparent token-refresh
//!   replay
//! - The chunked upload pipeline and its completion finalizer
//! - The configuration loader
//!
//! ## Architecture
//! - Builds on the auth and resilience layers in `mediadesk-common`
//! - Contains all "impure" code (network and filesystem I/O)

pub mod api;
pub mod config;
pub mod http;
pub mod upload;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientConfig, ApiError, ApiRequest, TokenProvider};
pub use http::HttpClient;
pub use upload::{
    ChunkSource, CompletionFinalizer, FileChunkSource, MemoryChunkSource, UploadError,
    UploadManager, UploadSession, UploadState,
};
