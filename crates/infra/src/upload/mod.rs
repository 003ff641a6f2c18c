//! Chunked upload pipeline for large media payloads
//!
//! A payload is transferred in fixed-size sequential chunks against a
//! server-negotiated session, then finalized into a playable artifact.
//! Chunk-level transport failures are retried on a fixed backoff schedule;
//! an authentication expiry mid-transfer aborts the session, refreshes the
//! token through the coordinator, and restarts a fresh session from byte
//! zero. The wire protocol could resume from the last accepted offset; the
//! deployed ingest service only honors whole-session restarts, so that is
//! what the manager does.

pub mod errors;
pub mod finalizer;
pub mod manager;
pub mod progress;
pub mod source;
pub mod types;

pub use errors::UploadError;
pub use finalizer::CompletionFinalizer;
pub use manager::UploadManager;
pub use progress::ProgressReporter;
pub use source::{ChunkSource, FileChunkSource, MemoryChunkSource};
pub use types::{SessionLocator, UploadSession, UploadState};
