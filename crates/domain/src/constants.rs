//! Client-core constants
//!
//! Centralized location for the fixed bounds of the dispatch and upload
//! layer.

// Token lifecycle
pub const ACCESS_TOKEN_TTL_SECS: i64 = 86_400; // 1 day
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 86_400; // 7 days
pub const MAX_REFRESH_RETRIES: u32 = 3;

// Wire protocol
pub const ENVELOPE_SUCCESS_CODE: i32 = 0;
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// Upload protocol
pub const UPLOAD_CHUNK_BYTES: u64 = 5 * 1024 * 1024; // 5 MiB
pub const MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024 * 1024; // 2 GiB
pub const UPLOAD_SESSIONS_PATH: &str = "/uploads/sessions";

/// Delay schedule applied between chunk retries, in seconds.
/// The first retry is immediate; the last delay is the final attempt.
pub const CHUNK_BACKOFF_SECS: &[u64] = &[0, 3, 5, 10, 20];

/// Content types accepted by the upload pipeline.
pub const ALLOWED_UPLOAD_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-ms-wmv",
    "video/webm",
    "video/x-matroska",
];
