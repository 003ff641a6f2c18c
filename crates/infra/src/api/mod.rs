//! API request dispatcher for the Mediadesk client core
//!
//! Every outbound call goes through [`ApiClient`]: it attaches the current
//! bearer token, and when a call comes back 401/403 it hands the failure to
//! the refresh coordinator and replays the original request exactly once
//! with the token that refresh produced. Requests already replayed, or
//! addressed to the refresh endpoint itself, never re-enter refresh.

pub mod auth;
pub mod client;
pub mod errors;
pub mod request;

pub use auth::TokenProvider;
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig};
pub use errors::{ApiError, ApiErrorCategory};
pub use request::ApiRequest;
