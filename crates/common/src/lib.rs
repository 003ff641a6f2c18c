//! # Mediadesk Common
//!
//! Shared infrastructure for the Mediadesk client core:
//! - `auth`: credential storage, the refresh wire client, and the
//!   single-flight refresh coordinator
//! - `resilience`: the fixed-schedule retry primitive used by the upload
//!   pipeline
//!
//! ## Architecture
//! - Depends only on `mediadesk-domain` internally
//! - Every external seam (credential store, refresh transport) is a trait
//!   so components can be constructed fresh per test with mocks

pub mod auth;
pub mod resilience;
