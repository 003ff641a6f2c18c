//! Upload session state
//!
//! A session moves `Created → Uploading → {Completed | Aborted | Failed}`.
//! `Paused` is reachable from `Uploading` and may resume. Terminal states
//! are never left; a restart after an auth abort is a *new* session, not a
//! resurrected one.

use serde::Deserialize;
use tracing::warn;

/// Lifecycle of one upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Created,
    Uploading,
    Paused,
    Completed,
    Aborted,
    Failed,
}

impl UploadState {
    /// Whether the session can move from `self` to `next`.
    #[must_use]
    pub fn can_transition(self, next: Self) -> bool {
        use UploadState::{Aborted, Completed, Created, Failed, Paused, Uploading};
        matches!(
            (self, next),
            (Created, Uploading)
                | (Created, Aborted)
                | (Uploading, Paused | Completed | Aborted | Failed)
                | (Paused, Uploading | Aborted)
        )
    }

    /// Terminal states are never left.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Failed)
    }
}

/// Session identifiers negotiated with the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLocator {
    /// Opaque key naming the session on the API (used by the finalizer)
    pub session_key: String,
    /// Absolute URL chunk requests are addressed to
    pub upload_url: String,
}

/// One upload session's book-keeping.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub session_key: String,
    pub upload_url: String,
    pub total_bytes: u64,
    pub bytes_uploaded: u64,
    state: UploadState,
}

impl UploadSession {
    #[must_use]
    pub fn new(locator: SessionLocator, total_bytes: u64) -> Self {
        Self {
            session_key: locator.session_key,
            upload_url: locator.upload_url,
            total_bytes,
            bytes_uploaded: 0,
            state: UploadState::Created,
        }
    }

    #[must_use]
    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Advance the state machine. Invalid transitions are refused and
    /// logged; they indicate a pipeline bug, not a recoverable condition.
    pub fn advance(&mut self, next: UploadState) -> bool {
        if self.state.can_transition(next) {
            self.state = next;
            true
        } else {
            warn!(from = ?self.state, to = ?next, session_key = %self.session_key, "refused invalid session transition");
            false
        }
    }

    /// Whether every byte of the payload has been accepted.
    #[must_use]
    pub fn is_fully_transferred(&self) -> bool {
        self.bytes_uploaded == self.total_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> UploadSession {
        UploadSession::new(
            SessionLocator {
                session_key: "s-1".to_string(),
                upload_url: "https://upload.example/s-1".to_string(),
            },
            100,
        )
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut session = session();
        assert_eq!(session.state(), UploadState::Created);
        assert!(session.advance(UploadState::Uploading));
        assert!(session.advance(UploadState::Completed));
        assert!(session.state().is_terminal());
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        for terminal in [UploadState::Completed, UploadState::Aborted, UploadState::Failed] {
            let mut session = session();
            session.advance(UploadState::Uploading);
            assert!(session.advance(terminal));

            for next in [
                UploadState::Created,
                UploadState::Uploading,
                UploadState::Paused,
                UploadState::Completed,
                UploadState::Aborted,
                UploadState::Failed,
            ] {
                assert!(!session.advance(next), "{terminal:?} must not reach {next:?}");
            }
            assert_eq!(session.state(), terminal);
        }
    }

    #[test]
    fn test_pause_and_resume() {
        let mut session = session();
        session.advance(UploadState::Uploading);
        assert!(session.advance(UploadState::Paused));
        assert!(session.advance(UploadState::Uploading));
        assert!(session.advance(UploadState::Aborted));
    }

    #[test]
    fn test_created_cannot_complete_directly() {
        let mut session = session();
        assert!(!session.advance(UploadState::Completed));
        assert!(!session.advance(UploadState::Failed));
        assert_eq!(session.state(), UploadState::Created);
    }

    #[test]
    fn test_full_transfer_accounting() {
        let mut session = session();
        assert!(!session.is_fully_transferred());
        session.bytes_uploaded = 100;
        assert!(session.is_fully_transferred());
    }
}
