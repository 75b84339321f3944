//! Error types for interview sessions

use crate::session::{LifecycleInput, SessionState};
use thiserror::Error;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that affect transcript integrity or lifecycle state.
///
/// These are always reported to the caller (and, on the live channel, to the
/// originating client as an `error` event).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Lifecycle rule violated; the session is unchanged
    #[error("Invalid transition: cannot {input} while {from}")]
    InvalidTransition {
        from: SessionState,
        input: LifecycleInput,
    },

    /// Operation attempted on a terminal session
    #[error("Session is closed ({0})")]
    SessionClosed(SessionState),

    /// Unknown session id
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Storage failure; the transcript is left unmodified
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A session with this id is already scheduled (or has already finished)
    #[error("Session already exists: {0}")]
    DuplicateSession(String),

    /// Session ids are limited to ASCII letters, digits, `-` and `_`
    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    /// Scoring requested before the session completed
    #[error("Session is not complete ({0})")]
    IncompleteSession(SessionState),

    /// Weight map does not sum to 1.0
    #[error("Invalid score weights: {0}")]
    InvalidWeights(String),

    /// The session router has stopped and no longer accepts commands
    #[error("Session router unavailable: {0}")]
    RouterUnavailable(String),
}

impl SessionError {
    /// Stable machine-readable code used in outbound `error` events
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::InvalidTransition { .. } => "invalid_transition",
            SessionError::SessionClosed(_) => "session_closed",
            SessionError::SessionNotFound(_) => "session_not_found",
            SessionError::Persistence(_) => "persistence_error",
            SessionError::DuplicateSession(_) => "duplicate_session",
            SessionError::InvalidSessionId(_) => "invalid_session_id",
            SessionError::IncompleteSession(_) => "incomplete_session",
            SessionError::InvalidWeights(_) => "invalid_weights",
            SessionError::RouterUnavailable(_) => "router_unavailable",
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Persistence(err.to_string())
    }
}

/// Failure of the response provider. Recovered by the gateway with fallback text.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Response generation timed out after {0} ms")]
    Timeout(u64),

    #[error("Response generation failed: {0}")]
    Failure(String),
}

/// Failure of an external analyzer. Logged and dropped by signal ingest.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analyzer rejected payload: {0}")]
    Rejected(String),

    #[error("Analyzer transport error: {0}")]
    Transport(String),

    #[error("Invalid payload encoding: {0}")]
    Encoding(String),
}
