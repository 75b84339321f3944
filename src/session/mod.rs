//! Interview session lifecycle
//!
//! This module provides the `Session` abstraction that manages:
//! - Lifecycle state transitions (scheduled → invited → in_progress → completed)
//! - Side exits to cancelled and no_show
//! - Start/end timestamps and the connection-quality log
//! - Per-session configuration (duration, capabilities, weights, context)

mod config;
mod session;
mod state;
mod stats;

pub use config::{
    validate_session_id, Capabilities, Difficulty, DifficultySetting, InterviewContext,
    SessionConfig, MAX_SESSION_ID_LEN,
};
pub use session::Session;
pub use state::{LifecycleInput, SessionState, Transition};
pub use stats::{ConnectionLogEntry, SessionStats};
