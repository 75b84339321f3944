use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::Capabilities;
use super::state::SessionState;

/// Point-in-time view of a session, served to HTTP callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// Current lifecycle state
    pub state: SessionState,

    /// When the interview started, if it has
    pub started_at: Option<DateTime<Utc>>,

    /// When the interview reached a terminal state, if it has
    pub ended_at: Option<DateTime<Utc>>,

    /// Elapsed interview time in seconds (0 before start)
    pub duration_secs: f64,

    /// Configured interview length
    pub duration_minutes: u32,

    pub capabilities: Capabilities,

    /// Number of clients attached to the live channel
    pub attached_clients: usize,

    /// Number of connection-quality entries recorded
    pub connection_events: usize,
}

/// One connection-quality ping from a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub status: String,
    /// Free-form quality indicator as reported by the client (label or number)
    pub quality: Option<serde_json::Value>,
}
