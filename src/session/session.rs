use super::config::{Capabilities, SessionConfig};
use super::state::{LifecycleInput, SessionState, Transition};
use super::stats::{ConnectionLogEntry, SessionStats};
use crate::error::{Result, SessionError};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// One interview instance and its lifecycle state machine.
///
/// Owned exclusively by its session router; every mutation goes through the
/// transition methods below, which either apply the change completely or
/// return an error without touching any field.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    connection_log: Vec<ConnectionLogEntry>,
}

impl Session {
    /// Create a new session in the `scheduled` state
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Scheduled,
            started_at: None,
            ended_at: None,
            connection_log: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn capabilities(&self) -> Capabilities {
        self.config.capabilities
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn connection_log(&self) -> &[ConnectionLogEntry] {
        &self.connection_log
    }

    /// scheduled → invited
    pub fn invite(&mut self) -> Result<Transition> {
        self.reject_if_terminal()?;
        match self.state {
            SessionState::Scheduled => Ok(self.apply(SessionState::Invited)),
            from => Err(SessionError::InvalidTransition {
                from,
                input: LifecycleInput::Invite,
            }),
        }
    }

    /// scheduled/invited → in_progress
    pub fn start(&mut self) -> Result<Transition> {
        self.reject_if_terminal()?;
        if !self.state.is_pre_start() {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                input: LifecycleInput::Start,
            });
        }

        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        Ok(self.apply(SessionState::InProgress))
    }

    /// Any non-terminal state → completed. A repeated `end` on a completed
    /// session is a no-op.
    pub fn end(&mut self) -> Result<Transition> {
        if self.state == SessionState::Completed {
            debug!("Session {} already completed, ignoring end", self.id());
            return Ok(Transition::Unchanged);
        }
        self.reject_if_terminal()?;

        self.mark_ended();
        Ok(self.apply(SessionState::Completed))
    }

    /// Any non-terminal state → cancelled. Repeating it is a no-op.
    pub fn cancel(&mut self) -> Result<Transition> {
        if self.state == SessionState::Cancelled {
            return Ok(Transition::Unchanged);
        }
        self.reject_if_terminal()?;

        self.mark_ended();
        Ok(self.apply(SessionState::Cancelled))
    }

    /// scheduled/invited → no_show
    pub fn mark_no_show(&mut self) -> Result<Transition> {
        self.reject_if_terminal()?;
        if !self.state.is_pre_start() {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                input: LifecycleInput::NoShow,
            });
        }

        self.mark_ended();
        Ok(self.apply(SessionState::NoShow))
    }

    /// Check that candidate messages may be appended right now
    pub fn ensure_accepting_messages(&self) -> Result<()> {
        self.reject_if_terminal()?;
        if self.state != SessionState::InProgress {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                input: LifecycleInput::Message,
            });
        }
        Ok(())
    }

    /// Append a connection-quality ping to the session's log
    pub fn log_connection(&mut self, status: String, quality: Option<serde_json::Value>) {
        self.connection_log.push(ConnectionLogEntry {
            timestamp: Utc::now(),
            status,
            quality,
        });
    }

    /// Snapshot for status queries
    pub fn stats(&self, attached_clients: usize) -> SessionStats {
        let duration_secs = match self.started_at {
            Some(started) => {
                let until = self.ended_at.unwrap_or_else(Utc::now);
                until.signed_duration_since(started).num_milliseconds() as f64 / 1000.0
            }
            None => 0.0,
        };

        SessionStats {
            session_id: self.config.session_id.clone(),
            state: self.state,
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration_secs,
            duration_minutes: self.config.duration_minutes,
            capabilities: self.config.capabilities,
            attached_clients,
            connection_events: self.connection_log.len(),
        }
    }

    fn reject_if_terminal(&self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(SessionError::SessionClosed(self.state));
        }
        Ok(())
    }

    fn mark_ended(&mut self) {
        if self.ended_at.is_none() {
            let now = Utc::now();
            // Keep ended_at >= started_at even if the wall clock stepped back
            self.ended_at = Some(match self.started_at {
                Some(started) if started > now => started,
                _ => now,
            });
        }
    }

    fn apply(&mut self, to: SessionState) -> Transition {
        let from = self.state;
        self.state = to;
        info!("Session {}: {} -> {}", self.id(), from, to);
        Transition::Applied { from, to }
    }
}
