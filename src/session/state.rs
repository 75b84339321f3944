use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an interview session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Scheduled,
    Invited,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl SessionState {
    /// `completed`, `cancelled` and `no_show` accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Cancelled | SessionState::NoShow
        )
    }

    /// Scheduled or invited: the interview has not begun yet
    pub fn is_pre_start(&self) -> bool {
        matches!(self, SessionState::Scheduled | SessionState::Invited)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Scheduled => "scheduled",
            SessionState::Invited => "invited",
            SessionState::InProgress => "in_progress",
            SessionState::Completed => "completed",
            SessionState::Cancelled => "cancelled",
            SessionState::NoShow => "no_show",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs accepted by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleInput {
    Invite,
    Start,
    End,
    Cancel,
    NoShow,
    /// Not a transition: appending a candidate message requires `in_progress`
    Message,
}

impl fmt::Display for LifecycleInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleInput::Invite => "invite",
            LifecycleInput::Start => "start",
            LifecycleInput::End => "end",
            LifecycleInput::Cancel => "cancel",
            LifecycleInput::NoShow => "mark no_show",
            LifecycleInput::Message => "accept messages",
        };
        f.write_str(s)
    }
}

/// Outcome of an accepted transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State changed
    Applied {
        from: SessionState,
        to: SessionState,
    },
    /// Repeated terminal request (`end` after completion, `cancel` after
    /// cancellation); nothing changed
    Unchanged,
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}
