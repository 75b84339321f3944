use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SessionError};
use crate::scoring::Dimension;

/// Longest accepted session id
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Check that a session id is safe to use as a file name and a NATS subject token.
///
/// Accepts 1 to `MAX_SESSION_ID_LEN` ASCII letters, digits, `-` or `_`.
pub fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

    if valid {
        Ok(())
    } else {
        Err(SessionError::InvalidSessionId(session_id.to_string()))
    }
}

/// Configuration for a scheduled interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "interview-<uuid>")
    pub session_id: String,

    /// Planned interview length
    /// Default: 60 minutes
    pub duration_minutes: u32,

    /// Which optional capabilities are enabled for this session
    #[serde(default)]
    pub capabilities: Capabilities,

    /// Score weights (dimension → weight). Default weights are used when absent.
    #[serde(default)]
    pub weights: Option<BTreeMap<Dimension, f64>>,

    /// Job and candidate data supplied by the CRUD layer
    #[serde(default)]
    pub context: InterviewContext,

    /// Requested difficulty (`auto` resolves from experience years)
    #[serde(default)]
    pub difficulty: DifficultySetting,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("interview-{}", uuid::Uuid::new_v4()),
            duration_minutes: 60,
            capabilities: Capabilities::default(),
            weights: None,
            context: InterviewContext::default(),
            difficulty: DifficultySetting::Auto,
        }
    }
}

impl SessionConfig {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Self::default()
        }
    }

    /// Difficulty after resolving `auto` against the candidate's experience
    pub fn resolved_difficulty(&self) -> Difficulty {
        match self.difficulty {
            DifficultySetting::Easy => Difficulty::Easy,
            DifficultySetting::Medium => Difficulty::Medium,
            DifficultySetting::Hard => Difficulty::Hard,
            DifficultySetting::Auto => Difficulty::from_experience(self.context.experience_years),
        }
    }
}

/// Optional per-session capabilities
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Capabilities {
    /// Forward video frames to the analyzer
    pub video_analysis: bool,

    /// Write candidate audio to a WAV file
    pub recording: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            video_analysis: true,
            recording: true,
        }
    }
}

/// Read-only job/candidate context fetched from the external CRUD layer
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InterviewContext {
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub candidate_skills: Vec<String>,
    #[serde(default)]
    pub experience_years: f64,
    #[serde(default)]
    pub current_title: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DifficultySetting {
    Easy,
    Medium,
    Hard,
    #[default]
    Auto,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// `< 2` years → easy, `< 5` → medium, otherwise hard
    pub fn from_experience(years: f64) -> Self {
        if years < 2.0 {
            Difficulty::Easy
        } else if years < 5.0 {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}
