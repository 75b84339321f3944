use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    Interviewer,
    Candidate,
}

/// What a message is within the interview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Question,
    Answer,
    Followup,
    System,
}

/// A message as stored in the transcript.
///
/// Immutable once appended; `sequence` and `timestamp` are assigned by the
/// transcript store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub session_id: String,
    pub sender: SenderRole,
    pub kind: MessageKind,
    pub content: String,

    /// Question this message answers or follows up on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<Uuid>,

    /// 1-based, strictly increasing and gap-free per session
    pub sequence: u64,

    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_ref: Option<String>,

    /// Speech-to-text confidence (0.0 to 1.0) for voice answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription_confidence: Option<f32>,

    /// Upstream score for this message (0-10), if it was evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Per-dimension scores keyed by dimension name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub score_breakdown: BTreeMap<String, f64>,
}

/// Message content submitted for appending; the store fills in identity,
/// sequence and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftMessage {
    pub sender: SenderRole,
    pub kind: MessageKind,
    pub content: String,
    pub question_id: Option<Uuid>,
    pub audio_ref: Option<String>,
    pub transcription_confidence: Option<f32>,
    pub score: Option<f64>,
    pub score_breakdown: BTreeMap<String, f64>,
}

impl DraftMessage {
    pub fn new(sender: SenderRole, kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            sender,
            kind,
            content: content.into(),
            question_id: None,
            audio_ref: None,
            transcription_confidence: None,
            score: None,
            score_breakdown: BTreeMap::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(SenderRole::Interviewer, MessageKind::System, content)
    }

    pub fn answer(content: impl Into<String>) -> Self {
        Self::new(SenderRole::Candidate, MessageKind::Answer, content)
    }

    pub fn followup(content: impl Into<String>) -> Self {
        Self::new(SenderRole::Interviewer, MessageKind::Followup, content)
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_breakdown(mut self, dimension: impl Into<String>, score: f64) -> Self {
        self.score_breakdown.insert(dimension.into(), score);
        self
    }

    pub fn with_question(mut self, question_id: Uuid) -> Self {
        self.question_id = Some(question_id);
        self
    }

    /// Finalize into a stored message
    pub(crate) fn into_message(self, session_id: &str, sequence: u64) -> Message {
        Message {
            id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            sender: self.sender,
            kind: self.kind,
            content: self.content,
            question_id: self.question_id,
            sequence,
            timestamp: Utc::now(),
            audio_ref: self.audio_ref,
            transcription_confidence: self.transcription_confidence,
            score: self.score,
            score_breakdown: self.score_breakdown,
        }
    }
}
