use crate::transcript::{Message, SenderRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events a client sends on the live channel.
///
/// Unknown `type` values deserialize to `Unknown` and are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    StartInterview,
    EndInterview,
    CandidateMessage {
        #[serde(default)]
        content: String,
    },
    AudioData {
        /// Base64-encoded 16-bit LE PCM
        #[serde(alias = "audio", alias = "bytes")]
        data: String,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    VideoFrame {
        /// Base64-encoded frame
        #[serde(alias = "frame", alias = "bytes")]
        data: String,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    ConnectionStatus {
        status: String,
        #[serde(default)]
        quality: Option<serde_json::Value>,
    },
    #[serde(other)]
    Unknown,
}

impl InboundEvent {
    /// Parse a text frame; malformed JSON is treated like an unknown event
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or(InboundEvent::Unknown)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::StartInterview => "start_interview",
            InboundEvent::EndInterview => "end_interview",
            InboundEvent::CandidateMessage { .. } => "candidate_message",
            InboundEvent::AudioData { .. } => "audio_data",
            InboundEvent::VideoFrame { .. } => "video_frame",
            InboundEvent::ConnectionStatus { .. } => "connection_status",
            InboundEvent::Unknown => "unknown",
        }
    }
}

/// Events delivered to attached clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    ConnectionEstablished {
        session_id: String,
        message: String,
    },
    InterviewStarted {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Message {
        sender: SenderRole,
        content: String,
        message_id: Uuid,
        sequence: u64,
        timestamp: DateTime<Utc>,
    },
    InterviewEnded {
        message: String,
    },
    InterviewCancelled {
        message: String,
    },
    AudioProcessed {
        status: String,
    },
    VideoProcessed {
        status: String,
    },
    /// Rejection sent only to the client whose event failed
    Error {
        code: String,
        message: String,
    },
}

impl From<&Message> for OutboundEvent {
    fn from(message: &Message) -> Self {
        OutboundEvent::Message {
            sender: message.sender,
            content: message.content.clone(),
            message_id: message.id,
            sequence: message.sequence,
            timestamp: message.timestamp,
        }
    }
}
