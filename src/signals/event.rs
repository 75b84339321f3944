use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Source of a signal event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalClass {
    Audio,
    Video,
    Connection,
}

/// A timestamped unit of derived audio/video/connection data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub id: Uuid,
    pub session_id: String,
    pub class: SignalClass,

    /// When the result was recorded
    pub timestamp: DateTime<Utc>,

    /// Capture time reported by the client, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<DateTime<Utc>>,

    /// Opaque analyzer output
    pub payload: Value,

    /// Engagement contribution (0.0 to 1.0), video only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<f64>,

    /// Confidence contribution (0.0 to 1.0): body-language confidence for
    /// video, transcription confidence for audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl SignalEvent {
    pub fn new(session_id: impl Into<String>, class: SignalClass, payload: Value) -> Self {
        let (engagement, confidence) = match class {
            SignalClass::Video => (derive_engagement(&payload), body_confidence(&payload)),
            SignalClass::Audio => (None, number_at(&payload, &["confidence"])),
            SignalClass::Connection => (None, None),
        };

        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            class,
            timestamp: Utc::now(),
            client_timestamp: None,
            payload,
            engagement,
            confidence,
        }
    }

    pub fn with_client_timestamp(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.client_timestamp = at;
        self
    }
}

/// Engagement score from a frame analysis payload.
///
/// Uses the analyzer's own `engagement_score` when present; otherwise scores
/// eye contact (0.3), a positive emotion (0.2), an attentive posture (0.2)
/// and 0.3 × body confidence, capped at 1.0. Returns `None` when neither a
/// face nor a pose was detected.
pub fn derive_engagement(payload: &Value) -> Option<f64> {
    if let Some(score) = number_at(payload, &["engagement_score"]) {
        return Some(score.clamp(0.0, 1.0));
    }

    let face_detected = bool_at(payload, &["facial_analysis", "face_detected"]);
    let pose_detected = bool_at(payload, &["body_analysis", "pose_detected"]);
    if !face_detected && !pose_detected {
        return None;
    }

    let mut score = 0.0;

    if face_detected {
        if bool_at(payload, &["facial_analysis", "eye_contact"]) {
            score += 0.3;
        }
        if let Some(emotion) = str_at(payload, &["facial_analysis", "emotion"]) {
            if matches!(emotion, "happy" | "focused" | "engaged") {
                score += 0.2;
            }
        }
    }

    if pose_detected {
        if let Some(posture) = str_at(payload, &["body_analysis", "posture"]) {
            if matches!(posture, "upright" | "leaning_forward") {
                score += 0.2;
            }
        }
        score += number_at(payload, &["body_analysis", "confidence_level"]).unwrap_or(0.0) * 0.3;
    }

    Some(f64::min(score, 1.0))
}

fn body_confidence(payload: &Value) -> Option<f64> {
    if !bool_at(payload, &["body_analysis", "pose_detected"]) {
        return None;
    }
    number_at(payload, &["body_analysis", "confidence_level"])
}

pub(crate) fn value_at<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(payload, |v, key| v.get(*key))
}

pub(crate) fn number_at(payload: &Value, path: &[&str]) -> Option<f64> {
    value_at(payload, path).and_then(Value::as_f64)
}

pub(crate) fn str_at<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a str> {
    value_at(payload, path).and_then(Value::as_str)
}

fn bool_at(payload: &Value, path: &[&str]) -> bool {
    value_at(payload, path).and_then(Value::as_bool).unwrap_or(false)
}
