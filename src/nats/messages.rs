use crate::signals::{SignalClass, SignalEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subject analyzers publish their results to
pub const ANALYSIS_RESULTS_SUBJECT: &str = "analysis.result.>";

/// Audio chunk or video frame published to NATS
#[derive(Debug, Serialize, Deserialize)]
pub struct MediaFrameMessage {
    pub session_id: String,
    pub sequence: u64,
    pub data: String, // Base64-encoded payload
    pub timestamp: String, // RFC3339 capture time
}

/// Analysis result received from an analyzer service
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResultMessage {
    pub session_id: String,
    pub class: SignalClass,
    /// RFC3339 capture time of the analyzed media
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Analyzer output (transcript/confidence for audio, facial and body analysis for video)
    pub payload: serde_json::Value,
}

impl AnalysisResultMessage {
    /// Convert into a signal event, deriving engagement/confidence contributions
    pub fn into_event(self) -> SignalEvent {
        let captured_at = self
            .timestamp
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));

        SignalEvent::new(self.session_id, self.class, self.payload).with_client_timestamp(captured_at)
    }
}
