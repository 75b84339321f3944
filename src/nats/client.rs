use super::messages::{MediaFrameMessage, ANALYSIS_RESULTS_SUBJECT};
use crate::session::validate_session_id;
use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    /// Publish a candidate audio chunk for speech-to-text
    pub async fn publish_audio_chunk(
        &self,
        session_id: &str,
        bytes: &[u8],
        sequence: u64,
        captured_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        validate_session_id(session_id)?;
        let subject = format!("audio.frame.interview-{}", session_id);
        self.publish_frame(subject, session_id, bytes, sequence, captured_at)
            .await
            .context("Failed to publish audio chunk")
    }

    /// Publish a video frame for facial/pose analysis
    pub async fn publish_video_frame(
        &self,
        session_id: &str,
        bytes: &[u8],
        sequence: u64,
        captured_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        validate_session_id(session_id)?;
        let subject = format!("video.frame.interview-{}", session_id);
        self.publish_frame(subject, session_id, bytes, sequence, captured_at)
            .await
            .context("Failed to publish video frame")
    }

    async fn publish_frame(
        &self,
        subject: String,
        session_id: &str,
        bytes: &[u8],
        sequence: u64,
        captured_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let message = MediaFrameMessage {
            session_id: session_id.to_string(),
            sequence,
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            timestamp: captured_at.unwrap_or_else(Utc::now).to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client.publish(subject.clone(), payload.into()).await?;

        debug!(
            "Published frame to {} (sequence={}, bytes={})",
            subject,
            sequence,
            bytes.len()
        );

        Ok(())
    }

    /// Subscribe to analyzer results for all sessions
    pub async fn subscribe_results(&self) -> Result<async_nats::Subscriber> {
        // Analyzers publish to analysis.result.audio / analysis.result.video;
        // the session is identified in the payload
        info!("Subscribing to analysis results on {}", ANALYSIS_RESULTS_SUBJECT);

        let subscriber = self
            .client
            .subscribe(ANALYSIS_RESULTS_SUBJECT)
            .await
            .context("Failed to subscribe to analysis results")?;

        Ok(subscriber)
    }
}
