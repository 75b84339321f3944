use super::event::{SignalClass, SignalEvent};
use super::log::SignalLog;
use crate::error::AnalysisError;
use crate::nats::{AnalysisResultMessage, NatsClient};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use std::sync::Arc;
use tracing::{info, warn};

/// Raw media handed to an analyzer
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub session_id: String,
    pub class: SignalClass,
    pub bytes: Vec<u8>,
    /// Per-session submission counter assigned by the ingest worker
    pub sequence: u64,
    pub client_timestamp: Option<DateTime<Utc>>,
}

/// External media analyzer (speech-to-text, facial/pose classifiers)
///
/// `submit` only hands the job over. Results are recorded into the
/// `SignalLog` asynchronously, never returned to the caller.
///
/// Implementations:
/// - `NatsAnalyzer`: publishes frames to NATS, consumes `analysis.result.>`
/// - `LocalAnalyzer`: records a receipt signal without external analysis
#[async_trait::async_trait]
pub trait Analyzer: Send + Sync {
    async fn submit(&self, job: AnalysisJob) -> std::result::Result<(), AnalysisError>;

    /// Analyzer name for logging
    fn name(&self) -> &str;
}

/// Analyzer used when no external broker is configured.
///
/// Records one signal per submission carrying only the payload size, so the
/// signal log reflects what was received.
pub struct LocalAnalyzer {
    log: SignalLog,
}

impl LocalAnalyzer {
    pub fn new(log: SignalLog) -> Self {
        Self { log }
    }
}

#[async_trait::async_trait]
impl Analyzer for LocalAnalyzer {
    async fn submit(&self, job: AnalysisJob) -> std::result::Result<(), AnalysisError> {
        let payload = serde_json::json!({
            "bytes": job.bytes.len(),
            "sequence": job.sequence,
            "analyzed": false,
        });
        let event = SignalEvent::new(job.session_id, job.class, payload)
            .with_client_timestamp(job.client_timestamp);
        self.log.record(event).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Analyzer backed by NATS pub/sub
pub struct NatsAnalyzer {
    client: Arc<NatsClient>,
}

impl NatsAnalyzer {
    /// Connect and start forwarding analysis results into `log`
    pub async fn connect(url: &str, log: SignalLog) -> Result<Self> {
        let client = Arc::new(
            NatsClient::connect(url)
                .await
                .context("Failed to connect to NATS")?,
        );

        let mut results = client
            .subscribe_results()
            .await
            .context("Failed to subscribe to analysis results")?;

        tokio::spawn(async move {
            info!("Analysis result listener started");

            while let Some(msg) = results.next().await {
                match serde_json::from_slice::<AnalysisResultMessage>(&msg.payload) {
                    Ok(result) => log.record(result.into_event()).await,
                    Err(e) => warn!("Failed to parse analysis result: {}", e),
                }
            }

            info!("Analysis result listener stopped");
        });

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Analyzer for NatsAnalyzer {
    async fn submit(&self, job: AnalysisJob) -> std::result::Result<(), AnalysisError> {
        let published = match job.class {
            SignalClass::Audio => {
                self.client
                    .publish_audio_chunk(&job.session_id, &job.bytes, job.sequence, job.client_timestamp)
                    .await
            }
            SignalClass::Video => {
                self.client
                    .publish_video_frame(&job.session_id, &job.bytes, job.sequence, job.client_timestamp)
                    .await
            }
            SignalClass::Connection => {
                return Err(AnalysisError::Rejected(
                    "connection events are not analyzed".to_string(),
                ))
            }
        };

        published.map_err(|e| AnalysisError::Transport(format!("{:#}", e)))
    }

    fn name(&self) -> &str {
        "nats"
    }
}
