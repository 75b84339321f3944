use super::analyzer::{AnalysisJob, Analyzer};
use super::event::SignalClass;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Configuration for signal ingest
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Pending jobs before new media is dropped
    pub queue_capacity: usize,
    /// Upper bound on a single analyzer submission
    pub submit_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            submit_timeout: Duration::from_secs(5),
        }
    }
}

/// Non-blocking handoff of audio/video payloads to an analyzer.
///
/// `submit` never waits: a full queue or a stopped worker drops the payload
/// with a warning, so media ingest can never stall a session's message flow.
#[derive(Clone)]
pub struct SignalIngest {
    tx: mpsc::Sender<IngestCommand>,
}

enum IngestCommand {
    Job(PendingJob),
    /// The session is gone; drop its sequence counter
    Forget(String),
}

struct PendingJob {
    session_id: String,
    class: SignalClass,
    bytes: Vec<u8>,
    client_timestamp: Option<DateTime<Utc>>,
}

impl SignalIngest {
    /// Spawn the ingest worker for `analyzer`
    pub fn spawn(analyzer: Arc<dyn Analyzer>, config: IngestConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<IngestCommand>(config.queue_capacity.max(1));

        tokio::spawn(async move {
            info!("Signal ingest worker started ({})", analyzer.name());

            let mut sequences: HashMap<String, u64> = HashMap::new();

            while let Some(command) = rx.recv().await {
                let pending = match command {
                    IngestCommand::Job(pending) => pending,
                    IngestCommand::Forget(session_id) => {
                        if sequences.remove(&session_id).is_some() {
                            debug!("Released ingest state for session {}", session_id);
                        }
                        continue;
                    }
                };

                let sequence = sequences.entry(pending.session_id.clone()).or_insert(0);
                let job = AnalysisJob {
                    session_id: pending.session_id,
                    class: pending.class,
                    bytes: pending.bytes,
                    sequence: *sequence,
                    client_timestamp: pending.client_timestamp,
                };
                *sequence += 1;

                let session_id = job.session_id.clone();
                match timeout(config.submit_timeout, analyzer.submit(job)).await {
                    Ok(Ok(())) => debug!("Submitted {:?} for session {}", pending.class, session_id),
                    Ok(Err(e)) => warn!("Analysis failed for session {}: {}", session_id, e),
                    Err(_) => warn!(
                        "Analyzer {} timed out after {:?} for session {}",
                        analyzer.name(),
                        config.submit_timeout,
                        session_id
                    ),
                }
            }

            info!("Signal ingest worker stopped");
        });

        Self { tx }
    }

    /// Queue a payload for analysis. Returns whether it was accepted.
    pub fn submit(
        &self,
        session_id: &str,
        class: SignalClass,
        bytes: Vec<u8>,
        client_timestamp: Option<DateTime<Utc>>,
    ) -> bool {
        let job = PendingJob {
            session_id: session_id.to_string(),
            class,
            bytes,
            client_timestamp,
        };

        match self.tx.try_send(IngestCommand::Job(job)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Signal ingest queue full, dropping {:?} for session {}", class, session_id);
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Signal ingest stopped, dropping {:?} for session {}", class, session_id);
                false
            }
        }
    }

    /// Release per-session state once a session's router has stopped.
    ///
    /// Queued behind any payloads already submitted for the session.
    pub async fn forget(&self, session_id: &str) {
        if self
            .tx
            .send(IngestCommand::Forget(session_id.to_string()))
            .await
            .is_err()
        {
            debug!("Signal ingest stopped, nothing to release for {}", session_id);
        }
    }
}
