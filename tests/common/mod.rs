// Shared fixtures for router and HTTP tests

#![allow(dead_code)]

use interview_orchestrator::error::{GenerationError, SessionError};
use interview_orchestrator::gateway::{ResponseGateway, ResponseGenerator, SessionContext};
use interview_orchestrator::router::{OutboundEvent, RouterDeps, RouterSettings, SessionRegistry};
use interview_orchestrator::signals::{IngestConfig, LocalAnalyzer, SignalLog};
use interview_orchestrator::transcript::{
    DraftMessage, InMemoryTranscriptStore, Message, TranscriptStore,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Replies with a fixed follow-up, optionally after a delay
pub struct FixedGenerator {
    pub reply: String,
    pub delay: Duration,
}

impl FixedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(reply: &str, delay: Duration) -> Self {
        Self {
            reply: reply.to_string(),
            delay,
        }
    }
}

#[async_trait::async_trait]
impl ResponseGenerator for FixedGenerator {
    async fn generate(
        &self,
        _context: &SessionContext,
        _latest: &Message,
    ) -> Result<String, GenerationError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// In-memory store whose appends and reads can be made to fail on demand
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryTranscriptStore,
    pub fail_appends: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl FlakyStore {
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl TranscriptStore for FlakyStore {
    async fn register(&self, session_id: &str) -> Result<(), SessionError> {
        self.inner.register(session_id).await
    }

    async fn append(&self, session_id: &str, draft: DraftMessage) -> Result<Message, SessionError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(SessionError::Persistence("disk full".to_string()));
        }
        self.inner.append(session_id, draft).await
    }

    async fn list(&self, session_id: &str) -> Result<Vec<Message>, SessionError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SessionError::Persistence("read failed".to_string()));
        }
        self.inner.list(session_id).await
    }
}

pub fn deps_with(generator: Arc<dyn ResponseGenerator>, settings: RouterSettings) -> RouterDeps {
    deps_with_store(Arc::new(InMemoryTranscriptStore::new()), generator, settings)
}

pub fn deps_with_store(
    transcripts: Arc<dyn TranscriptStore>,
    generator: Arc<dyn ResponseGenerator>,
    settings: RouterSettings,
) -> RouterDeps {
    let signals = SignalLog::new();
    let analyzer = Arc::new(LocalAnalyzer::new(signals.clone()));
    let gateway = ResponseGateway::new(generator, Duration::from_millis(100));

    RouterDeps::new(
        transcripts,
        gateway,
        signals,
        analyzer,
        IngestConfig::default(),
        settings,
    )
}

pub fn registry() -> SessionRegistry {
    SessionRegistry::new(deps_with(
        Arc::new(FixedGenerator::new("Follow-up question?")),
        RouterSettings::default(),
    ))
}

/// Everything currently buffered for a client
pub fn drain(events: &mut mpsc::Receiver<OutboundEvent>) -> Vec<OutboundEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

pub fn event_types(events: &[OutboundEvent]) -> Vec<&'static str> {
    events
        .iter()
        .map(|event| match event {
            OutboundEvent::ConnectionEstablished { .. } => "connection_established",
            OutboundEvent::InterviewStarted { .. } => "interview_started",
            OutboundEvent::Message { .. } => "message",
            OutboundEvent::InterviewEnded { .. } => "interview_ended",
            OutboundEvent::InterviewCancelled { .. } => "interview_cancelled",
            OutboundEvent::AudioProcessed { .. } => "audio_processed",
            OutboundEvent::VideoProcessed { .. } => "video_processed",
            OutboundEvent::Error { .. } => "error",
        })
        .collect()
}
