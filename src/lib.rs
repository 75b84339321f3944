pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod nats;
pub mod recording;
pub mod router;
pub mod scoring;
pub mod session;
pub mod signals;
pub mod transcript;

pub use config::Config;
pub use error::{AnalysisError, GenerationError, SessionError};
pub use gateway::{ChatCompletionGenerator, ResponseGateway, ResponseGenerator, ScriptedGenerator};
pub use http::{create_router, AppState};
pub use nats::{AnalysisResultMessage, MediaFrameMessage, NatsClient};
pub use recording::{AudioRecorder, RecordingMetadata};
pub use router::{
    InboundEvent, OutboundEvent, RouterDeps, RouterHandle, RouterSettings, SessionRegistry,
};
pub use scoring::{Dimension, Recommendation, Score, ScoreAggregator, ScoreStore};
pub use session::{Session, SessionConfig, SessionState, SessionStats};
pub use signals::{Analyzer, LocalAnalyzer, NatsAnalyzer, SignalEvent, SignalLog, SignalSummary};
pub use transcript::{
    InMemoryTranscriptStore, JsonlTranscriptStore, Message, TranscriptStore,
};
