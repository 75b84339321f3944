pub mod client;
pub mod messages;

pub use client::NatsClient;
pub use messages::{AnalysisResultMessage, MediaFrameMessage, ANALYSIS_RESULTS_SUBJECT};
