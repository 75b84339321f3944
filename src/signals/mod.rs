//! Multimodal signal ingest
//!
//! Audio chunks and video frames are handed to an external analyzer without
//! blocking the session; analyzer results arrive later as `SignalEvent`s in
//! the `SignalLog`, which the score aggregator summarizes at session end.

mod analyzer;
mod event;
mod ingest;
mod log;
mod summary;

pub use analyzer::{AnalysisJob, Analyzer, LocalAnalyzer, NatsAnalyzer};
pub use event::{derive_engagement, SignalClass, SignalEvent};
pub use ingest::{IngestConfig, SignalIngest};
pub use log::SignalLog;
pub use summary::SignalSummary;

pub(crate) use summary::round2;
