//! Interview audio recording (WAV)

mod recorder;

pub use recorder::{AudioRecorder, RecordingMetadata, RECORDING_CHANNELS, RECORDING_SAMPLE_RATE};
