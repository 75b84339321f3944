use crate::session::validate_session_id;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Candidate audio format expected on the live channel
pub const RECORDING_SAMPLE_RATE: u32 = 16000;
pub const RECORDING_CHANNELS: u16 = 1;

/// Metadata for a finished recording
#[derive(Debug, Clone)]
pub struct RecordingMetadata {
    pub file_path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    /// Number of samples written
    pub sample_count: usize,
    /// Number of audio chunks received
    pub chunks: usize,
}

impl RecordingMetadata {
    pub fn duration_secs(&self) -> f64 {
        self.sample_count as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}

/// Writes one session's candidate audio to `<dir>/<session>-audio.wav`
///
/// Chunks arrive as 16-bit little-endian PCM bytes. A trailing odd byte is
/// dropped.
pub struct AudioRecorder {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    metadata: RecordingMetadata,
}

impl AudioRecorder {
    pub fn create(output_dir: &Path, session_id: &str) -> Result<Self> {
        validate_session_id(session_id)?;
        fs::create_dir_all(output_dir).context("Failed to create recordings directory")?;

        let file_path = output_dir.join(format!("{}-audio.wav", session_id));
        let spec = hound::WavSpec {
            channels: RECORDING_CHANNELS,
            sample_rate: RECORDING_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&file_path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", file_path))?;

        info!("Recording session {} to {:?}", session_id, file_path);

        Ok(Self {
            writer: Some(writer),
            metadata: RecordingMetadata {
                file_path,
                sample_rate: RECORDING_SAMPLE_RATE,
                channels: RECORDING_CHANNELS,
                sample_count: 0,
                chunks: 0,
            },
        })
    }

    pub fn path(&self) -> &Path {
        &self.metadata.file_path
    }

    pub fn write_chunk(&mut self, pcm: &[u8]) -> Result<()> {
        if let Some(writer) = &mut self.writer {
            for pair in pcm.chunks_exact(2) {
                writer
                    .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                    .context("Failed to write sample to WAV")?;
            }

            self.metadata.sample_count += pcm.len() / 2;
            self.metadata.chunks += 1;
        }

        Ok(())
    }

    pub fn finish(mut self) -> Result<RecordingMetadata> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().context("Failed to finalize WAV file")?;
        }

        info!(
            "Recording complete: {:?} ({:.1}s, {} chunks)",
            self.metadata.file_path,
            self.metadata.duration_secs(),
            self.metadata.chunks
        );

        Ok(self.metadata.clone())
    }
}

impl Drop for AudioRecorder {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}
