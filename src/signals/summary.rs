use super::event::{number_at, str_at, SignalClass, SignalEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate view of a session's signal events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    /// Mean engagement over analyzed frames (0.0 to 1.0)
    pub overall_engagement: Option<f64>,

    /// Mean body-language confidence over frames with a detected pose
    pub confidence: Option<f64>,

    /// Mean professionalism rating, when the analyzer reports one
    pub professionalism: Option<f64>,

    /// Mean speech-to-text confidence over audio chunks
    pub transcription_confidence: Option<f64>,

    /// Most frequent facial emotion (ties resolved alphabetically)
    pub dominant_emotion: Option<String>,

    pub frames_analyzed: usize,
    pub audio_chunks: usize,
}

impl SignalSummary {
    /// Summarize events in log order. Same input always yields the same output.
    pub fn from_events(events: &[SignalEvent]) -> Self {
        let video: Vec<&SignalEvent> = events
            .iter()
            .filter(|e| e.class == SignalClass::Video)
            .collect();
        let audio: Vec<&SignalEvent> = events
            .iter()
            .filter(|e| e.class == SignalClass::Audio)
            .collect();

        let mut emotions: BTreeMap<&str, usize> = BTreeMap::new();
        for event in &video {
            let face = event.payload.get("facial_analysis");
            let detected = face
                .and_then(|f| f.get("face_detected"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if detected {
                if let Some(emotion) = str_at(&event.payload, &["facial_analysis", "emotion"]) {
                    *emotions.entry(emotion).or_default() += 1;
                }
            }
        }

        // BTreeMap iterates alphabetically; keep the first maximum
        let dominant_emotion = emotions
            .iter()
            .fold(None::<(&str, usize)>, |best, (emotion, count)| match best {
                Some((_, best_count)) if best_count >= *count => best,
                _ => Some((emotion, *count)),
            })
            .map(|(emotion, _)| emotion.to_string());

        Self {
            overall_engagement: mean(video.iter().filter_map(|e| e.engagement)),
            confidence: mean(video.iter().filter_map(|e| e.confidence)),
            professionalism: mean(
                video
                    .iter()
                    .filter_map(|e| number_at(&e.payload, &["professionalism"])),
            ),
            transcription_confidence: mean(audio.iter().filter_map(|e| e.confidence)),
            dominant_emotion,
            frames_analyzed: video.len(),
            audio_chunks: audio.len(),
        }
    }
}

/// Mean rounded to two decimals, `None` for an empty input
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    Some(round2(sum / count as f64))
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
