use super::score::{default_weights, Dimension, QuestionScore, Recommendation, Score};
use super::store::ScoreStore;
use crate::error::{Result, SessionError};
use crate::session::{Session, SessionState};
use crate::signals::{round2, SignalEvent, SignalLog, SignalSummary};
use crate::transcript::{Message, TranscriptStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Tolerance for the weights-sum-to-one check
pub const WEIGHT_EPSILON: f64 = 1e-6;

/// Computes the final evaluation of a completed session.
///
/// `compute` is a pure function of (session, transcript, signals): the same
/// inputs always give an identical `Score`.
#[derive(Clone)]
pub struct ScoreAggregator {
    transcripts: Arc<dyn TranscriptStore>,
    signals: SignalLog,
    scores: ScoreStore,
}

impl ScoreAggregator {
    pub fn new(transcripts: Arc<dyn TranscriptStore>, signals: SignalLog, scores: ScoreStore) -> Self {
        Self {
            transcripts,
            signals,
            scores,
        }
    }

    pub fn scores(&self) -> &ScoreStore {
        &self.scores
    }

    /// Read the transcript and signals for `session`, compute and store its score
    pub async fn finalize(&self, session: &Session) -> Result<Score> {
        if session.state() != SessionState::Completed {
            return Err(SessionError::IncompleteSession(session.state()));
        }

        let transcript = self.transcripts.list(session.id()).await?;
        let signals = self.signals.events(session.id()).await;

        let score = Self::compute(session, &transcript, &signals)?;
        info!(
            "Scored session {}: overall {:.2} ({:?})",
            session.id(),
            score.overall,
            score.recommendation
        );

        Ok(self.scores.insert(score).await)
    }

    /// Compute a score without touching any store
    pub fn compute(session: &Session, transcript: &[Message], signals: &[SignalEvent]) -> Result<Score> {
        if session.state() != SessionState::Completed {
            return Err(SessionError::IncompleteSession(session.state()));
        }

        let weights = match &session.config().weights {
            Some(weights) => {
                validate_weights(weights)?;
                weights.clone()
            }
            None => default_weights(),
        };

        let mut contributions: BTreeMap<Dimension, Vec<f64>> = BTreeMap::new();
        let mut question_scores = Vec::new();

        for message in transcript {
            let mut breakdown: BTreeMap<Dimension, f64> = BTreeMap::new();
            for (name, value) in &message.score_breakdown {
                match name.parse::<Dimension>() {
                    Ok(dimension) => {
                        breakdown.insert(dimension, *value);
                    }
                    Err(e) => debug!("Ignoring breakdown entry on message {}: {}", message.id, e),
                }
            }

            if message.score.is_none() && breakdown.is_empty() {
                continue;
            }

            // The message's overall score stands in for core dimensions its
            // breakdown does not name
            if let Some(score) = message.score {
                for dimension in Dimension::CORE {
                    breakdown.entry(dimension).or_insert(score);
                }
            }

            for (dimension, value) in &breakdown {
                contributions.entry(*dimension).or_default().push(*value);
            }

            let message_score = match message.score {
                Some(score) => score,
                None => breakdown.values().sum::<f64>() / breakdown.len() as f64,
            };
            question_scores.push(QuestionScore {
                message_id: message.id,
                sequence: message.sequence,
                question_id: message.question_id,
                score: round2(message_score),
            });
        }

        let mut dimensions: BTreeMap<Dimension, f64> = contributions
            .into_iter()
            .map(|(dimension, values)| {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                (dimension, round2(mean))
            })
            .collect();

        let summary = SignalSummary::from_events(signals);
        let video = [
            (Dimension::Confidence, summary.confidence),
            (Dimension::Engagement, summary.overall_engagement),
            (Dimension::Professionalism, summary.professionalism),
        ];
        for (dimension, value) in video {
            // Analyzer values are 0-1; dimensions are 0-10
            if let Some(value) = value {
                dimensions.insert(dimension, round2(value * 10.0));
            }
        }

        let overall = weighted_overall(&dimensions, &weights);
        let recommendation = Recommendation::from_overall(overall);

        let strengths = dimensions
            .iter()
            .filter(|(_, score)| **score >= 7.0)
            .map(|(dimension, _)| *dimension)
            .collect();
        let weaknesses = dimensions
            .iter()
            .filter(|(_, score)| **score < 5.0)
            .map(|(dimension, _)| *dimension)
            .collect();

        Ok(Score {
            session_id: session.id().to_string(),
            dimensions,
            weights,
            overall,
            recommendation,
            question_scores,
            strengths,
            weaknesses,
            signals: summary,
        })
    }
}

/// Reject weight maps that are negative, non-finite, or do not sum to 1.0
pub fn validate_weights(weights: &BTreeMap<Dimension, f64>) -> Result<()> {
    if let Some((dimension, weight)) = weights
        .iter()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(SessionError::InvalidWeights(format!(
            "{} has weight {}",
            dimension, weight
        )));
    }

    let sum: f64 = weights.values().sum();
    if (sum - 1.0).abs() > WEIGHT_EPSILON {
        return Err(SessionError::InvalidWeights(format!(
            "weights sum to {}, expected 1.0",
            sum
        )));
    }
    Ok(())
}

/// Σ(score × weight) over the weighted dimensions. A dimension with no
/// evidence contributes 0.
fn weighted_overall(dimensions: &BTreeMap<Dimension, f64>, weights: &BTreeMap<Dimension, f64>) -> f64 {
    let total: f64 = weights
        .iter()
        .map(|(dimension, weight)| dimensions.get(dimension).copied().unwrap_or(0.0) * weight)
        .sum();
    round2(total)
}
