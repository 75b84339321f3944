use super::score::Score;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// At most one score per session
#[derive(Clone, Default)]
pub struct ScoreStore {
    scores: Arc<RwLock<HashMap<String, Score>>>,
}

impl ScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a score unless one already exists; returns the stored score.
    ///
    /// An identical recomputation is accepted silently. A differing one
    /// (e.g. a late analyzer result) is logged and the first score is kept.
    pub async fn insert(&self, score: Score) -> Score {
        let mut scores = self.scores.write().await;
        match scores.get(&score.session_id) {
            Some(existing) => {
                if *existing != score {
                    warn!(
                        "Keeping existing score for session {} (recomputed overall {:.2} vs stored {:.2})",
                        score.session_id, score.overall, existing.overall
                    );
                }
                existing.clone()
            }
            None => {
                scores.insert(score.session_id.clone(), score.clone());
                score
            }
        }
    }

    pub async fn get(&self, session_id: &str) -> Option<Score> {
        let scores = self.scores.read().await;
        scores.get(session_id).cloned()
    }
}
