//! Score aggregation for completed interviews

mod aggregator;
mod score;
mod store;

pub use aggregator::{validate_weights, ScoreAggregator, WEIGHT_EPSILON};
pub use score::{default_weights, Dimension, QuestionScore, Recommendation, Score};
pub use store::ScoreStore;
