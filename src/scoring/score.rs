use crate::signals::SignalSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Evaluation dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    TechnicalSkills,
    ProblemSolving,
    Communication,
    CulturalFit,
    ExperienceRelevance,
    /// Video-derived: body-language confidence
    Confidence,
    /// Video-derived: facial engagement
    Engagement,
    /// Video-derived
    Professionalism,
}

impl Dimension {
    /// Dimensions scored from the transcript
    pub const CORE: [Dimension; 5] = [
        Dimension::TechnicalSkills,
        Dimension::ProblemSolving,
        Dimension::Communication,
        Dimension::CulturalFit,
        Dimension::ExperienceRelevance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::TechnicalSkills => "technical_skills",
            Dimension::ProblemSolving => "problem_solving",
            Dimension::Communication => "communication",
            Dimension::CulturalFit => "cultural_fit",
            Dimension::ExperienceRelevance => "experience_relevance",
            Dimension::Confidence => "confidence",
            Dimension::Engagement => "engagement",
            Dimension::Professionalism => "professionalism",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    /// Accepts the canonical names plus the short forms used in score breakdowns
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "technical_skills" | "technical" => Ok(Dimension::TechnicalSkills),
            "problem_solving" => Ok(Dimension::ProblemSolving),
            "communication" => Ok(Dimension::Communication),
            "cultural_fit" => Ok(Dimension::CulturalFit),
            "experience_relevance" | "experience" => Ok(Dimension::ExperienceRelevance),
            "confidence" => Ok(Dimension::Confidence),
            "engagement" => Ok(Dimension::Engagement),
            "professionalism" => Ok(Dimension::Professionalism),
            other => Err(format!("unknown dimension: {}", other)),
        }
    }
}

/// Default weight map used when a session configures none
pub fn default_weights() -> BTreeMap<Dimension, f64> {
    BTreeMap::from([
        (Dimension::TechnicalSkills, 0.25),
        (Dimension::ProblemSolving, 0.20),
        (Dimension::Communication, 0.20),
        (Dimension::CulturalFit, 0.15),
        (Dimension::ExperienceRelevance, 0.20),
    ])
}

/// Hiring recommendation derived from the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongHire,
    Hire,
    Maybe,
    NoHire,
}

impl Recommendation {
    /// ≥ 8.0 strong hire, ≥ 6.5 hire, ≥ 5.0 maybe, anything else (NaN included) no hire
    pub fn from_overall(overall: f64) -> Self {
        if overall >= 8.0 {
            Recommendation::StrongHire
        } else if overall >= 6.5 {
            Recommendation::Hire
        } else if overall >= 5.0 {
            Recommendation::Maybe
        } else {
            Recommendation::NoHire
        }
    }
}

/// Score of a single evaluated message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub message_id: Uuid,
    pub sequence: u64,
    pub question_id: Option<Uuid>,
    pub score: f64,
}

/// Final evaluation of a completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub session_id: String,

    /// Per-dimension scores (0-10); dimensions without evidence are absent
    pub dimensions: BTreeMap<Dimension, f64>,

    /// Weights used for the overall score
    pub weights: BTreeMap<Dimension, f64>,

    /// Weighted overall score (0-10), two decimals
    pub overall: f64,

    pub recommendation: Recommendation,

    pub question_scores: Vec<QuestionScore>,

    /// Dimensions scoring 7.0 or above
    pub strengths: Vec<Dimension>,

    /// Dimensions scoring below 5.0
    pub weaknesses: Vec<Dimension>,

    pub signals: SignalSummary,
}
