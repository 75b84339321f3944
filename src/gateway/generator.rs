use crate::error::GenerationError;
use crate::session::{Difficulty, InterviewContext};
use crate::transcript::{Message, SenderRole};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Follow-up used when the provider fails or times out
pub const DEFAULT_FALLBACK_RESPONSE: &str =
    "That's an interesting point. Can you elaborate more on your experience with that?";

/// Everything a provider sees when asked for the next interviewer turn
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub interview: InterviewContext,
    pub difficulty: Difficulty,
    /// Most recent transcript messages, oldest first (bounded window)
    pub recent: Vec<Message>,
}

impl SessionContext {
    /// Render the context as a plain-text prompt
    pub fn prompt(&self, latest: &str) -> String {
        let mut prompt = String::new();

        if !self.interview.job_title.is_empty() {
            prompt.push_str(&format!("Job: {}\n", self.interview.job_title));
        }
        prompt.push_str(&format!(
            "Required Skills: {}\n",
            self.interview.required_skills.join(", ")
        ));
        prompt.push_str(&format!(
            "Candidate: {} years experience; skills: {}; current role: {}\n",
            self.interview.experience_years,
            self.interview
                .candidate_skills
                .iter()
                .take(10)
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
            self.interview.current_title.as_deref().unwrap_or("N/A"),
        ));
        prompt.push_str(&format!("Difficulty: {}\n\nConversation so far:\n", self.difficulty.as_str()));

        for message in &self.recent {
            let speaker = match message.sender {
                SenderRole::Interviewer => "Interviewer",
                SenderRole::Candidate => "Candidate",
            };
            prompt.push_str(&format!("{}: {}\n", speaker, message.content));
        }

        prompt.push_str(&format!(
            "\nCandidate's latest answer: {}\n\nAsk one natural, probing follow-up question. Return only the question.",
            latest
        ));
        prompt
    }
}

/// AI text-response provider
///
/// Implementations:
/// - `ScriptedGenerator`: deterministic placeholder responses
/// - `ChatCompletionGenerator`: OpenAI-compatible HTTP provider
#[async_trait::async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(
        &self,
        context: &SessionContext,
        latest: &Message,
    ) -> Result<String, GenerationError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Bounded-wait wrapper around a `ResponseGenerator`.
///
/// `respond` always yields text: provider failures, timeouts and empty
/// responses are replaced by the fallback response.
#[derive(Clone)]
pub struct ResponseGateway {
    generator: Arc<dyn ResponseGenerator>,
    timeout: Duration,
    fallback: String,
}

impl ResponseGateway {
    pub fn new(generator: Arc<dyn ResponseGenerator>, timeout: Duration) -> Self {
        Self {
            generator,
            timeout,
            fallback: DEFAULT_FALLBACK_RESPONSE.to_string(),
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Generate the next interviewer turn, falling back on any failure
    pub async fn respond(&self, context: &SessionContext, latest: &Message) -> String {
        match self.try_generate(context, latest).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Using fallback response for session {} ({}): {}",
                    context.session_id,
                    self.generator.name(),
                    e
                );
                self.fallback.clone()
            }
        }
    }

    async fn try_generate(
        &self,
        context: &SessionContext,
        latest: &Message,
    ) -> Result<String, GenerationError> {
        let text = timeout(self.timeout, self.generator.generate(context, latest))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout.as_millis() as u64))??;

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::Failure("empty response".to_string()));
        }

        debug!("Generated response for session {}", context.session_id);
        Ok(text.to_string())
    }
}
