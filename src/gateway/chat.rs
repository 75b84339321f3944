use super::generator::{ResponseGenerator, SessionContext};
use crate::error::GenerationError;
use crate::transcript::Message;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = "You are an expert interviewer asking insightful follow-up questions.";

/// Provider settings for an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Full URL, e.g. "https://api.openai.com/v1/chat/completions"
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    100
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Response provider backed by a chat-completions HTTP API
pub struct ChatCompletionGenerator {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl ChatCompletionGenerator {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait::async_trait]
impl ResponseGenerator for ChatCompletionGenerator {
    async fn generate(
        &self,
        context: &SessionContext,
        latest: &Message,
    ) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: context.prompt(&latest.content),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut builder = self.http.post(&self.config.endpoint).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GenerationError::Failure(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Failure(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Failure(format!("invalid response body: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Failure("no choices in response".to_string()))
    }

    fn name(&self) -> &str {
        "chat_completion"
    }
}
