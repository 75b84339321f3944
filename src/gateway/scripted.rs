use super::generator::{ResponseGenerator, SessionContext};
use crate::error::GenerationError;
use crate::transcript::{Message, MessageKind};

/// Deterministic provider used when no AI provider is configured.
///
/// Picks a follow-up from a fixed rotation based on how many answers the
/// candidate has given, mentioning the first required skill when known.
#[derive(Debug, Default)]
pub struct ScriptedGenerator;

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ResponseGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        context: &SessionContext,
        _latest: &Message,
    ) -> Result<String, GenerationError> {
        let answers = context
            .recent
            .iter()
            .filter(|m| m.kind == MessageKind::Answer)
            .count();

        let skill = context
            .interview
            .required_skills
            .first()
            .map(String::as_str)
            .unwrap_or("the required technologies");

        let response = match answers % 3 {
            1 => "That's interesting. Can you elaborate more on the technical challenges you faced?"
                .to_string(),
            2 => format!(
                "How have you applied {} in a recent project, and what would you do differently?",
                skill
            ),
            _ => "Can you walk me through a specific example of that?".to_string(),
        };

        Ok(response)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
