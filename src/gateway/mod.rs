//! Response generator gateway
//!
//! Isolates the AI text-response provider behind `ResponseGenerator` and
//! bounds every call with a timeout; failures degrade to fallback text.

mod chat;
mod generator;
mod scripted;

pub use chat::{ChatCompletionGenerator, ProviderConfig};
pub use generator::{ResponseGateway, ResponseGenerator, SessionContext, DEFAULT_FALLBACK_RESPONSE};
pub use scripted::ScriptedGenerator;
