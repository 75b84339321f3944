use super::message::{DraftMessage, Message};
use crate::error::{Result, SessionError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Append-only, per-session message log
///
/// Implementations:
/// - `InMemoryTranscriptStore`: process-local, used by tests and ephemeral deployments
/// - `JsonlTranscriptStore`: one JSON line per message on disk, replayed on restart
#[async_trait::async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Make a session known to the store. Registering twice is a no-op.
    async fn register(&self, session_id: &str) -> Result<()>;

    /// Assign the next sequence number and persist the message.
    ///
    /// Sequence assignment and persistence happen under the session's log
    /// lock, so concurrent appends for one session never share a number.
    async fn append(&self, session_id: &str, draft: DraftMessage) -> Result<Message>;

    /// All messages for the session in ascending sequence order
    async fn list(&self, session_id: &str) -> Result<Vec<Message>>;

    /// Most recent `limit` messages in ascending sequence order
    async fn recent(&self, session_id: &str, limit: usize) -> Result<Vec<Message>> {
        let mut messages = self.list(session_id).await?;
        if messages.len() > limit {
            messages.drain(..messages.len() - limit);
        }
        Ok(messages)
    }
}

/// Next sequence number for a log (1-based, gap-free)
pub(crate) fn next_sequence(messages: &[Message]) -> u64 {
    messages.last().map(|m| m.sequence + 1).unwrap_or(1)
}

/// In-memory transcript store
#[derive(Default)]
pub struct InMemoryTranscriptStore {
    logs: RwLock<HashMap<String, Arc<Mutex<Vec<Message>>>>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn log(&self, session_id: &str) -> Result<Arc<Mutex<Vec<Message>>>> {
        let logs = self.logs.read().await;
        logs.get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))
    }
}

#[async_trait::async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn register(&self, session_id: &str) -> Result<()> {
        let mut logs = self.logs.write().await;
        logs.entry(session_id.to_string()).or_default();
        Ok(())
    }

    async fn append(&self, session_id: &str, draft: DraftMessage) -> Result<Message> {
        let log = self.log(session_id).await?;
        let mut messages = log.lock().await;

        let message = draft.into_message(session_id, next_sequence(&messages));
        messages.push(message.clone());

        Ok(message)
    }

    async fn list(&self, session_id: &str) -> Result<Vec<Message>> {
        let log = self.log(session_id).await?;
        let messages = log.lock().await;
        Ok(messages.clone())
    }
}
