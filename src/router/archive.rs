use crate::session::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Final copies of sessions whose router has stopped.
///
/// A router hands its session over here before its task exits, so the
/// terminal record (state, timestamps, connection log) stays queryable and
/// the id can never be scheduled again.
#[derive(Clone, Default)]
pub struct SessionArchive {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) {
        debug!("Archiving session {} ({})", session.id(), session.state());
        self.sessions
            .write()
            .await
            .insert(session.id().to_string(), session);
    }

    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
