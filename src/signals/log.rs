use super::event::SignalEvent;
use super::summary::SignalSummary;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Accumulated signal events per session (session_id → events in arrival order)
#[derive(Clone, Default)]
pub struct SignalLog {
    events: Arc<RwLock<HashMap<String, Vec<SignalEvent>>>>,
}

impl SignalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, event: SignalEvent) {
        debug!(
            "Recording {:?} signal for session {}",
            event.class, event.session_id
        );
        let mut events = self.events.write().await;
        events
            .entry(event.session_id.clone())
            .or_default()
            .push(event);
    }

    /// All events recorded for a session (empty if none)
    pub async fn events(&self, session_id: &str) -> Vec<SignalEvent> {
        let events = self.events.read().await;
        events.get(session_id).cloned().unwrap_or_default()
    }

    pub async fn summary(&self, session_id: &str) -> SignalSummary {
        let events = self.events.read().await;
        let session_events = events.get(session_id).map(Vec::as_slice).unwrap_or(&[]);
        SignalSummary::from_events(session_events)
    }
}
