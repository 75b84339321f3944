use super::router::{RouterDeps, RouterHandle, SessionRouter};
use crate::error::{Result, SessionError};
use crate::scoring::validate_weights;
use crate::session::{validate_session_id, Session, SessionConfig, SessionStats};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Session id → router lookup.
///
/// Routers are created when a session is scheduled and drop out once their
/// task exits (a terminal session idle past the configured timeout). The
/// session itself is never forgotten: its final record moves to the
/// `SessionArchive` and its id stays taken.
#[derive(Clone)]
pub struct SessionRegistry {
    routers: Arc<RwLock<HashMap<String, RouterHandle>>>,
    deps: RouterDeps,
}

impl SessionRegistry {
    pub fn new(deps: RouterDeps) -> Self {
        Self {
            routers: Arc::new(RwLock::new(HashMap::new())),
            deps,
        }
    }

    pub fn deps(&self) -> &RouterDeps {
        &self.deps
    }

    /// Create a session in the `scheduled` state and spawn its router
    pub async fn schedule(&self, config: SessionConfig) -> Result<RouterHandle> {
        validate_session_id(&config.session_id)?;
        if let Some(weights) = &config.weights {
            validate_weights(weights)?;
        }

        let mut routers = self.routers.write().await;
        if routers.contains_key(&config.session_id)
            || self.deps.archive.contains(&config.session_id).await
        {
            return Err(SessionError::DuplicateSession(config.session_id));
        }

        // A transcript replayed from disk belongs to an earlier session
        self.deps.transcripts.register(&config.session_id).await?;
        if !self.deps.transcripts.list(&config.session_id).await?.is_empty() {
            return Err(SessionError::DuplicateSession(config.session_id));
        }

        info!(
            "Scheduling session {} ({} min, video_analysis={}, recording={})",
            config.session_id,
            config.duration_minutes,
            config.capabilities.video_analysis,
            config.capabilities.recording
        );

        let session_id = config.session_id.clone();
        let handle = SessionRouter::spawn(Session::new(config), self.deps.clone());
        routers.insert(session_id, handle.clone());

        Ok(handle)
    }

    /// Look up a live router.
    ///
    /// A session whose router has stopped reports `SessionClosed` with its
    /// final state; only ids that were never scheduled are `SessionNotFound`.
    pub async fn get(&self, session_id: &str) -> Result<RouterHandle> {
        let stale = {
            let routers = self.routers.read().await;
            match routers.get(session_id) {
                Some(handle) if !handle.is_closed() => return Ok(handle.clone()),
                Some(_) => true,
                None => false,
            }
        };

        if stale {
            let mut routers = self.routers.write().await;
            if routers.get(session_id).is_some_and(|h| h.is_closed()) {
                routers.remove(session_id);
                debug!("Removed stopped router for session {}", session_id);
            }
        }

        match self.deps.archive.get(session_id).await {
            Some(session) => Err(SessionError::SessionClosed(session.state())),
            None => Err(SessionError::SessionNotFound(session_id.to_string())),
        }
    }

    /// Current view of a session, live or archived
    pub async fn status(&self, session_id: &str) -> Result<SessionStats> {
        let live = match self.get(session_id).await {
            Ok(router) => router.stats().await,
            Err(e) => Err(e),
        };

        match live {
            Err(SessionError::SessionClosed(_)) | Err(SessionError::RouterUnavailable(_)) => self
                .archive_stats(session_id)
                .await
                .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string())),
            other => other,
        }
    }

    async fn archive_stats(&self, session_id: &str) -> Option<SessionStats> {
        self.deps.archive.get(session_id).await.map(|s| s.stats(0))
    }

    /// Remove routers whose task has exited. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let mut routers = self.routers.write().await;
        let before = routers.len();
        routers.retain(|_, handle| !handle.is_closed());
        let removed = before - routers.len();
        if removed > 0 {
            info!("Swept {} stopped session routers", removed);
        }
        removed
    }

    /// Number of registered routers (live or not yet swept)
    pub async fn len(&self) -> usize {
        self.routers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.routers.read().await.is_empty()
    }

    /// Periodically sweep stopped routers
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.sweep().await;
            }
        })
    }
}
