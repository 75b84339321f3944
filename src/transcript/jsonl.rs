use super::message::{DraftMessage, Message};
use super::store::{next_sequence, TranscriptStore};
use crate::error::{Result, SessionError};
use crate::session::validate_session_id;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

/// Durable transcript store: one `<session>.jsonl` file per session.
///
/// Each append writes exactly one line. The in-memory view is only updated
/// after the line is flushed, and a failed write is truncated back to the
/// previous length, so readers never observe a partial append.
pub struct JsonlTranscriptStore {
    dir: PathBuf,
    logs: RwLock<HashMap<String, Arc<Mutex<SessionLog>>>>,
}

struct SessionLog {
    path: PathBuf,
    /// File length after the last complete line
    len: u64,
    messages: Vec<Message>,
}

impl JsonlTranscriptStore {
    /// Open (and create if needed) the transcript directory
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;

        info!("Transcript store initialized: {:?}", dir);

        Ok(Self {
            dir,
            logs: RwLock::new(HashMap::new()),
        })
    }

    /// Only called with validated ids, so distinct sessions get distinct files
    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", session_id))
    }

    async fn log(&self, session_id: &str) -> Result<Arc<Mutex<SessionLog>>> {
        let logs = self.logs.read().await;
        logs.get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))
    }

    /// Load an existing log file, dropping a torn trailing line and any
    /// line that belongs to another session
    async fn replay(path: &Path, session_id: &str) -> Result<SessionLog> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let complete = match content.rfind('\n') {
            Some(pos) => &content[..=pos],
            None => "",
        };

        if complete.len() < content.len() {
            warn!(
                "Dropping torn trailing line in {:?} ({} bytes)",
                path,
                content.len() - complete.len()
            );
            let file = OpenOptions::new().write(true).open(path).await?;
            file.set_len(complete.len() as u64).await?;
        }

        let mut messages = Vec::new();
        for (line_no, line) in complete.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Message>(line) {
                Ok(message) if message.session_id == session_id => messages.push(message),
                Ok(message) => warn!(
                    "Skipping line {} in {:?}: belongs to session {}",
                    line_no + 1,
                    path,
                    message.session_id
                ),
                Err(e) => warn!("Skipping malformed line {} in {:?}: {}", line_no + 1, path, e),
            }
        }

        Ok(SessionLog {
            path: path.to_path_buf(),
            len: complete.len() as u64,
            messages,
        })
    }
}

#[async_trait::async_trait]
impl TranscriptStore for JsonlTranscriptStore {
    async fn register(&self, session_id: &str) -> Result<()> {
        validate_session_id(session_id)?;

        let mut logs = self.logs.write().await;
        if logs.contains_key(session_id) {
            return Ok(());
        }

        let log = Self::replay(&self.path_for(session_id), session_id).await?;
        if !log.messages.is_empty() {
            info!(
                "Replayed {} messages for session {}",
                log.messages.len(),
                session_id
            );
        }
        logs.insert(session_id.to_string(), Arc::new(Mutex::new(log)));
        Ok(())
    }

    async fn append(&self, session_id: &str, draft: DraftMessage) -> Result<Message> {
        let log = self.log(session_id).await?;
        let mut log = log.lock().await;

        let message = draft.into_message(session_id, next_sequence(&log.messages));
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log.path)
            .await?;

        let written = async {
            file.write_all(&line).await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;

        if let Err(e) = written {
            error!("Failed to append to {:?}: {}", log.path, e);
            if let Err(truncate_err) = file.set_len(log.len).await {
                error!("Failed to roll back {:?}: {}", log.path, truncate_err);
            }
            return Err(e.into());
        }

        log.len += line.len() as u64;
        log.messages.push(message.clone());

        Ok(message)
    }

    async fn list(&self, session_id: &str) -> Result<Vec<Message>> {
        let log = self.log(session_id).await?;
        let log = log.lock().await;
        Ok(log.messages.clone())
    }
}
