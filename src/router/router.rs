use super::archive::SessionArchive;
use super::events::{InboundEvent, OutboundEvent};
use crate::error::{Result, SessionError};
use crate::gateway::{ResponseGateway, SessionContext};
use crate::recording::AudioRecorder;
use crate::scoring::{ScoreAggregator, ScoreStore};
use crate::session::{LifecycleInput, Session, SessionStats, SessionState, Transition};
use crate::signals::{Analyzer, IngestConfig, SignalClass, SignalEvent, SignalIngest, SignalLog};
use crate::transcript::{DraftMessage, Message, TranscriptStore};
use base64::Engine;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Identifies one attached client connection within a session
pub type ClientId = u64;

/// Tunables shared by all routers
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub welcome_message: String,
    pub closing_message: String,
    pub cancelled_message: String,
    /// Transcript messages handed to the response generator
    pub context_window: usize,
    /// How long a terminal session's router lingers without commands
    pub idle_timeout: Duration,
    /// Outbound buffer per client; a client that falls this far behind is detached
    pub client_buffer: usize,
    /// Pending commands per router
    pub command_buffer: usize,
    /// Where recordings are written; `None` disables recording
    pub recordings_dir: Option<PathBuf>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            welcome_message:
                "Hello! I'm your AI interviewer today. Let's begin the interview. Are you ready?"
                    .to_string(),
            closing_message: "Interview session ended. Thank you for your time!".to_string(),
            cancelled_message: "Interview session was cancelled.".to_string(),
            context_window: 10,
            idle_timeout: Duration::from_secs(300),
            client_buffer: 64,
            command_buffer: 128,
            recordings_dir: None,
        }
    }
}

/// Collaborators a router drives
#[derive(Clone)]
pub struct RouterDeps {
    pub transcripts: Arc<dyn TranscriptStore>,
    pub gateway: ResponseGateway,
    pub ingest: SignalIngest,
    pub signals: SignalLog,
    pub aggregator: ScoreAggregator,
    pub archive: SessionArchive,
    pub settings: RouterSettings,
}

impl RouterDeps {
    /// Wire ingest, scoring and the score store around the given collaborators.
    ///
    /// Must be called inside a tokio runtime (spawns the ingest worker).
    pub fn new(
        transcripts: Arc<dyn TranscriptStore>,
        gateway: ResponseGateway,
        signals: SignalLog,
        analyzer: Arc<dyn Analyzer>,
        ingest: IngestConfig,
        settings: RouterSettings,
    ) -> Self {
        let aggregator = ScoreAggregator::new(transcripts.clone(), signals.clone(), ScoreStore::new());
        Self {
            transcripts,
            gateway,
            ingest: SignalIngest::spawn(analyzer, ingest),
            signals,
            aggregator,
            archive: SessionArchive::new(),
            settings,
        }
    }
}

/// A client's live view of a session
pub struct ClientAttachment {
    pub client_id: ClientId,
    /// Outbound events, starting with `connection_established`
    pub events: mpsc::Receiver<OutboundEvent>,
}

enum Command {
    Inbound {
        client: Option<ClientId>,
        event: InboundEvent,
        reply: oneshot::Sender<Result<()>>,
    },
    Lifecycle {
        input: LifecycleInput,
        reply: oneshot::Sender<Result<Transition>>,
    },
    Attach {
        reply: oneshot::Sender<ClientAttachment>,
    },
    Detach {
        client: ClientId,
    },
    Stats {
        reply: oneshot::Sender<SessionStats>,
    },
    Snapshot {
        reply: oneshot::Sender<Session>,
    },
}

/// Cloneable handle to a running session router
#[derive(Clone)]
pub struct RouterHandle {
    session_id: Arc<str>,
    tx: mpsc::Sender<Command>,
}

impl RouterHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether the router task has exited
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Submit an inbound event from `client` and wait until it is processed
    pub async fn send(&self, client: Option<ClientId>, event: InboundEvent) -> Result<()> {
        self.request(|reply| Command::Inbound {
            client,
            event,
            reply,
        })
        .await?
    }

    /// Apply a lifecycle input that does not come from the live channel
    pub async fn lifecycle(&self, input: LifecycleInput) -> Result<Transition> {
        self.request(|reply| Command::Lifecycle { input, reply }).await?
    }

    /// Attach a new client; it receives only events broadcast from now on
    pub async fn attach(&self) -> Result<ClientAttachment> {
        self.request(|reply| Command::Attach { reply }).await
    }

    pub async fn detach(&self, client: ClientId) {
        // A stopped router has no clients left to detach
        let _ = self.tx.send(Command::Detach { client }).await;
    }

    pub async fn stats(&self) -> Result<SessionStats> {
        self.request(|reply| Command::Stats { reply }).await
    }

    /// Copy of the session as currently seen by the router
    pub async fn snapshot(&self) -> Result<Session> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| self.unavailable())?;
        rx.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> SessionError {
        SessionError::RouterUnavailable(self.session_id.to_string())
    }
}

/// Per-session serialization point.
///
/// The router is the only writer of its session's state and the only
/// appender to its transcript. It processes one command at a time, so
/// transcript order, broadcast order and arrival order are the same.
pub struct SessionRouter {
    session: Session,
    deps: RouterDeps,
    clients: HashMap<ClientId, mpsc::Sender<OutboundEvent>>,
    next_client: ClientId,
    recorder: Option<AudioRecorder>,
}

impl SessionRouter {
    /// Spawn a router task for `session`
    pub fn spawn(session: Session, deps: RouterDeps) -> RouterHandle {
        let (tx, rx) = mpsc::channel(deps.settings.command_buffer.max(1));
        let session_id: Arc<str> = Arc::from(session.id());

        let router = Self {
            session,
            deps,
            clients: HashMap::new(),
            next_client: 1,
            recorder: None,
        };
        tokio::spawn(router.run(rx));

        RouterHandle { session_id, tx }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        info!("Session router started: {}", self.session.id());

        loop {
            let command = if self.session.state().is_terminal() {
                match timeout(self.deps.settings.idle_timeout, rx.recv()).await {
                    Ok(command) => command,
                    Err(_) => {
                        info!(
                            "Session {} idle for {:?} after {}, stopping router",
                            self.session.id(),
                            self.deps.settings.idle_timeout,
                            self.session.state()
                        );
                        break;
                    }
                }
            } else {
                rx.recv().await
            };

            let Some(command) = command else {
                break;
            };
            self.handle(command).await;
        }

        self.finish_recording();
        self.deps.ingest.forget(self.session.id()).await;
        // Archive before `rx` drops so `is_closed()` implies the record exists
        self.deps.archive.insert(self.session.clone()).await;
        info!("Session router stopped: {}", self.session.id());
        drop(rx);
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Inbound {
                client,
                event,
                reply,
            } => {
                let kind = event.kind();
                let result = self.handle_event(client, event).await;
                if let Err(e) = &result {
                    warn!("Session {}: {} rejected: {}", self.session.id(), kind, e);
                    if let Some(client) = client {
                        self.send_to(
                            client,
                            OutboundEvent::Error {
                                code: e.code().to_string(),
                                message: e.to_string(),
                            },
                        );
                    }
                }
                let _ = reply.send(result);
            }
            Command::Lifecycle { input, reply } => {
                let result = self.handle_lifecycle(input).await;
                let _ = reply.send(result);
            }
            Command::Attach { reply } => {
                let attachment = self.attach();
                if reply.send(attachment).is_err() {
                    debug!("Attach requester went away");
                }
            }
            Command::Detach { client } => {
                if self.clients.remove(&client).is_some() {
                    info!(
                        "Client {} detached from session {} ({} remaining)",
                        client,
                        self.session.id(),
                        self.clients.len()
                    );
                }
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.session.stats(self.clients.len()));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.session.clone());
            }
        }
    }

    async fn handle_event(&mut self, client: Option<ClientId>, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::StartInterview => self.start().await.map(|_| ()),
            InboundEvent::EndInterview => self.end().map(|_| ()),
            InboundEvent::CandidateMessage { content } => self.candidate_message(content).await,
            InboundEvent::AudioData { data, timestamp } => {
                self.media(client, SignalClass::Audio, &data, timestamp)
            }
            InboundEvent::VideoFrame { data, timestamp } => {
                self.media(client, SignalClass::Video, &data, timestamp)
            }
            InboundEvent::ConnectionStatus { status, quality } => {
                self.connection_status(status, quality).await
            }
            InboundEvent::Unknown => {
                debug!("Ignoring unknown event for session {}", self.session.id());
                Ok(())
            }
        }
    }

    async fn handle_lifecycle(&mut self, input: LifecycleInput) -> Result<Transition> {
        match input {
            LifecycleInput::Invite => self.session.invite(),
            LifecycleInput::Start => self.start().await,
            LifecycleInput::End => self.end(),
            LifecycleInput::Cancel => self.cancel(),
            LifecycleInput::NoShow => {
                let transition = self.session.mark_no_show()?;
                self.finish_recording();
                Ok(transition)
            }
            LifecycleInput::Message => Err(SessionError::InvalidTransition {
                from: self.session.state(),
                input,
            }),
        }
    }

    /// `start`: transition, append the welcome message, broadcast `interview_started`.
    ///
    /// The transition is applied to a copy and only committed once the
    /// welcome message is stored, so a failed append leaves the session
    /// untouched and the start can be retried.
    async fn start(&mut self) -> Result<Transition> {
        let mut next = self.session.clone();
        let transition = next.start()?;

        let welcome = self
            .append(DraftMessage::system(self.deps.settings.welcome_message.clone()))
            .await?;
        self.session = next;

        self.broadcast(OutboundEvent::InterviewStarted {
            message: welcome.content,
            timestamp: welcome.timestamp,
        });
        Ok(transition)
    }

    fn end(&mut self) -> Result<Transition> {
        let transition = self.session.end()?;
        if !transition.is_applied() {
            return Ok(transition);
        }

        self.broadcast(OutboundEvent::InterviewEnded {
            message: self.deps.settings.closing_message.clone(),
        });
        self.finish_recording();

        // Scoring runs off the serialization point
        let aggregator = self.deps.aggregator.clone();
        let session = self.session.clone();
        tokio::spawn(async move {
            if let Err(e) = aggregator.finalize(&session).await {
                error!("Failed to score session {}: {}", session.id(), e);
            }
        });

        Ok(transition)
    }

    fn cancel(&mut self) -> Result<Transition> {
        let transition = self.session.cancel()?;
        if transition.is_applied() {
            self.broadcast(OutboundEvent::InterviewCancelled {
                message: self.deps.settings.cancelled_message.clone(),
            });
            self.finish_recording();
        }
        Ok(transition)
    }

    /// Append the answer, ask the gateway for a follow-up, append and
    /// broadcast both in order.
    ///
    /// Once the answer is stored a follow-up is always appended, falling back
    /// to the gateway's default text when the context cannot be built.
    async fn candidate_message(&mut self, content: String) -> Result<()> {
        self.session.ensure_accepting_messages()?;

        let answer = self.append(DraftMessage::answer(content)).await?;
        self.broadcast(OutboundEvent::from(&answer));

        let response = match self.generation_context().await {
            Ok(context) => self.deps.gateway.respond(&context, &answer).await,
            Err(e) => {
                warn!(
                    "Session {}: transcript unavailable for generation, using fallback: {}",
                    self.session.id(),
                    e
                );
                self.deps.gateway.fallback().to_string()
            }
        };

        let followup = self.append(DraftMessage::followup(response)).await?;
        self.broadcast(OutboundEvent::from(&followup));
        Ok(())
    }

    async fn generation_context(&self) -> Result<SessionContext> {
        let recent = self
            .deps
            .transcripts
            .recent(self.session.id(), self.deps.settings.context_window)
            .await?;

        Ok(SessionContext {
            session_id: self.session.id().to_string(),
            interview: self.session.config().context.clone(),
            difficulty: self.session.config().resolved_difficulty(),
            recent,
        })
    }

    /// Forward audio/video to signal ingest and acknowledge to the sender only
    fn media(
        &mut self,
        client: Option<ClientId>,
        class: SignalClass,
        data: &str,
        captured_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        if self.session.state().is_terminal() {
            return Err(SessionError::SessionClosed(self.session.state()));
        }

        let status = match base64::engine::general_purpose::STANDARD.decode(data) {
            Err(e) => {
                warn!(
                    "Dropping undecodable {:?} payload for session {}: {}",
                    class,
                    self.session.id(),
                    e
                );
                "dropped"
            }
            Ok(_) if class == SignalClass::Video && !self.session.capabilities().video_analysis => {
                "disabled"
            }
            Ok(bytes) => {
                if class == SignalClass::Audio {
                    self.record_audio(&bytes);
                }
                if self
                    .deps
                    .ingest
                    .submit(self.session.id(), class, bytes, captured_at)
                {
                    "received"
                } else {
                    "dropped"
                }
            }
        };

        if let Some(client) = client {
            let status = status.to_string();
            let ack = match class {
                SignalClass::Video => OutboundEvent::VideoProcessed { status },
                _ => OutboundEvent::AudioProcessed { status },
            };
            self.send_to(client, ack);
        }
        Ok(())
    }

    async fn connection_status(
        &mut self,
        status: String,
        quality: Option<serde_json::Value>,
    ) -> Result<()> {
        if self.session.state().is_terminal() {
            return Err(SessionError::SessionClosed(self.session.state()));
        }

        let payload = serde_json::json!({ "status": status, "quality": quality });
        self.session.log_connection(status, quality);
        self.deps
            .signals
            .record(SignalEvent::new(self.session.id(), SignalClass::Connection, payload))
            .await;
        Ok(())
    }

    async fn append(&self, draft: DraftMessage) -> Result<Message> {
        self.deps.transcripts.append(self.session.id(), draft).await
    }

    fn attach(&mut self) -> ClientAttachment {
        let client_id = self.next_client;
        self.next_client += 1;

        let (tx, rx) = mpsc::channel(self.deps.settings.client_buffer.max(1));
        let _ = tx.try_send(OutboundEvent::ConnectionEstablished {
            session_id: self.session.id().to_string(),
            message: "Connected to interview session".to_string(),
        });
        self.clients.insert(client_id, tx);

        info!(
            "Client {} attached to session {} ({} attached)",
            client_id,
            self.session.id(),
            self.clients.len()
        );

        ClientAttachment {
            client_id,
            events: rx,
        }
    }

    /// Deliver to every attached client in one pass. A client whose buffer is
    /// full or whose receiver is gone is detached rather than skipped, so no
    /// client ever sees a gap followed by later events.
    fn broadcast(&mut self, event: OutboundEvent) {
        let session_id = self.session.id().to_string();
        self.clients.retain(|client, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Client {} of session {} is lagging, detaching", client, session_id);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Client {} of session {} disconnected", client, session_id);
                false
            }
        });
    }

    fn send_to(&mut self, client: ClientId, event: OutboundEvent) {
        let Some(tx) = self.clients.get(&client) else {
            return;
        };
        if tx.try_send(event).is_err() {
            debug!("Dropping client {} of session {}", client, self.session.id());
            self.clients.remove(&client);
        }
    }

    fn record_audio(&mut self, pcm: &[u8]) {
        if !self.session.capabilities().recording
            || self.session.state() != SessionState::InProgress
        {
            return;
        }
        let Some(dir) = self.deps.settings.recordings_dir.as_ref() else {
            return;
        };

        if self.recorder.is_none() {
            match AudioRecorder::create(dir, self.session.id()) {
                Ok(recorder) => self.recorder = Some(recorder),
                Err(e) => {
                    warn!("Recording unavailable for session {}: {:#}", self.session.id(), e);
                    return;
                }
            }
        }

        if let Some(recorder) = &mut self.recorder {
            if let Err(e) = recorder.write_chunk(pcm) {
                warn!("Failed to record audio for session {}: {:#}", self.session.id(), e);
            }
        }
    }

    fn finish_recording(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            if let Err(e) = recorder.finish() {
                error!("Failed to finish recording for session {}: {:#}", self.session.id(), e);
            }
        }
    }
}
