use crate::gateway::{ProviderConfig, DEFAULT_FALLBACK_RESPONSE};
use crate::router::RouterSettings;
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub interview: InterviewConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Analyzer broker; local analysis when absent
    #[serde(default)]
    pub nats: Option<NatsConfig>,
    /// AI response provider; scripted responses when absent
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    pub welcome_message: String,
    pub closing_message: String,
    pub cancelled_message: String,
    pub fallback_response: String,
    pub default_duration_minutes: u32,
    pub generation_timeout_ms: u64,
    pub context_window: usize,
    pub idle_timeout_secs: u64,
    pub client_buffer: usize,
    pub router_buffer: usize,
    pub analyzer_queue: usize,
    pub analyzer_timeout_ms: u64,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        let router = RouterSettings::default();
        Self {
            welcome_message: router.welcome_message,
            closing_message: router.closing_message,
            cancelled_message: router.cancelled_message,
            fallback_response: DEFAULT_FALLBACK_RESPONSE.to_string(),
            default_duration_minutes: 60,
            generation_timeout_ms: 10_000,
            context_window: router.context_window,
            idle_timeout_secs: router.idle_timeout.as_secs(),
            client_buffer: router.client_buffer,
            router_buffer: router.command_buffer,
            analyzer_queue: 256,
            analyzer_timeout_ms: 5_000,
        }
    }
}

impl InterviewConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    pub fn router_settings(&self, recordings_dir: Option<PathBuf>) -> RouterSettings {
        RouterSettings {
            welcome_message: self.welcome_message.clone(),
            closing_message: self.closing_message.clone(),
            cancelled_message: self.cancelled_message.clone(),
            context_window: self.context_window,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            client_buffer: self.client_buffer,
            command_buffer: self.router_buffer,
            recordings_dir,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// JSONL transcript directory; transcripts stay in memory when absent
    pub transcripts_path: Option<String>,
    /// WAV recordings directory; recording is disabled when absent
    pub recordings_path: Option<String>,
}

impl StorageConfig {
    pub fn transcripts_dir(&self) -> Option<PathBuf> {
        self.transcripts_path.as_deref().map(expand_path)
    }

    pub fn recordings_dir(&self) -> Option<PathBuf> {
        self.recordings_path.as_deref().map(expand_path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    pub url: String,
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl Config {
    /// Load `<path>.toml` (or any format `config` recognizes), then apply
    /// `INTERVIEW__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("INTERVIEW").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
