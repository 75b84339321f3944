use anyhow::{Context, Result};
use clap::Parser;
use interview_orchestrator::gateway::ProviderConfig;
use interview_orchestrator::signals::IngestConfig;
use interview_orchestrator::{
    create_router, Analyzer, AppState, ChatCompletionGenerator, Config, InMemoryTranscriptStore,
    JsonlTranscriptStore, LocalAnalyzer, NatsAnalyzer, ResponseGateway, ResponseGenerator,
    RouterDeps, ScriptedGenerator, SessionRegistry, SignalLog, TranscriptStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "interview-orchestrator")]
#[command(about = "Real-time interview session orchestrator", long_about = None)]
struct Args {
    /// Config file (without extension)
    #[arg(short, long, default_value = "config/interview-orchestrator")]
    config: String,

    /// Override the configured HTTP port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config))?;

    info!("Interview Orchestrator v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let transcripts: Arc<dyn TranscriptStore> = match cfg.storage.transcripts_dir() {
        Some(dir) => {
            info!("Transcripts: {}", dir.display());
            Arc::new(JsonlTranscriptStore::open(&dir).await?)
        }
        None => {
            info!("Transcripts: in memory");
            Arc::new(InMemoryTranscriptStore::new())
        }
    };

    let gateway = build_gateway(cfg.provider.clone(), &cfg);

    let signals = SignalLog::new();
    let analyzer: Arc<dyn Analyzer> = match &cfg.nats {
        Some(nats) => Arc::new(NatsAnalyzer::connect(&nats.url, signals.clone()).await?),
        None => Arc::new(LocalAnalyzer::new(signals.clone())),
    };
    info!("Analyzer: {}", analyzer.name());

    let recordings_dir = cfg.storage.recordings_dir();
    if let Some(dir) = &recordings_dir {
        info!("Recordings: {}", dir.display());
    }

    let deps = RouterDeps::new(
        transcripts,
        gateway,
        signals,
        analyzer,
        IngestConfig {
            queue_capacity: cfg.interview.analyzer_queue,
            submit_timeout: Duration::from_millis(cfg.interview.analyzer_timeout_ms),
        },
        cfg.interview.router_settings(recordings_dir),
    );

    let registry = SessionRegistry::new(deps);
    let _sweeper = registry.spawn_sweeper(SWEEP_INTERVAL);

    let state =
        AppState::new(registry).with_default_duration(cfg.interview.default_duration_minutes);
    let app = create_router(state);

    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", cfg.service.http.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_gateway(provider: Option<ProviderConfig>, cfg: &Config) -> ResponseGateway {
    let generator: Arc<dyn ResponseGenerator> = match provider {
        Some(provider) => {
            info!("Response provider: {} ({})", provider.model, provider.endpoint);
            Arc::new(ChatCompletionGenerator::new(provider))
        }
        None => {
            info!("Response provider: scripted");
            Arc::new(ScriptedGenerator::new())
        }
    };

    ResponseGateway::new(generator, cfg.interview.generation_timeout())
        .with_fallback(cfg.interview.fallback_response.clone())
}
