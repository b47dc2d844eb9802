use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use voice_relay::analysis::ChatAnalyzer;
use voice_relay::http::{create_router, AppState, RelayLimits};
use voice_relay::scratch::ScratchStore;
use voice_relay::stt::WhisperClient;
use voice_relay::Config;

#[derive(Debug, Parser)]
#[command(name = "voice-relay", about = "Upload/transcribe relay for voice dictation")]
struct Args {
    /// Config file (without extension), overridable via VOICE_RELAY__* env vars
    #[arg(long, default_value = "config/voice-relay")]
    config: String,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("{} starting", cfg.service.name);

    let scratch = Arc::new(
        ScratchStore::new(&cfg.scratch.path, Duration::from_secs(cfg.scratch.ttl_secs))
            .context("Failed to open scratch store")?,
    );

    // A missing credential stops the relay here, not mid-flow.
    let stt = Arc::new(WhisperClient::new(
        &cfg.speech.api_key,
        &cfg.speech.model,
        &cfg.speech.language,
    )?);
    let analyzer = Arc::new(ChatAnalyzer::new(&cfg.speech.api_key, &cfg.analysis.model)?);

    let state = AppState {
        scratch,
        stt,
        analyzer,
        limits: Arc::new(RelayLimits {
            max_upload_bytes: cfg.audio.max_audio_bytes,
            allowed_types: cfg.audio.allowed_audio_types.clone(),
        }),
    };

    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router).await?;

    Ok(())
}
