use anyhow::{Context, Result};
use clap::Parser;
use live_translate::{
    create_router, AppState, CaptureConfig, Config, DefaultMicrophone, GatewaySpeechClient,
    SessionController,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "live-translate", about = "Live speech translation session service")]
struct Args {
    /// Configuration file (without extension); environment overrides apply
    #[arg(long, default_value = "config/live-translate")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v0.1.0", cfg.service.name);
    info!(
        "Languages: {:?} -> {:?}",
        cfg.speech.source_language, cfg.speech.target_language
    );

    let client = Arc::new(GatewaySpeechClient::new(cfg.speech.gateway_url.clone()));
    let microphone = Arc::new(DefaultMicrophone::new(CaptureConfig::default()));

    let controller = Arc::new(SessionController::new(
        client,
        microphone,
        cfg.credential(),
        cfg.speech.source_language,
        cfg.speech.target_language,
    ));

    // Arm the first session now so start has no load latency. A failure
    // (no microphone, empty credential) is reported and the service still
    // comes up; POST /session/stop re-arms once the cause is fixed.
    if let Err(e) = controller.reload().await {
        error!("Initial session load failed: {}", e);
    }

    let state = AppState::new(controller);
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, router)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
