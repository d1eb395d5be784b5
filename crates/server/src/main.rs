use std::sync::Arc;

use anyhow::Context;
use pdfsum_pipeline::{ModelSet, Orchestrator};
use pdfsum_server::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn load_config() -> pdfsum_core::Config {
    pdfsum_core::config::load_dotenv();
    pdfsum_core::Config::from_env()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let config = load_config();
    config.log_summary();

    let models = ModelSet::initialize(&config).await;
    let orchestrator = Orchestrator::from_config(&config, models);

    let mut state = AppState::new(orchestrator, config.server.max_upload_bytes());
    state.cors_origin = config.server.cors_origin.clone();
    let app = build_router(Arc::new(state));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
