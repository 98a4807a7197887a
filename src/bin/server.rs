use anyhow::{Context, Result};
use llamareview::{
    api::{create_app, AppState},
    logging, Config,
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_server_tracing("info")?;

    let config = Config::load().context("failed to load configuration")?;
    config.validate()?;
    let addr = config.server.socket_addr()?;

    info!(
        "LlamaReview server starting (GitHub API {}, model {} via {})",
        config.github.api_base, config.llm.model, config.llm.provider
    );

    let state = AppState::from_config(config)?;
    let app = create_app(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
