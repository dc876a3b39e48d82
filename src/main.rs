use anyhow::Result;
use geoverify::api;
use geoverify::config::Config;
use geoverify::LocationVerifier;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let shutdown = CancellationToken::new();
    let verifier = Arc::new(LocationVerifier::from_config(&config, shutdown.clone())?);
    info!(
        "Failure policy for unresolved IP lookups: {:?}",
        config.verification.failure_policy
    );

    let router = api::create_router(verifier);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Verification API listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received, cancelling in-flight lookups...");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
