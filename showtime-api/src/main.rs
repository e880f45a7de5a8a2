use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use showtime_api::{app, AppState};
use showtime_core::SystemClock;
use showtime_hold::ExpirySweeper;
use showtime_store::Config;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "showtime_api=debug,showtime_hold=info,showtime_booking=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("failed to load config")?;
    tracing::info!("Starting Showtime API on port {}", config.server.port);

    let state = AppState::from_config(&config, Arc::new(SystemClock)).context("invalid business rules")?;
    if state.auth.is_open() {
        tracing::warn!("No API keys configured, /v1 is open");
    }

    let shows = state.engine.register_catalog().await.context("failed to load show catalog")?;
    tracing::info!(
        "Hold TTL {}s, {} shows open for booking",
        state.engine.holds().ttl().num_seconds(),
        shows
    );

    let rules = &config.business_rules;

    // Expiry sweeper
    let shutdown = CancellationToken::new();
    let sweeper = ExpirySweeper::new(
        state.engine.holds().clone(),
        rules.sweep_interval(),
        rules.hold_retention().context("invalid business rules")?,
    )
    .spawn(shutdown.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    shutdown.cancel();
    sweeper.await.context("expiry sweeper panicked")?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
