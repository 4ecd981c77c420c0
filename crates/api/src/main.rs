//! Slotwise - appointment booking service
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::Context;
use slotwise_api::{init_tracing, router, AppContext};
use slotwise_infra::SyncScheduler;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => warn!(error = %err, "no .env file loaded"),
    }

    let config = slotwise_infra::config::load().context("failed to load configuration")?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let sync_enabled = config.sync.enabled;

    let ctx =
        Arc::new(AppContext::new(config).context("failed to initialise application context")?);

    let mut scheduler = SyncScheduler::new(Arc::clone(&ctx.sync));
    if sync_enabled {
        match scheduler.start().await {
            Ok(()) => {
                info!(cron = %scheduler.config().cron_expression, "calendar sync scheduler started")
            }
            Err(err) => error!(error = %err, "calendar sync scheduler failed to start"),
        }
    } else {
        info!("calendar sync disabled");
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Slotwise listening");

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if scheduler.is_running() {
        if let Err(err) = scheduler.stop().await {
            warn!(error = %err, "calendar sync scheduler did not stop cleanly");
        }
    }
    info!("Slotwise stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
