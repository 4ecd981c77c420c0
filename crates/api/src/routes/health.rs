use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use super::AppState;
use crate::utils::logging::log_command_execution;

/// Liveness plus database reachability
pub async fn health(State(ctx): State<AppState>) -> (StatusCode, Json<Value>) {
    let start = Instant::now();
    let db = ctx.db.clone();
    let check = tokio::task::spawn_blocking(move || db.health_check()).await;
    let healthy = matches!(check, Ok(Ok(())));
    log_command_execution("health::check", start.elapsed(), healthy);

    if healthy {
        let body = json!({
            "status": "healthy",
            "database": "connected",
            "version": env!("CARGO_PKG_VERSION"),
        });
        return (StatusCode::OK, Json(body));
    }

    match check {
        Ok(Err(err)) => error!(error = %err, "database health check failed"),
        Err(err) => error!(error = %err, "database health check task failed"),
        Ok(Ok(())) => {}
    }
    let body = json!({
        "status": "unhealthy",
        "database": "unreachable",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::SERVICE_UNAVAILABLE, Json(body))
}
