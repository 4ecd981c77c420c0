//! Provider push notifications (no authentication)

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use slotwise_core::sync::GOOGLE_PROVIDER;
use slotwise_domain::WebhookOutcome;

use super::AppState;
use crate::error::ApiResult;
use crate::utils::command_helpers::execute;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/google-calendar", post(google_calendar))
        .route("/microsoft-calendar", post(microsoft_calendar))
        .route("/health", get(health))
}

pub async fn google_calendar(
    State(ctx): State<AppState>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<WebhookOutcome>> {
    execute("webhooks::google", || async {
        ctx.sync.handle_webhook(GOOGLE_PROVIDER, &payload).await
    })
    .await
    .map(Json)
}

pub async fn microsoft_calendar(
    State(ctx): State<AppState>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<WebhookOutcome>> {
    execute("webhooks::microsoft", || async {
        ctx.sync.handle_webhook("microsoft", &payload).await
    })
    .await
    .map(Json)
}

pub async fn health(State(ctx): State<AppState>) -> Json<Value> {
    let sync = ctx.sync.config();
    Json(json!({
        "status": "healthy",
        "providers": {
            "google": sync.is_provider_enabled(GOOGLE_PROVIDER),
            "microsoft": sync.is_provider_enabled("microsoft"),
        },
    }))
}
