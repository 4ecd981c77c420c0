//! Calendar sync triggers, mounted under `/calendar`

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use slotwise_domain::{FailedSyncReport, PullReport, UserSyncReport, UserSyncStatus};

use super::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::utils::command_helpers::execute;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync/retry/{booking_id}", post(retry_booking))
        .route("/sync/retry-failed", post(retry_failed))
        .route("/sync/status", get(status))
        .route("/sync/force-sync", post(force_sync))
        .route("/sync/pull-from-calendar", post(pull_from_calendar))
}

pub async fn retry_booking(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(booking_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let booking =
        execute("sync::retry", || async { ctx.sync.retry_booking(&user, booking_id).await })
            .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Booking {booking_id} synced to calendar"),
        "booking": booking,
    })))
}

pub async fn retry_failed(
    State(ctx): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> ApiResult<Json<FailedSyncReport>> {
    execute("sync::retry_failed", || async { ctx.sync.sync_failed_bookings().await })
        .await
        .map(Json)
}

pub async fn status(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<UserSyncStatus>> {
    execute("sync::status", || async { ctx.sync.user_sync_status(&user).await }).await.map(Json)
}

pub async fn force_sync(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<UserSyncReport>> {
    execute("sync::force", || async { ctx.sync.force_sync(&user).await }).await.map(Json)
}

pub async fn pull_from_calendar(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<PullReport>> {
    execute("sync::pull", || async { ctx.sync.pull_from_calendar(&user).await }).await.map(Json)
}
