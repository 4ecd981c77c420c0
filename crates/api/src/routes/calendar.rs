use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use slotwise_domain::UserProfile;
use slotwise_infra::integrations::google::OAuthIntent;

use super::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::utils::command_helpers::execute;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(events))
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
}

/// Live events from the user's Google calendar
pub async fn events(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let events = execute("calendar::events", || async {
        ctx.agent.calendar_events(&user).await
    })
    .await?;
    Ok(Json(json!({ "events": events })))
}

pub async fn connect(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let url = execute("calendar::connect", || async {
        ctx.oauth.begin(OAuthIntent::ConnectCalendar { user_id: user.id })
    })
    .await?;
    Ok(Json(json!({ "authorization_url": url })))
}

pub async fn disconnect(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let user = execute("calendar::disconnect", || async {
        ctx.users.disconnect_calendar(user.id).await
    })
    .await?;
    Ok(Json(json!({
        "message": "Google Calendar disconnected.",
        "user": UserProfile::from(&user),
    })))
}
