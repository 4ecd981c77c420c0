//! Account, login and Google OAuth routes

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use slotwise_domain::{AccessToken, SlotwiseError, UserProfile};
use slotwise_infra::integrations::google::OAuthIntent;

use super::extract::JsonOrForm;
use super::AppState;
use crate::auth::{cleared_cookie, session_cookie, CurrentUser};
use crate::error::ApiResult;
use crate::utils::command_helpers::execute;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/login/access-token", post(login))
        .route("/logout", post(logout))
        .route("/verify-email", get(verify_email))
        .route("/google", get(google_sign_in))
        .route("/google/calendar", get(google_calendar))
        .route("/google/callback", get(google_callback))
        .route("/google/calendar/callback", get(google_callback))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Password login; `username` is accepted for OAuth2 password-form clients.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn with_session(ctx: &AppState, token: &AccessToken) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let max_age = ctx.config.auth.access_token_expire_minutes;
    if let Some(cookie) = session_cookie(&token.access_token, max_age) {
        headers.insert(SET_COOKIE, cookie);
    }
    headers
}

pub async fn register(
    State(ctx): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let user = execute("auth::register", || async {
        ctx.users.register(&request.email, &request.password, request.full_name.clone()).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

pub async fn login(
    State(ctx): State<AppState>,
    JsonOrForm(request): JsonOrForm<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let token = execute("auth::login", || async {
        ctx.users.login(&request.email, &request.password).await
    })
    .await?;
    Ok((with_session(&ctx, &token), Json(token)))
}

pub async fn logout() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cleared_cookie());
    (headers, Json(json!({ "message": "Logged out" })))
}

pub async fn verify_email(
    State(ctx): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> ApiResult<Json<Value>> {
    let user = execute("auth::verify_email", || async {
        ctx.users.verify_email(&query.token).await
    })
    .await?;
    Ok(Json(json!({ "message": "Email verified successfully", "user": UserProfile::from(&user) })))
}

pub async fn google_sign_in(State(ctx): State<AppState>) -> ApiResult<Json<Value>> {
    let url = execute("auth::google", || async { ctx.oauth.begin(OAuthIntent::SignIn) }).await?;
    Ok(Json(json!({ "authorization_url": url })))
}

/// Consent URL that also grants calendar access to the signed-in user.
pub async fn google_calendar(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let url = execute("auth::google_calendar", || async {
        ctx.oauth.begin(OAuthIntent::ConnectCalendar { user_id: user.id })
    })
    .await?;
    Ok(Json(json!({ "authorization_url": url })))
}

/// Completes either flow; the pending `state` says which one started it.
pub async fn google_callback(
    State(ctx): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<impl IntoResponse> {
    let outcome = execute("auth::google_callback", || async {
        if let Some(error) = query.error.as_deref() {
            return Err(SlotwiseError::Auth(format!("Google authorization failed: {error}")));
        }
        let code = query
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| SlotwiseError::InvalidInput("Missing authorization code".into()))?;
        let intent = query
            .state
            .as_deref()
            .and_then(|state| ctx.oauth.consume_state(state))
            .ok_or_else(|| SlotwiseError::Auth("Invalid or expired OAuth state".into()))?;

        let tokens = ctx.oauth.exchange_code(code, intent.wants_calendar()).await?;
        let profile = ctx.oauth.fetch_user_info(&tokens.access_token).await?;

        match intent {
            OAuthIntent::SignIn => {
                let user = ctx.users.google_login(&profile, &tokens).await?;
                let token = ctx.users.issue_token(&user)?;
                Ok((Some(token), user))
            }
            OAuthIntent::ConnectCalendar { user_id } => {
                let user = ctx.users.connect_calendar(user_id, Some(&profile.id), &tokens).await?;
                Ok((None, user))
            }
        }
    })
    .await?;

    let response = match outcome {
        (Some(token), user) => {
            let headers = with_session(&ctx, &token);
            let body = json!({
                "access_token": token.access_token,
                "token_type": token.token_type,
                "user": UserProfile::from(&user),
            });
            (headers, Json(body))
        }
        (None, user) => (
            HeaderMap::new(),
            Json(json!({
                "message": "Google Calendar connected successfully.",
                "user": UserProfile::from(&user),
            })),
        ),
    };
    Ok(response)
}
