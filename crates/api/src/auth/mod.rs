//! Request authentication
//!
//! A request is authenticated by `Authorization: Bearer <jwt>` or by the
//! `access_token` cookie set at login, whose value is `Bearer <jwt>`
//! (URL-encoded or quoted).

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use slotwise_domain::User;

use crate::context::AppContext;
use crate::error::ApiError;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Authenticated, active user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppContext>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
        let user = ctx.users.current_user(&token).await?;
        Ok(Self(user))
    }
}

fn strip_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Bearer token from the Authorization header, falling back to the cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if let Some(token) = header.and_then(strip_bearer) {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name.trim() != ACCESS_TOKEN_COOKIE {
                return None;
            }
            let decoded = urlencoding::decode(value.trim().trim_matches('"')).ok()?;
            strip_bearer(&decoded).map(str::to_string)
        })
}

/// `Set-Cookie` value carrying the session token.
pub fn session_cookie(token: &str, max_age_minutes: i64) -> Option<HeaderValue> {
    let value = urlencoding::encode(&format!("Bearer {token}")).into_owned();
    HeaderValue::from_str(&format!(
        "{ACCESS_TOKEN_COOKIE}={value}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        max_age_minutes.max(0) * 60
    ))
    .ok()
}

/// `Set-Cookie` value that expires the session cookie.
pub fn cleared_cookie() -> HeaderValue {
    HeaderValue::from_static("access_token=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}
