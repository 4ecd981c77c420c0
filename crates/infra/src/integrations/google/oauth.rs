//! Google OAuth2 authorization-code flow
//!
//! Pending `state` values live in a short-lived moka cache so the callback
//! can tell a sign-in apart from a calendar connection.

use std::time::Duration;

use moka::sync::Cache;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use slotwise_domain::{GoogleConfig, GoogleProfile, GoogleTokens, Result, SlotwiseError};
use tracing::{debug, warn};
use url::Url;

use super::errors::{GoogleApiError, GoogleResult};
use super::GoogleEndpoints;
use crate::http::HttpClient;

const LOGIN_SCOPES: &str = "openid email profile";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
const STATE_TTL: Duration = Duration::from_secs(10 * 60);
const MAX_PENDING_STATES: u64 = 10_000;

/// What the user was doing when they were sent to Google
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthIntent {
    SignIn,
    ConnectCalendar { user_id: i64 },
}

impl OAuthIntent {
    pub const fn wants_calendar(self) -> bool {
        matches!(self, Self::ConnectCalendar { .. })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl From<TokenResponse> for GoogleTokens {
    fn from(value: TokenResponse) -> Self {
        Self {
            access_token: value.access_token,
            refresh_token: value.refresh_token,
            expires_in: value.expires_in,
        }
    }
}

pub struct GoogleOAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    calendar_redirect_uri: String,
    endpoints: GoogleEndpoints,
    http: HttpClient,
    pending: Cache<String, OAuthIntent>,
}

impl GoogleOAuth {
    pub fn new(config: &GoogleConfig, http: HttpClient) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            calendar_redirect_uri: config.calendar_callback().to_string(),
            endpoints: GoogleEndpoints::default(),
            http,
            pending: Cache::builder()
                .max_capacity(MAX_PENDING_STATES)
                .time_to_live(STATE_TTL)
                .build(),
        }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    fn redirect_for(&self, calendar_scope: bool) -> &str {
        if calendar_scope {
            &self.calendar_redirect_uri
        } else {
            &self.redirect_uri
        }
    }

    /// Consent URL for `state`; calendar access is requested on top of the
    /// sign-in scopes when `calendar_scope` is set.
    pub fn authorization_url(&self, state: &str, calendar_scope: bool) -> Result<String> {
        let scope = if calendar_scope {
            format!("{LOGIN_SCOPES} {CALENDAR_SCOPE}")
        } else {
            LOGIN_SCOPES.to_string()
        };

        let url = Url::parse_with_params(
            &self.endpoints.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_for(calendar_scope)),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|err| {
            SlotwiseError::Config(format!("invalid Google authorization endpoint: {err}"))
        })?;

        Ok(url.into())
    }

    /// Register a fresh state for `intent` and return the consent URL.
    pub fn begin(&self, intent: OAuthIntent) -> Result<String> {
        if !self.is_configured() {
            return Err(SlotwiseError::Config("Google OAuth is not configured".into()));
        }
        let state = hex::encode(rand::random::<[u8; 16]>());
        let url = self.authorization_url(&state, intent.wants_calendar())?;
        self.pending.insert(state, intent);
        Ok(url)
    }

    /// Single-use lookup of a pending state.
    pub fn consume_state(&self, state: &str) -> Option<OAuthIntent> {
        self.pending.remove(state)
    }

    pub async fn exchange_code(&self, code: &str, calendar_scope: bool) -> Result<GoogleTokens> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_for(calendar_scope)),
        ];
        let request = self.http.request(Method::POST, &self.endpoints.token_url).form(&form);
        let response = self.http.send(request).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "authorization code exchange rejected");
            debug!(body = %body, "token endpoint response");
            return Err(SlotwiseError::Auth("Failed to exchange authorization code".into()));
        }

        let tokens: TokenResponse = HttpClient::read_json(response).await?;
        Ok(tokens.into())
    }

    pub async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleProfile> {
        let request =
            self.http.request(Method::GET, &self.endpoints.userinfo_url).bearer_auth(access_token);
        let response = self.http.send(request).await?;

        if !response.status().is_success() {
            return Err(SlotwiseError::Auth("Failed to fetch Google user info".into()));
        }
        HttpClient::read_json(response).await
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Google answers 400 (`invalid_grant`) once the grant is revoked.
    pub async fn refresh(&self, refresh_token: &str) -> GoogleResult<GoogleTokens> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let request = self.http.request(Method::POST, &self.endpoints.token_url).form(&form);
        let response = self.http.send(request).await?;

        match response.status() {
            status if status.is_success() => {
                let tokens: TokenResponse = HttpClient::read_json(response).await?;
                Ok(tokens.into())
            }
            StatusCode::BAD_REQUEST => Err(GoogleApiError::ReconnectRequired),
            _ => Err(GoogleApiError::from_response(response).await),
        }
    }
}
