//! Per-user calendar clients with transparent token refresh

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotwise_core::calendar::ports::{CalendarClient, CalendarGateway};
use slotwise_core::user::ports::UserRepository;
use slotwise_domain::{CalendarEvent, EventPatch, NewCalendarEvent, Result, SlotwiseError, User};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::calendar::GoogleCalendarClient;
use super::errors::{GoogleApiError, GoogleResult};
use super::oauth::GoogleOAuth;
use crate::http::HttpClient;

/// Builds [`RefreshingCalendarClient`]s for users with a linked calendar.
pub struct GoogleCalendarGateway {
    oauth: Arc<GoogleOAuth>,
    users: Arc<dyn UserRepository>,
    http: HttpClient,
    events_url: String,
}

impl GoogleCalendarGateway {
    pub fn new(
        oauth: Arc<GoogleOAuth>,
        users: Arc<dyn UserRepository>,
        http: HttpClient,
        events_url: impl Into<String>,
    ) -> Self {
        Self { oauth, users, http, events_url: events_url.into() }
    }
}

impl CalendarGateway for GoogleCalendarGateway {
    fn client_for(&self, user: &User) -> Option<Arc<dyn CalendarClient>> {
        if !user.has_calendar() {
            return None;
        }
        let access_token = user.google_access_token.clone()?;

        Some(Arc::new(RefreshingCalendarClient {
            user_id: user.id,
            refresh_token: user.google_refresh_token.clone(),
            access_token: RwLock::new(access_token),
            oauth: Arc::clone(&self.oauth),
            users: Arc::clone(&self.users),
            http: self.http.clone(),
            events_url: self.events_url.clone(),
        }))
    }
}

/// Calendar client that refreshes the access token once on a 401 and
/// persists the new token before retrying.
pub struct RefreshingCalendarClient {
    user_id: i64,
    refresh_token: Option<String>,
    access_token: RwLock<String>,
    oauth: Arc<GoogleOAuth>,
    users: Arc<dyn UserRepository>,
    http: HttpClient,
    events_url: String,
}

impl RefreshingCalendarClient {
    async fn client(&self) -> GoogleCalendarClient {
        let token = self.access_token.read().await.clone();
        GoogleCalendarClient::new(self.http.clone(), self.events_url.clone(), token)
    }

    async fn run<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(GoogleCalendarClient) -> Fut,
        Fut: Future<Output = GoogleResult<T>>,
    {
        match op(self.client().await).await {
            Err(GoogleApiError::Unauthorized) => {
                self.refresh().await?;
                op(self.client().await).await.map_err(Into::into)
            }
            other => other.map_err(Into::into),
        }
    }

    async fn refresh(&self) -> Result<()> {
        let Some(refresh_token) = self.refresh_token.as_deref() else {
            return Err(self.require_reconnect().await);
        };

        match self.oauth.refresh(refresh_token).await {
            Ok(tokens) => {
                self.users.update_access_token(self.user_id, &tokens.access_token).await?;
                *self.access_token.write().await = tokens.access_token;
                info!(user_id = self.user_id, "refreshed Google access token");
                Ok(())
            }
            Err(GoogleApiError::ReconnectRequired) => Err(self.require_reconnect().await),
            Err(err) => Err(err.into()),
        }
    }

    async fn require_reconnect(&self) -> SlotwiseError {
        warn!(user_id = self.user_id, "Google grant revoked; marking calendar disconnected");
        if let Err(err) = self.users.disconnect_calendar(self.user_id, false).await {
            log::error!("failed to clear calendar flag for user {}: {err}", self.user_id);
        }
        GoogleApiError::ReconnectRequired.into()
    }
}

#[async_trait]
impl CalendarClient for RefreshingCalendarClient {
    async fn list_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        self.run(|client| async move { client.fetch_events(from, to).await }).await
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<CalendarEvent>> {
        self.run(|client| async move { client.fetch_event(event_id).await }).await
    }

    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CalendarEvent> {
        self.run(|client| async move { client.insert_event(event).await }).await
    }

    async fn update_event(&self, event_id: &str, patch: &EventPatch) -> Result<CalendarEvent> {
        self.run(|client| async move { client.patch_event(event_id, patch).await }).await
    }

    async fn delete_event(&self, event_id: &str) -> Result<()> {
        self.run(|client| async move { client.remove_event(event_id).await }).await
    }
}
