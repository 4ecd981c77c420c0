//! Google Calendar v3 client for a user's primary calendar

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Method, Response};
use serde::{Deserialize, Serialize};
use slotwise_core::calendar::ports::CalendarClient;
use slotwise_domain::{CalendarEvent, EventPatch, NewCalendarEvent, Result};
use tracing::debug;

use super::errors::{GoogleApiError, GoogleResult};
use crate::http::HttpClient;

const PAGE_SIZE: &str = "250";

#[derive(Debug, Deserialize)]
struct EventsPage {
    #[serde(default)]
    items: Vec<CalendarEvent>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct EventDateTime {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: &'static str,
}

impl EventDateTime {
    fn utc(instant: DateTime<Utc>) -> Self {
        Self { date_time: rfc3339(instant), time_zone: "UTC" }
    }
}

#[derive(Debug, Serialize)]
struct Attendee<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct EventBody<'a> {
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    start: EventDateTime,
    end: EventDateTime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attendees: Vec<Attendee<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transparency: Option<&'a str>,
}

#[derive(Debug, Default, Serialize)]
struct PatchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<EventDateTime>,
}

fn rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Calendar client bound to one access token.
#[derive(Clone)]
pub struct GoogleCalendarClient {
    http: HttpClient,
    events_url: String,
    access_token: String,
}

impl GoogleCalendarClient {
    /// Client for one account's primary calendar.
    pub fn new(
        http: HttpClient,
        events_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self { http, events_url: events_url.into(), access_token: access_token.into() }
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url, urlencoding::encode(event_id))
    }

    async fn call(&self, builder: reqwest::RequestBuilder) -> GoogleResult<Response> {
        let response = self.http.send(builder.bearer_auth(&self.access_token)).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(GoogleApiError::from_response(response).await)
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> GoogleResult<T> {
        Ok(HttpClient::read_json(response).await?)
    }

    /// Every single event in the window, following page tokens.
    pub async fn fetch_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> GoogleResult<Vec<CalendarEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("timeMin", rfc3339(from)),
                ("timeMax", rfc3339(to)),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let request = self.http.request(Method::GET, &self.events_url).query(&query);
            let response = self.call(request).await?;
            let page: EventsPage = Self::decode(response).await?;
            events.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(count = events.len(), "fetched calendar events");
        Ok(events)
    }

    /// `None` when the event is missing or deleted.
    pub async fn fetch_event(&self, event_id: &str) -> GoogleResult<Option<CalendarEvent>> {
        match self.call(self.http.request(Method::GET, self.event_url(event_id))).await {
            Ok(response) => Ok(Some(Self::decode(response).await?)),
            Err(GoogleApiError::NotFound | GoogleApiError::Gone) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn insert_event(&self, event: &NewCalendarEvent) -> GoogleResult<CalendarEvent> {
        let body = EventBody {
            summary: &event.summary,
            description: event.description.as_deref(),
            start: EventDateTime::utc(event.start),
            end: EventDateTime::utc(event.end),
            attendees: event.attendees.iter().map(|email| Attendee { email }).collect(),
            transparency: event.transparency.as_deref(),
        };
        let request = self
            .http
            .request(Method::POST, &self.events_url)
            .query(&[("sendUpdates", "all")])
            .json(&body);
        Self::decode(self.call(request).await?).await
    }

    pub async fn patch_event(
        &self,
        event_id: &str,
        patch: &EventPatch,
    ) -> GoogleResult<CalendarEvent> {
        let body = PatchBody {
            summary: patch.summary.as_deref(),
            description: patch.description.as_deref(),
            start: patch.start.map(EventDateTime::utc),
            end: patch.end.map(EventDateTime::utc),
        };
        let request = self
            .http
            .request(Method::PATCH, self.event_url(event_id))
            .query(&[("sendUpdates", "all")])
            .json(&body);
        Self::decode(self.call(request).await?).await
    }

    /// Deleting an event that is already gone succeeds.
    pub async fn remove_event(&self, event_id: &str) -> GoogleResult<()> {
        let request = self
            .http
            .request(Method::DELETE, self.event_url(event_id))
            .query(&[("sendUpdates", "all")]);
        match self.call(request).await {
            Ok(_) | Err(GoogleApiError::NotFound | GoogleApiError::Gone) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    async fn list_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        Ok(self.fetch_events(from, to).await?)
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<CalendarEvent>> {
        Ok(self.fetch_event(event_id).await?)
    }

    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CalendarEvent> {
        Ok(self.insert_event(event).await?)
    }

    async fn update_event(&self, event_id: &str, patch: &EventPatch) -> Result<CalendarEvent> {
        Ok(self.patch_event(event_id, patch).await?)
    }

    async fn delete_event(&self, event_id: &str) -> Result<()> {
        Ok(self.remove_event(event_id).await?)
    }
}

