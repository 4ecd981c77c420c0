//! Google Calendar client and refreshing gateway against a mock server.

mod support;

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use slotwise_core::{CalendarClient, CalendarGateway, UserRepository};
use slotwise_domain::{NewCalendarEvent, SlotwiseError};
use slotwise_infra::integrations::google::{
    GoogleCalendarClient, GoogleCalendarGateway, GoogleEndpoints, GoogleOAuth,
};
use support::{connected_user, google_config, test_http, TestDatabase};
use wiremock::matchers::{
    body_string_contains, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const EVENTS_PATH: &str = "/calendars/primary/events";

fn event_json(id: &str, summary: &str) -> serde_json::Value {
    json!({
        "id": id,
        "summary": summary,
        "start": { "dateTime": "2030-05-01T10:00:00Z" },
        "end": { "dateTime": "2030-05-01T10:30:00Z" },
        "status": "confirmed"
    })
}

fn client(server: &MockServer, token: &str) -> GoogleCalendarClient {
    GoogleCalendarClient::new(test_http(), format!("{}{EVENTS_PATH}", server.uri()), token)
}

#[tokio::test]
async fn list_events_follows_page_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param_is_missing("pageToken"))
        .and(query_param("singleEvents", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [event_json("evt-1", "First")],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [event_json("evt-2", "Second")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let from = Utc.with_ymd_and_hms(2030, 5, 1, 0, 0, 0).unwrap();
    let until = from + Duration::days(1);
    let events = client(&server, "token").list_events(from, until).await.unwrap();

    let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["evt-1", "evt-2"]);
    let ten_am = Utc.with_ymd_and_hms(2030, 5, 1, 10, 0, 0).unwrap();
    assert_eq!(events[0].start.start_instant(), Some(ten_am));
}

#[tokio::test]
async fn missing_events_are_none_and_deletes_are_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{EVENTS_PATH}/gone-1")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{EVENTS_PATH}/gone-1")))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&server)
        .await;

    let calendar = client(&server, "token");

    assert!(calendar.get_event("gone-1").await.unwrap().is_none());
    calendar.delete_event("gone-1").await.unwrap();
}

#[tokio::test]
async fn create_event_sends_attendees_and_notifies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EVENTS_PATH))
        .and(query_param("sendUpdates", "all"))
        .and(header("Authorization", "Bearer token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(event_json("evt-new", "Meeting with Ada")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2030, 5, 1, 10, 0, 0).unwrap();
    let created = client(&server, "token")
        .create_event(&NewCalendarEvent {
            summary: "Meeting with Ada".into(),
            description: Some("Booked via Slotwise".into()),
            start,
            end: start + Duration::minutes(30),
            attendees: vec!["ada@example.com".into()],
            transparency: None,
        })
        .await
        .unwrap();

    assert_eq!(created.id, "evt-new");
    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["attendees"][0]["email"], "ada@example.com");
    assert_eq!(body["start"]["dateTime"], "2030-05-01T10:00:00Z");
    assert_eq!(body["start"]["timeZone"], "UTC");
}

#[tokio::test]
async fn server_errors_surface_as_calendar_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad patch"))
        .mount(&server)
        .await;

    let err =
        client(&server, "token").update_event("evt-1", &Default::default()).await.unwrap_err();

    assert!(matches!(
        err,
        SlotwiseError::Calendar(msg) if msg.contains("400") && msg.contains("bad patch")
    ));
}

fn gateway(server: &MockServer, db: &TestDatabase) -> GoogleCalendarGateway {
    let endpoints = GoogleEndpoints::with_base(&server.uri());
    let events_url = endpoints.events_url.clone();
    let oauth = Arc::new(GoogleOAuth::new(&google_config(), test_http()).with_endpoints(endpoints));
    GoogleCalendarGateway::new(oauth, db.users(), test_http(), events_url)
}

#[tokio::test]
async fn gateway_refreshes_once_and_persists_the_new_token() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    let users = db.users();
    let user = connected_user(&users, "stale", Some("refresh-1")).await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [event_json("evt-1", "Busy")] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let calendar = gateway(&server, &db).client_for(&user).expect("calendar is connected");
    let now = Utc::now();
    let events = calendar.list_events(now, now + Duration::days(1)).await.unwrap();

    assert_eq!(events.len(), 1);
    let stored = users.get_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.google_access_token.as_deref(), Some("fresh"));
    assert_eq!(stored.google_refresh_token.as_deref(), Some("refresh-1"));
    assert!(stored.google_calendar_connected);
}

#[tokio::test]
async fn revoked_grant_disconnects_the_calendar() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    let users = db.users();
    let user = connected_user(&users, "stale", Some("revoked")).await;

    Mock::given(method("GET"))
        .and(path(format!("{EVENTS_PATH}/evt-1")))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .expect(1)
        .mount(&server)
        .await;

    let calendar = gateway(&server, &db).client_for(&user).expect("calendar is connected");
    let err = calendar.get_event("evt-1").await.unwrap_err();

    assert_eq!(err, SlotwiseError::Calendar("reconnection required".into()));
    let stored = users.get_by_id(user.id).await.unwrap().unwrap();
    assert!(!stored.google_calendar_connected);
    assert_eq!(stored.google_refresh_token.as_deref(), Some("revoked"));
}

#[tokio::test]
async fn users_without_a_calendar_get_no_client() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    let users = db.users();
    let user = connected_user(&users, "token", None).await;
    users.disconnect_calendar(user.id, true).await.unwrap();
    let offline = users.get_by_id(user.id).await.unwrap().unwrap();

    assert!(gateway(&server, &db).client_for(&offline).is_none());
    assert!(gateway(&server, &db).client_for(&user).is_some());
}
