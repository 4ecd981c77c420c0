//! Agent, knowledge, sync and webhook routes.

mod support;

use std::io::Write;

use axum::http::StatusCode;
use serde_json::json;
use support::TestApp;

#[tokio::test]
async fn chat_requires_a_message() {
    let app = TestApp::new();
    let (_, token) = app.signed_in("agent@example.com").await;

    let empty = app
        .post_json("/api/v1/agent/chat", Some(&token), json!({ "message": "   " }))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let reply = app
        .post_json("/api/v1/agent/chat", Some(&token), json!({ "message": "hello there" }))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(!reply.body["message"].as_str().unwrap_or_default().is_empty());
    assert!(reply.body["context_id"].is_string());
}

#[tokio::test]
async fn agent_routes_need_a_session() {
    let app = TestApp::new();

    let response = app.post_json("/api/v1/agent/chat", None, json!({ "message": "hi" })).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn learned_answers_are_searchable() {
    let app = TestApp::new();
    let (_, token) = app.signed_in("learner@example.com").await;

    let learned = app
        .post_json(
            "/api/v1/agent/learn",
            Some(&token),
            json!({
                "message": "Can I book the rooftop terrace?",
                "intent": "logistics",
                "response": "Yes, level two.",
            }),
        )
        .await;
    assert_eq!(learned.status, StatusCode::OK);

    let found = app.get("/api/v1/agent/knowledge/search?q=book%20terrace", Some(&token)).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["query"], "book terrace");
    let relevant = found.body["relevant_qa"].as_array().expect("relevant list");
    assert!(relevant.iter().any(|qa| qa["answer"] == "Yes, level two."));
}

#[tokio::test]
async fn bulk_add_rejects_empty_payload() {
    let app = TestApp::new();
    let (_, token) = app.signed_in("bulk-qa@example.com").await;

    let response = app
        .post_json("/api/v1/agent/knowledge/bulk-add", Some(&token), json!({ "qa_pairs": [] }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn custom_qa_loads_inline_and_from_file() {
    let app = TestApp::new();
    let (_, token) = app.signed_in("loader@example.com").await;
    let before = app.get("/api/v1/agent/knowledge/stats", Some(&token)).await;
    let before_total = before.body["total_qa_pairs"].as_u64().expect("total count");

    let inline = app
        .post_json(
            "/api/v1/agent/knowledge/load-custom-qa",
            Some(&token),
            json!({
                "qa_content": "User: Can I bring a friend? Agent: Yes, add them to the invite.",
            }),
        )
        .await;
    assert_eq!(inline.status, StatusCode::OK, "inline load failed: {}", inline.body);
    assert_eq!(inline.body["success"], true);

    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().expect("temp file");
    writeln!(file, "User: Is there a dress code?\nAgent: No dress code.").expect("write knowledge");
    let from_file = app
        .post_json(
            "/api/v1/agent/knowledge/load-custom-qa",
            Some(&token),
            json!({ "source_path": file.path().display().to_string() }),
        )
        .await;
    assert_eq!(from_file.status, StatusCode::OK, "file load failed: {}", from_file.body);

    let after = app.get("/api/v1/agent/knowledge/stats", Some(&token)).await;
    assert!(after.body["total_qa_pairs"].as_u64().expect("total count") >= before_total + 2);

    let neither = app
        .post_json("/api/v1/agent/knowledge/load-custom-qa", Some(&token), json!({}))
        .await;
    assert_eq!(neither.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sync_status_for_unconnected_user() {
    let app = TestApp::new();
    let (_, token) = app.signed_in("sync@example.com").await;

    let status = app.get("/api/v1/calendar/sync/status", Some(&token)).await;

    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.body["calendar_connected"], false);
}

#[tokio::test]
async fn webhooks_skip_disabled_providers() {
    let app = TestApp::new();

    let microsoft = app
        .post_json("/api/v1/webhooks/microsoft-calendar", None, json!({ "id": "evt-1" }))
        .await;
    assert_eq!(microsoft.status, StatusCode::OK);
    assert_eq!(microsoft.body["processed"], false);

    let unknown = app
        .post_json("/api/v1/webhooks/google-calendar", None, json!({ "event_id": "nope" }))
        .await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(unknown.body["processed"], false);

    let health = app.get("/api/v1/webhooks/health", None).await;
    assert_eq!(health.body["providers"]["google"], true);
    assert_eq!(health.body["providers"]["microsoft"], false);
}
