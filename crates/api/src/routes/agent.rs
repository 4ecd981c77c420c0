//! Chat agent and knowledge base endpoints

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use slotwise_core::knowledge::DEFAULT_SEARCH_LIMIT;
use slotwise_domain::{
    AgentResponse, AgentStats, Booking, CategorizedQaPair, KnowledgeStats, QaPair, ScheduleRequest,
    SchedulingInsights, SlotwiseError,
};
use slotwise_infra::knowledge::load_knowledge_file;

use super::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::utils::command_helpers::execute;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/stats", get(stats))
        .route("/conversation/{context_id}", get(conversation).delete(clear_conversation))
        .route("/schedule", post(schedule))
        .route("/availability", get(availability))
        .route("/insights", get(insights))
        .route("/capabilities", get(capabilities))
        .route("/learn", post(learn))
        .route("/knowledge", get(knowledge))
        .route("/knowledge/search", get(search_knowledge))
        .route("/knowledge/search/advanced", get(search_knowledge_advanced))
        .route("/knowledge/stats", get(knowledge_stats))
        .route("/knowledge/add", post(add_knowledge))
        .route("/knowledge/bulk-add", post(bulk_add_knowledge))
        .route("/knowledge/load", post(load_knowledge))
        .route("/knowledge/load-custom-qa", post(load_custom_qa))
        .route("/calendar/events", get(calendar_events))
        .route("/status", get(status))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub context_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct LearnRequest {
    pub message: String,
    #[serde(default)]
    pub intent: Option<String>,
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(alias = "query")]
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BulkAddRequest {
    #[serde(default)]
    pub qa_pairs: Vec<CategorizedQaPair>,
}

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    pub source_path: String,
}

/// Custom Q&A text, given inline or as a server-side path.
#[derive(Debug, Deserialize)]
pub struct CustomQaRequest {
    #[serde(default)]
    pub qa_content: Option<String>,
    #[serde(default)]
    pub source_path: Option<String>,
}

pub async fn chat(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<AgentResponse>> {
    execute("agent::chat", || async {
        if request.message.trim().is_empty() {
            return Err(SlotwiseError::InvalidInput("Message is required".into()));
        }
        Ok(ctx.agent.process_message(&user, &request.message, request.context_id.clone()).await)
    })
    .await
    .map(Json)
}

pub async fn stats(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<AgentStats>> {
    execute("agent::stats", || async { ctx.agent.agent_stats(&user).await }).await.map(Json)
}

pub async fn conversation(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(context_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let turns = execute("agent::conversation", || async {
        ctx.agent.conversation_history(&user, &context_id).await
    })
    .await?;
    Ok(Json(json!({ "context_id": context_id, "conversation": turns })))
}

pub async fn clear_conversation(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(context_id): Path<String>,
) -> ApiResult<Json<Value>> {
    execute("agent::clear_conversation", || async {
        ctx.agent.clear_conversation(&user, &context_id).await
    })
    .await?;
    Ok(Json(json!({ "message": "Conversation cleared successfully" })))
}

pub async fn schedule(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ScheduleRequest>,
) -> ApiResult<Json<Value>> {
    let booking: Booking =
        execute("agent::schedule", || async { ctx.agent.agent_schedule(&user, request).await })
            .await?;
    Ok(Json(json!({
        "message": format!("Meeting scheduled successfully with {}", booking.guest_name),
        "booking": booking,
    })))
}

pub async fn availability(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Value>> {
    let slots = execute("agent::availability", || async {
        ctx.agent.availability(&user, query.date).await
    })
    .await?;
    Ok(Json(json!({ "total_slots": slots.len(), "available_slots": slots })))
}

pub async fn insights(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<SchedulingInsights>> {
    execute("agent::insights", || async { ctx.agent.insights(&user).await }).await.map(Json)
}

pub async fn capabilities(
    State(ctx): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Json<Value> {
    Json(ctx.agent.capabilities())
}

pub async fn learn(
    State(ctx): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(request): Json<LearnRequest>,
) -> ApiResult<Json<Value>> {
    let pair = execute("agent::learn", || async {
        ctx.agent.learn(&request.message, request.intent.as_deref(), &request.response)
    })
    .await?;
    Ok(Json(json!({ "message": "Knowledge added successfully", "qa_pair": pair })))
}

pub async fn knowledge(
    State(ctx): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<CategoryQuery>,
) -> Json<Value> {
    let snapshot = ctx.agent.knowledge_snapshot();
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let qa: Vec<&QaPair> = match category {
        Some(name) => {
            snapshot.categories.get(name).map(|pairs| pairs.iter().collect()).unwrap_or_default()
        }
        None => snapshot.categories.values().flatten().collect(),
    };
    Json(json!({
        "qa": qa,
        "patterns": snapshot.common_patterns(category),
        "best_practices": snapshot.best_practices(category),
        "categories": snapshot.categories.keys().collect::<Vec<_>>(),
    }))
}

pub async fn search_knowledge(
    State(ctx): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Json<Value> {
    let similar = ctx.agent.search_knowledge(&query.q);
    let relevant = ctx.agent.knowledge_snapshot().relevant_qa(&query.q, None);
    Json(json!({ "query": query.q, "similar_questions": similar, "relevant_qa": relevant }))
}

pub async fn search_knowledge_advanced(
    State(ctx): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Json<Value> {
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let results = ctx.agent.search_knowledge_advanced(&query.q, limit);
    Json(json!({ "query": query.q, "total_results": results.len(), "results": results }))
}

pub async fn knowledge_stats(
    State(ctx): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Json<KnowledgeStats> {
    Json(ctx.agent.knowledge_stats())
}

pub async fn add_knowledge(
    State(ctx): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(item): Json<CategorizedQaPair>,
) -> ApiResult<Json<Value>> {
    execute("agent::knowledge_add", || async {
        ctx.agent.add_knowledge(&item.category, item.pair)
    })
    .await?;
    Ok(Json(json!({ "success": true, "message": "Q&A pair added successfully" })))
}

pub async fn bulk_add_knowledge(
    State(ctx): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(request): Json<BulkAddRequest>,
) -> ApiResult<Json<Value>> {
    let added = execute("agent::knowledge_bulk_add", || async {
        if request.qa_pairs.is_empty() {
            return Err(SlotwiseError::InvalidInput("No Q&A pairs provided".into()));
        }
        ctx.agent.bulk_add_knowledge(request.qa_pairs)
    })
    .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Added {added} Q&A pairs successfully"),
        "stats": ctx.agent.knowledge_stats(),
    })))
}

/// Merge a json, csv or custom Q&A file from the server's filesystem.
pub async fn load_knowledge(
    State(ctx): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(request): Json<LoadRequest>,
) -> ApiResult<Json<Value>> {
    let stats = execute("agent::knowledge_load", || async {
        let path = request.source_path.clone();
        let categories = tokio::task::spawn_blocking(move || load_knowledge_file(path))
            .await
            .map_err(|err| SlotwiseError::Internal(format!("knowledge load task failed: {err}")))??;
        Ok(ctx.agent.merge_knowledge(categories))
    })
    .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Knowledge base loaded successfully",
        "stats": stats,
    })))
}

pub async fn load_custom_qa(
    State(ctx): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(request): Json<CustomQaRequest>,
) -> ApiResult<Json<Value>> {
    let stats = execute("agent::knowledge_load_custom_qa", || async {
        let content = match (request.qa_content.as_deref(), request.source_path.as_deref()) {
            (Some(content), _) if !content.trim().is_empty() => content.to_string(),
            (_, Some(path)) if !path.trim().is_empty() => tokio::fs::read_to_string(path)
                .await
                .map_err(|err| SlotwiseError::NotFound(format!("Knowledge file {path}: {err}")))?,
            _ => {
                return Err(SlotwiseError::InvalidInput(
                    "Provide qa_content or source_path".into(),
                ))
            }
        };
        ctx.agent.load_custom_qa(&content)
    })
    .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Knowledge base loaded successfully from custom Q&A format",
        "stats": stats,
    })))
}

/// Bookings mirrored to the calendar, shaped as events
pub async fn calendar_events(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let events = execute("agent::calendar_events", || async {
        ctx.bookings.calendar_events(&user).await
    })
    .await?;
    Ok(Json(json!({ "events": events })))
}

pub async fn status(State(ctx): State<AppState>, CurrentUser(user): CurrentUser) -> Json<Value> {
    let mut status = ctx.agent.status();
    if let Value::Object(map) = &mut status {
        map.insert("user_id".to_string(), json!(user.id));
        map.insert("capabilities".to_string(), ctx.agent.capabilities());
    }
    Json(status)
}
