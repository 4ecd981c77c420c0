use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use slotwise_core::availability::parse_slot_ids;
use slotwise_domain::{AvailabilitySlot, AvailabilitySlotUpdate, SlotCreated, SlotwiseError};

use super::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::utils::command_helpers::execute;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_slot).get(list_slots))
        .route("/available", get(bookable_slots))
        .route("/bulk-delete", delete(bulk_delete))
        .route("/generate", post(generate))
        .route("/check", get(check_range))
        .route("/{slot_id}", get(get_slot).put(update_slot).delete(delete_slot))
}

#[derive(Debug, Deserialize)]
pub struct CreateSlotRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_unavailable: bool,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteQuery {
    #[serde(default)]
    pub slot_ids: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub async fn create_slot(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateSlotRequest>,
) -> ApiResult<(StatusCode, Json<SlotCreated>)> {
    let created = execute("availability::create", || async {
        ctx.availability.create_slot(&user, request.start_time, request.end_time).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_slots(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<AvailabilitySlot>>> {
    execute("availability::list", || async {
        ctx.availability.list_slots(&user, query.include_unavailable).await
    })
    .await
    .map(Json)
}

pub async fn bookable_slots(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<AvailabilitySlot>>> {
    execute("availability::available", || async {
        ctx.availability.list_bookable_slots(user.id, None).await
    })
    .await
    .map(Json)
}

pub async fn get_slot(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slot_id): Path<i64>,
) -> ApiResult<Json<AvailabilitySlot>> {
    execute("availability::get", || async { ctx.availability.get_slot(&user, slot_id).await })
        .await
        .map(Json)
}

pub async fn update_slot(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slot_id): Path<i64>,
    Json(update): Json<AvailabilitySlotUpdate>,
) -> ApiResult<Json<AvailabilitySlot>> {
    execute("availability::update", || async {
        ctx.availability.update_slot(&user, slot_id, update).await
    })
    .await
    .map(Json)
}

pub async fn delete_slot(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slot_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let deletion = execute("availability::delete", || async {
        ctx.availability.delete_slot(&user, slot_id).await
    })
    .await?;
    Ok(Json(json!({
        "message": "Availability slot deleted successfully",
        "slot_id": deletion.slot_id,
        "calendar_deleted": deletion.calendar_deleted,
        "calendar_error": deletion.calendar_error,
    })))
}

/// `?slot_ids=1,2,3`
pub async fn bulk_delete(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<BulkDeleteQuery>,
) -> ApiResult<Json<Value>> {
    let report = execute("availability::bulk_delete", || async {
        let ids = parse_slot_ids(&query.slot_ids)?;
        ctx.availability.bulk_delete(&user, &ids).await
    })
    .await?;
    Ok(Json(json!({
        "message": format!("Deleted {} slots successfully", report.deleted),
        "deleted_count": report.deleted,
        "failed_count": report.failed,
        "calendar_deleted_count": report.calendar_deleted,
        "calendar_failed_count": report.calendar_failed,
        "failures": report.failures,
    })))
}

pub async fn generate(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<Value>> {
    let slots = execute("availability::generate", || async {
        ctx.availability.generate_from_calendar(&user, request.start_date, request.end_date).await
    })
    .await?;
    Ok(Json(json!({ "created_count": slots.len(), "slots": slots })))
}

pub async fn check_range(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<Value>> {
    let available = execute("availability::check", || async {
        if query.end <= query.start {
            return Err(SlotwiseError::InvalidInput("End time must be after start time".into()));
        }
        ctx.availability.check_time_range_available(user.id, query.start, query.end).await
    })
    .await?;
    Ok(Json(json!({ "start": query.start, "end": query.end, "available": available })))
}
