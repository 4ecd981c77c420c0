//! Guest-facing booking page endpoints (no authentication)

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use slotwise_domain::utils::timezone::parse_date;
use slotwise_domain::{AvailabilitySlot, Booking, GuestDetails, HostProfile};

use super::AppState;
use crate::error::ApiResult;
use crate::utils::command_helpers::execute;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{slug}", get(host_profile))
        .route("/{slug}/availability", get(availability))
        .route("/{slug}/book", post(book))
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct PublicBookingRequest {
    pub date: String,
    pub time: String,
    #[serde(flatten)]
    pub guest: GuestDetails,
}

#[derive(Debug, Serialize)]
pub struct PublicSlot {
    pub id: i64,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub duration: i64,
}

impl From<&AvailabilitySlot> for PublicSlot {
    fn from(slot: &AvailabilitySlot) -> Self {
        Self {
            id: slot.id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            duration: slot.duration_minutes(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicAvailability {
    pub date: String,
    pub available_slots: Vec<PublicSlot>,
}

/// Public profile behind a booking link.
pub async fn host_profile(
    State(ctx): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<HostProfile>> {
    let host = execute("public::host", || async { ctx.users.get_by_slug(&slug).await }).await?;
    Ok(Json(HostProfile::from(&host)))
}

/// Open future slots on one calendar date.
pub async fn availability(
    State(ctx): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<PublicAvailability>> {
    execute("public::availability", || async {
        let date = parse_date(&query.date)?;
        let host = ctx.users.get_by_slug(&slug).await?;
        let slots = ctx.availability.slots_for_date(&host, date).await?;
        Ok(PublicAvailability {
            date: date.format("%Y-%m-%d").to_string(),
            available_slots: slots.iter().map(PublicSlot::from).collect(),
        })
    })
    .await
    .map(Json)
}

pub async fn book(
    State(ctx): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<PublicBookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let booking = execute("public::book", || async {
        ctx.bookings.book_public(&slug, &request.date, &request.time, request.guest).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}
