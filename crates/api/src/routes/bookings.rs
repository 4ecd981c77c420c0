use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use slotwise_domain::{
    Booking, BookingOutcome, BookingStatus, BookingUpdate, GuestDetails, RescheduleCheck,
    RescheduleErrorKind, SlotwiseError,
};

use super::extract::JsonOrForm;
use super::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::utils::command_helpers::execute;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/book-slot/{slot_id}", post(book_slot))
        .route("/upcoming", get(upcoming))
        .route("/{booking_id}", get(get_booking).put(update_booking).delete(cancel_booking))
        .route("/{booking_id}/reschedule", post(reschedule))
        .route("/{booking_id}/can-reschedule", get(can_reschedule))
        .route("/{booking_id}/email", post(email_guest))
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub availability_slot_id: i64,
    #[serde(flatten)]
    pub guest: GuestDetails,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status_filter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub new_start_time: DateTime<Utc>,
    pub new_end_time: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub subject: String,
    pub message: String,
}

/// Book one of the caller's own slots on behalf of a guest.
pub async fn create_booking(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let booking = execute("bookings::create", || async {
        let slot = ctx.availability.get_slot(&user, request.availability_slot_id).await?;
        ctx.bookings.create_booking(slot.id, request.guest).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Public booking of a slot by id; accepts the booking page form.
pub async fn book_slot(
    State(ctx): State<AppState>,
    Path(slot_id): Path<i64>,
    JsonOrForm(guest): JsonOrForm<GuestDetails>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let booking = execute("bookings::book_slot", || async {
        ctx.bookings.create_booking(slot_id, guest).await
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "booking": booking,
            "message":
                "Booking confirmed successfully! You will receive a confirmation email shortly.",
        })),
    ))
}

pub async fn list_bookings(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Booking>>> {
    execute("bookings::list", || async {
        let status = query
            .status_filter
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(BookingStatus::from_str)
            .transpose()
            .map_err(SlotwiseError::InvalidInput)?;
        ctx.bookings.list_bookings(&user, status).await
    })
    .await
    .map(Json)
}

pub async fn upcoming(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<Vec<Booking>>> {
    execute("bookings::upcoming", || async { ctx.bookings.upcoming(&user, query.limit).await })
        .await
        .map(Json)
}

pub async fn get_booking(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(booking_id): Path<i64>,
) -> ApiResult<Json<Booking>> {
    execute("bookings::get", || async { ctx.bookings.get_booking(&user, booking_id).await })
        .await
        .map(Json)
}

pub async fn update_booking(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(booking_id): Path<i64>,
    Json(update): Json<BookingUpdate>,
) -> ApiResult<Json<BookingOutcome>> {
    execute("bookings::update", || async {
        ctx.bookings.update_booking(&user, booking_id, update).await
    })
    .await
    .map(Json)
}

pub async fn cancel_booking(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(booking_id): Path<i64>,
) -> ApiResult<Json<BookingOutcome>> {
    execute("bookings::cancel", || async { ctx.bookings.cancel_booking(&user, booking_id).await })
        .await
        .map(Json)
}

const fn reschedule_status(kind: Option<RescheduleErrorKind>) -> StatusCode {
    match kind {
        None => StatusCode::OK,
        Some(RescheduleErrorKind::NotFound) => StatusCode::NOT_FOUND,
        Some(RescheduleErrorKind::InvalidStatus | RescheduleErrorKind::InvalidTime) => {
            StatusCode::BAD_REQUEST
        }
        Some(RescheduleErrorKind::DatabaseError) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Refusals keep the outcome body and carry a matching status code.
pub async fn reschedule(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(booking_id): Path<i64>,
    Json(request): Json<RescheduleRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = execute("bookings::reschedule", || async {
        let reason = request.reason.as_deref();
        let (start, end) = (request.new_start_time, request.new_end_time);
        Ok(ctx.reschedule.reschedule(&user, booking_id, start, end, reason).await)
    })
    .await?;
    Ok((reschedule_status(outcome.error_type), Json(outcome)))
}

pub async fn can_reschedule(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(booking_id): Path<i64>,
) -> ApiResult<Json<RescheduleCheck>> {
    execute("bookings::can_reschedule", || async {
        Ok(ctx.reschedule.can_reschedule(&user, booking_id).await)
    })
    .await
    .map(Json)
}

pub async fn email_guest(
    State(ctx): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(booking_id): Path<i64>,
    Json(request): Json<EmailRequest>,
) -> ApiResult<Json<Value>> {
    let sent = execute("bookings::email", || async {
        ctx.bookings.email_guest(&user, booking_id, &request.subject, &request.message).await
    })
    .await?;
    let message = if sent { "Email sent to guest" } else { "Email could not be delivered" };
    Ok(Json(json!({ "success": sent, "message": message })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reschedule_refusals_map_to_client_errors() {
        assert_eq!(reschedule_status(None), StatusCode::OK);
        assert_eq!(reschedule_status(Some(RescheduleErrorKind::NotFound)), StatusCode::NOT_FOUND);
        let invalid_time = reschedule_status(Some(RescheduleErrorKind::InvalidTime));
        assert_eq!(invalid_time, StatusCode::BAD_REQUEST);
    }
}
