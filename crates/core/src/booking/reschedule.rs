//! Moving confirmed bookings to a new time

use std::sync::Arc;

use chrono::{DateTime, Utc};
use slotwise_domain::{
    Booking, BookingStatus, RescheduleCheck, RescheduleErrorKind, RescheduleOutcome, SyncStatus,
    User,
};
use tracing::{info, instrument, warn};

use super::mirror::{apply_mark, booking_event, booking_patch, failed_mark, synced_mark};
use super::ports::BookingRepository;
use crate::calendar::CalendarGateway;
use crate::notifications::Notifier;

fn rescheduled_description(booking: &Booking) -> String {
    let mut description = format!(
        "Rescheduled meeting with {}\n\nGuest: {}\nEmail: {}",
        booking.guest_name, booking.guest_name, booking.guest_email
    );
    if let Some(message) = booking.guest_message.as_deref().filter(|m| !m.is_empty()) {
        description.push_str("\nMessage: ");
        description.push_str(message);
    }
    description
}

/// Moves confirmed bookings and their calendar events
pub struct RescheduleService {
    bookings: Arc<dyn BookingRepository>,
    calendars: Arc<dyn CalendarGateway>,
    notifier: Notifier,
}

impl RescheduleService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        calendars: Arc<dyn CalendarGateway>,
        notifier: Notifier,
    ) -> Self {
        Self { bookings, calendars, notifier }
    }

    async fn owned(&self, user: &User, booking_id: i64) -> Result<Booking, RescheduleOutcome> {
        match self.bookings.get(booking_id).await {
            Ok(Some(booking)) if booking.host_user_id == user.id => Ok(booking),
            Ok(_) => {
                Err(RescheduleOutcome::refused(RescheduleErrorKind::NotFound, "Booking not found"))
            }
            Err(err) => {
                Err(RescheduleOutcome::refused(RescheduleErrorKind::DatabaseError, err.message()))
            }
        }
    }

    /// Refusals are reported through `error_type` rather than as errors.
    #[instrument(skip(self, user, reason), fields(user_id = user.id))]
    pub async fn reschedule(
        &self,
        user: &User,
        booking_id: i64,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
        reason: Option<&str>,
    ) -> RescheduleOutcome {
        let mut booking = match self.owned(user, booking_id).await {
            Ok(booking) => booking,
            Err(refusal) => return refusal,
        };
        if booking.status != BookingStatus::Confirmed {
            return RescheduleOutcome::refused(
                RescheduleErrorKind::InvalidStatus,
                format!("Cannot reschedule a {} booking", booking.status),
            );
        }
        if new_end <= new_start {
            return RescheduleOutcome::refused(
                RescheduleErrorKind::InvalidTime,
                "End time must be after start time",
            );
        }

        let old_start = booking.start_time;
        let original_event_id = booking.google_event_id.clone();
        booking.start_time = new_start;
        booking.end_time = new_end;
        booking.status = BookingStatus::Rescheduled;
        if let Err(err) = self.bookings.update(&booking).await {
            return RescheduleOutcome::refused(RescheduleErrorKind::DatabaseError, err.message());
        }

        let (calendar_updated, calendar_error) =
            self.move_event(user, &mut booking, original_event_id).await;

        let reason = reason.filter(|r| !r.trim().is_empty()).unwrap_or("No reason provided");
        let emails_sent =
            self.notifier.booking_rescheduled(user, &booking, old_start, reason).await;
        info!(booking_id, calendar_updated, emails_sent, "booking rescheduled");

        RescheduleOutcome {
            success: true,
            message: "Booking rescheduled successfully".to_string(),
            error_type: None,
            booking: Some(booking),
            calendar_updated,
            calendar_error,
            emails_sent,
        }
    }

    /// Patch the linked event or recreate it; on failure the original id stays linked
    async fn move_event(
        &self,
        user: &User,
        booking: &mut Booking,
        original_event_id: Option<String>,
    ) -> (bool, Option<String>) {
        let Some(calendar) = self.calendars.client_for(user) else {
            return (false, None);
        };

        let existing = match original_event_id.as_deref() {
            Some(id) => calendar.get_event(id).await.map(|event| event.map(|e| e.id)),
            None => Ok(None),
        };
        let result = match existing {
            Ok(Some(id)) => calendar.update_event(&id, &booking_patch(booking)).await,
            Ok(None) => {
                let event = booking_event(booking, rescheduled_description(booking));
                calendar.create_event(&event).await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(event) => {
                let mark = synced_mark(event.id);
                if let Err(err) = self.bookings.mark_sync(booking.id, &mark).await {
                    warn!(booking_id = booking.id, error = %err, "failed to record calendar sync");
                }
                booking.google_event_id = mark.google_event_id;
                booking.sync_status = SyncStatus::Synced;
                booking.sync_error = None;
                booking.last_synced = mark.last_synced;
                (true, None)
            }
            Err(err) => {
                warn!(booking_id = booking.id, error = %err, "calendar reschedule failed");
                booking.google_event_id = original_event_id;
                let mark = failed_mark(booking, err.message());
                if let Err(mark_err) = self.bookings.mark_sync(booking.id, &mark).await {
                    warn!(
                        booking_id = booking.id,
                        error = %mark_err,
                        "failed to record calendar sync"
                    );
                }
                apply_mark(booking, mark);
                (false, Some(err.message().to_string()))
            }
        }
    }

    /// Only confirmed bookings can move
    pub async fn can_reschedule(&self, user: &User, booking_id: i64) -> RescheduleCheck {
        match self.owned(user, booking_id).await {
            Ok(booking) if booking.status == BookingStatus::Confirmed => {
                RescheduleCheck { can_reschedule: true, reason: None }
            }
            Ok(booking) => RescheduleCheck {
                can_reschedule: false,
                reason: Some(format!("Cannot reschedule a {} booking", booking.status)),
            },
            Err(refusal) => {
                RescheduleCheck { can_reschedule: false, reason: Some(refusal.message) }
            }
        }
    }
}
