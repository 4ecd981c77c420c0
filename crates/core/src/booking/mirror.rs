//! Mirroring bookings onto the host calendar

use chrono::Utc;
use slotwise_domain::{Booking, EventPatch, NewCalendarEvent, Result, SyncMark, SyncStatus};

use crate::calendar::CalendarClient;

pub fn booking_event(booking: &Booking, description: String) -> NewCalendarEvent {
    NewCalendarEvent {
        summary: booking.event_summary(),
        description: Some(description),
        start: booking.start_time,
        end: booking.end_time,
        attendees: vec![booking.guest_email.clone()],
        transparency: None,
    }
}

pub fn booking_patch(booking: &Booking) -> EventPatch {
    EventPatch {
        summary: Some(booking.event_summary()),
        description: Some(booking.event_description()),
        start: Some(booking.start_time),
        end: Some(booking.end_time),
    }
}

/// Create the booking's event, or patch it when one is already linked.
/// Returns the event id.
pub async fn push_booking(calendar: &dyn CalendarClient, booking: &Booking) -> Result<String> {
    if let Some(event_id) = booking.google_event_id.as_deref() {
        if calendar.get_event(event_id).await?.is_some() {
            let updated = calendar.update_event(event_id, &booking_patch(booking)).await?;
            return Ok(updated.id);
        }
    }
    let event = booking_event(booking, booking.event_description());
    let created = calendar.create_event(&event).await?;
    Ok(created.id)
}

pub fn synced_mark(event_id: String) -> SyncMark {
    SyncMark {
        google_event_id: Some(event_id),
        sync_status: SyncStatus::Synced,
        sync_error: None,
        sync_attempts: 0,
        last_synced: Some(Utc::now()),
    }
}

pub fn failed_mark(booking: &Booking, error: &str) -> SyncMark {
    SyncMark {
        google_event_id: booking.google_event_id.clone(),
        sync_status: SyncStatus::Failed,
        sync_error: Some(error.to_string()),
        sync_attempts: booking.sync_attempts.saturating_add(1),
        last_synced: booking.last_synced,
    }
}

/// Copy a sync mark onto an in-memory booking
pub fn apply_mark(booking: &mut Booking, mark: SyncMark) {
    booking.google_event_id = mark.google_event_id;
    booking.sync_status = mark.sync_status;
    booking.sync_error = mark.sync_error;
    booking.sync_attempts = mark.sync_attempts;
    booking.last_synced = mark.last_synced;
}
