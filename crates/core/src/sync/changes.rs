//! Change detection between a booking and its calendar event

use slotwise_domain::{Booking, CalendarEvent};

const TOLERANCE_SECONDS: i64 = 60;
const SUMMARY_PREFIX: &str = "Meeting with ";
const DESCRIPTION_HEADERS: [&str; 2] =
    ["Meeting scheduled via booking system.", "Rescheduled meeting with "];

/// Guest name carried by an event summary
pub fn guest_from_summary(summary: &str) -> Option<String> {
    let name = summary.strip_prefix(SUMMARY_PREFIX).unwrap_or(summary).trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Guest message carried by an event description.
///
/// Descriptions written by this service only contribute their `Message:` line.
pub fn message_from_description(description: &str) -> Option<String> {
    let description = description.trim();
    if description.is_empty() {
        return None;
    }
    if DESCRIPTION_HEADERS.iter().any(|header| description.starts_with(header)) {
        return description
            .lines()
            .find_map(|line| line.strip_prefix("Message: "))
            .map(str::to_string);
    }
    Some(description.to_string())
}

fn normalized(message: Option<&str>) -> Option<&str> {
    message.map(str::trim).filter(|m| !m.is_empty())
}

pub fn has_event_changed(booking: &Booking, event: &CalendarEvent) -> bool {
    let (Some(start), Some(end)) = (event.start.start_instant(), event.end.end_instant()) else {
        return false;
    };
    if (start - booking.start_time).num_seconds().abs() > TOLERANCE_SECONDS
        || (end - booking.end_time).num_seconds().abs() > TOLERANCE_SECONDS
    {
        return true;
    }
    if let Some(name) = event.summary.as_deref().and_then(guest_from_summary) {
        if name != booking.guest_name {
            return true;
        }
    }
    let message = event.description.as_deref().and_then(message_from_description);
    normalized(message.as_deref()) != normalized(booking.guest_message.as_deref())
}

/// Copy event times, guest name and message onto the booking
pub fn apply_event(booking: &mut Booking, event: &CalendarEvent) {
    if let Some(start) = event.start.start_instant() {
        booking.start_time = start;
    }
    if let Some(end) = event.end.end_instant() {
        booking.end_time = end;
    }
    if let Some(name) = event.summary.as_deref().and_then(guest_from_summary) {
        booking.guest_name = name;
    }
    if let Some(description) = event.description.as_deref() {
        booking.guest_message = message_from_description(description);
    }
}
