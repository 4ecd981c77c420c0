//! Calendar event types shared by the Google adapter and the services

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Start or end of an event; timed events carry `date_time`, all-day events
/// carry `date`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTime {
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl EventTime {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { date_time: Some(instant), date: None }
    }

    /// Start instant; all-day dates resolve to midnight UTC.
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        self.date_time
            .or_else(|| self.date.map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN))))
    }

    /// End instant; all-day dates resolve to 23:59:59 UTC.
    pub fn end_instant(&self) -> Option<DateTime<Utc>> {
        self.date_time.or_else(|| {
            self.date.and_then(|d| {
                NaiveTime::from_hms_opt(23, 59, 59).map(|t| Utc.from_utc_datetime(&d.and_time(t)))
            })
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPerson {
    #[serde(default)]
    pub email: Option<String>,
}

/// Event as read back from a calendar provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transparency: Option<String>,
    #[serde(default)]
    pub organizer: Option<EventPerson>,
}

impl CalendarEvent {
    /// Transparent events do not block time.
    pub fn is_busy(&self) -> bool {
        self.transparency.as_deref() != Some("transparent")
            && self.status.as_deref() != Some("cancelled")
    }
}

/// Event to create on a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendees: Vec<String>,
    pub transparency: Option<String>,
}

/// Partial event update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Booking rendered in calendar-event shape for the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingEventView {
    pub id: String,
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    pub description: Option<String>,
    pub organizer: EventPerson,
}
