//! Booking types and lifecycle statuses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Lifecycle status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Rescheduled,
}

impl_domain_status_conversions!(BookingStatus {
    Confirmed => "confirmed",
    Cancelled => "cancelled",
    Rescheduled => "rescheduled",
});

/// Calendar mirror status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    Synced,
    Failed,
    Conflict,
}

impl_domain_status_conversions!(SyncStatus {
    Pending => "pending",
    Synced => "synced",
    Failed => "failed",
    Conflict => "conflict",
});

/// A guest's reservation against a host's time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub host_user_id: i64,
    pub availability_slot_id: Option<i64>,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_message: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub google_event_id: Option<String>,
    pub sync_status: SyncStatus,
    pub sync_error: Option<String>,
    pub sync_attempts: u32,
    pub last_synced: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Calendar event description mirrored to the host's calendar.
    pub fn event_description(&self) -> String {
        let mut description = format!(
            "Meeting scheduled via booking system.\n\nGuest: {}\nEmail: {}",
            self.guest_name, self.guest_email
        );
        if let Some(message) = self.guest_message.as_deref().filter(|m| !m.is_empty()) {
            description.push_str("\nMessage: ");
            description.push_str(message);
        }
        description
    }

    /// Calendar event title.
    pub fn event_summary(&self) -> String {
        format!("Meeting with {}", self.guest_name)
    }

    /// Confirmed and rescheduled bookings both hold their time range.
    pub fn occupies_time(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    /// Whether the calendar mirror still needs work.
    pub fn needs_sync(&self) -> bool {
        self.status != BookingStatus::Cancelled
            && (matches!(self.sync_status, SyncStatus::Pending | SyncStatus::Failed)
                || self.google_event_id.is_none())
    }
}

/// Guest-supplied details for a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestDetails {
    pub guest_name: String,
    pub guest_email: String,
    #[serde(default)]
    pub guest_message: Option<String>,
}

/// Insert payload for a new booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub host_user_id: i64,
    pub availability_slot_id: Option<i64>,
    pub guest: GuestDetails,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Partial update to a booking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingUpdate {
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub guest_email: Option<String>,
    #[serde(default)]
    pub guest_message: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<BookingStatus>,
}

impl BookingUpdate {
    pub fn changes_time(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}

/// Write-back of calendar sync bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMark {
    pub google_event_id: Option<String>,
    pub sync_status: SyncStatus,
    pub sync_error: Option<String>,
    pub sync_attempts: u32,
    pub last_synced: Option<DateTime<Utc>>,
}

/// Booking plus the outcome of its calendar side effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingOutcome {
    pub booking: Booking,
    pub calendar_updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Why a reschedule was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescheduleErrorKind {
    NotFound,
    InvalidStatus,
    InvalidTime,
    DatabaseError,
}

/// Result of a reschedule attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<RescheduleErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<Booking>,
    pub calendar_updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_error: Option<String>,
    pub emails_sent: bool,
}

impl RescheduleOutcome {
    /// A failed attempt with nothing changed.
    pub fn refused(kind: RescheduleErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_type: Some(kind),
            booking: None,
            calendar_updated: false,
            calendar_error: None,
            emails_sent: false,
        }
    }
}

/// Answer to "can this booking be moved?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleCheck {
    pub can_reschedule: bool,
    pub reason: Option<String>,
}
