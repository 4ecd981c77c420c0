//! Availability slot types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A window of time a host offers for booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: i64,
    pub user_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_available: bool,
    pub google_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilitySlot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Whether `[start, end]` lies entirely inside this slot.
    pub fn covers(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time <= start && self.end_time >= end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAvailabilitySlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlotUpdate {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_available: Option<bool>,
}

/// Result of creating a slot, including the calendar mirror outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCreated {
    pub slot: AvailabilitySlot,
    pub calendar_event_created: bool,
}

/// Result of deleting one slot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotDeletion {
    pub slot_id: i64,
    pub calendar_deleted: bool,
    pub calendar_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteFailure {
    pub slot_id: i64,
    pub reason: String,
}

/// Aggregate result of a bulk delete
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkDeleteReport {
    pub deleted: usize,
    pub failed: usize,
    pub calendar_deleted: usize,
    pub calendar_failed: usize,
    pub failures: Vec<BulkDeleteFailure>,
}

/// Bookable slot flattened for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub id: i64,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl From<&AvailabilitySlot> for SlotView {
    fn from(slot: &AvailabilitySlot) -> Self {
        Self {
            id: slot.id,
            date: slot.start_time.format("%Y-%m-%d").to_string(),
            start_time: slot.start_time.format("%H:%M").to_string(),
            end_time: slot.end_time.format("%H:%M").to_string(),
            start: slot.start_time,
            end: slot.end_time,
            duration_minutes: slot.duration_minutes(),
        }
    }
}
