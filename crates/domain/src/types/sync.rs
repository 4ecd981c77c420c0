//! Calendar synchronisation reports

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Which side wins when both changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    #[default]
    DatabaseWins,
    ProviderWins,
    Manual,
}

impl_domain_status_conversions!(ConflictResolution {
    DatabaseWins => "database_wins",
    ProviderWins => "provider_wins",
    Manual => "manual",
});

/// Calendar to database pass for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullReport {
    pub events_checked: usize,
    pub bookings_updated: usize,
}

/// Database to calendar pass for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
}

/// Outcome of syncing a single user in both directions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSyncReport {
    pub user_id: i64,
    pub pull: PullReport,
    pub push: PushReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a full background cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncCycleReport {
    pub started_at: Option<DateTime<Utc>>,
    pub users_processed: usize,
    pub users_failed: usize,
    pub bookings_updated: usize,
    pub bookings_synced: usize,
    pub bookings_failed: usize,
    pub skipped: bool,
}

impl SyncCycleReport {
    pub fn absorb(&mut self, user: &UserSyncReport) {
        self.users_processed += 1;
        if user.error.is_some() {
            self.users_failed += 1;
        }
        self.bookings_updated += user.pull.bookings_updated;
        self.bookings_synced += user.push.synced;
        self.bookings_failed += user.push.failed;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSyncReport {
    pub synced_count: usize,
    pub total_failed: usize,
}

/// Per-user counts for the admin summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSyncSummary {
    pub user_id: i64,
    pub email: String,
    pub total: usize,
    pub synced: usize,
    pub unsynced: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedBookingView {
    pub id: i64,
    pub guest_name: String,
    pub sync_error: Option<String>,
    pub sync_attempts: u32,
}

/// Sync health for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSyncStatus {
    pub total_bookings: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub failed_bookings: Vec<FailedBookingView>,
    pub calendar_connected: bool,
}

/// Result of handling a provider webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookOutcome {
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WebhookOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self { processed: false, booking_id: None, reason: Some(reason.into()) }
    }
}
