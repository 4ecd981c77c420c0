//! Two-way reconciliation between bookings and the host calendar

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use slotwise_domain::{
    Booking, CalendarEvent, ConflictResolution, FailedBookingView, FailedSyncReport, PullReport,
    PushReport, Result, SlotwiseError, SyncConfig, SyncCycleReport, SyncStatus, User,
    UserSyncReport, UserSyncStatus, UserSyncSummary, WebhookOutcome,
};
use tracing::{debug, info, instrument, warn};

use super::changes::{apply_event, has_event_changed};
use crate::booking::mirror::{apply_mark, failed_mark, push_booking, synced_mark};
use crate::booking::BookingRepository;
use crate::calendar::{CalendarClient, CalendarGateway};
use crate::user::UserRepository;

/// Provider name used in config and webhook routes
pub const GOOGLE_PROVIDER: &str = "google";

/// Calendar sync use cases shared by the scheduler and the HTTP surface
pub struct SyncService {
    users: Arc<dyn UserRepository>,
    bookings: Arc<dyn BookingRepository>,
    calendars: Arc<dyn CalendarGateway>,
    config: SyncConfig,
}

impl SyncService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        bookings: Arc<dyn BookingRepository>,
        calendars: Arc<dyn CalendarGateway>,
        config: SyncConfig,
    ) -> Self {
        Self { users, bookings, calendars, config }
    }

    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn calendar(&self, user: &User) -> Result<Arc<dyn CalendarClient>> {
        self.calendars
            .client_for(user)
            .ok_or_else(|| SlotwiseError::Calendar("Google Calendar not connected".into()))
    }

    /// Apply calendar-side edits to the bookings they mirror
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn pull_from_calendar(&self, user: &User) -> Result<PullReport> {
        let calendar = self.calendar(user)?;
        let now = Utc::now();
        let window = Duration::days(self.config.window_days);
        let events = calendar.list_events(now - window, now + window).await?;

        let mut by_event: BTreeMap<String, Booking> = self
            .bookings
            .list_with_events(user.id)
            .await?
            .into_iter()
            .filter_map(|b| b.google_event_id.clone().map(|id| (id, b)))
            .collect();

        let mut report = PullReport { events_checked: events.len(), bookings_updated: 0 };
        for event in &events {
            let Some(booking) = by_event.remove(&event.id) else {
                continue;
            };
            if self.apply_if_changed(booking, event).await? {
                report.bookings_updated += 1;
            }
        }
        debug!(
            checked = report.events_checked,
            updated = report.bookings_updated,
            "calendar pull finished"
        );
        Ok(report)
    }

    async fn apply_if_changed(&self, mut booking: Booking, event: &CalendarEvent) -> Result<bool> {
        // Local edits that have not reached the calendar yet win over the event
        let unpushed = matches!(booking.sync_status, SyncStatus::Pending | SyncStatus::Failed);
        if unpushed || !has_event_changed(&booking, event) {
            return Ok(false);
        }
        if self.config.conflict_resolution == ConflictResolution::Manual {
            let mut mark = synced_mark(event.id.clone());
            mark.sync_status = SyncStatus::Conflict;
            mark.sync_error = Some("Calendar event differs from booking".to_string());
            self.bookings.mark_sync(booking.id, &mark).await?;
            return Ok(false);
        }
        apply_event(&mut booking, event);
        self.bookings.update(&booking).await?;
        self.bookings.mark_sync(booking.id, &synced_mark(event.id.clone())).await?;
        info!(booking_id = booking.id, "booking updated from calendar");
        Ok(true)
    }

    /// Create or patch events for bookings whose mirror is stale
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn push_to_calendar(&self, user: &User) -> Result<PushReport> {
        let calendar = self.calendar(user)?;
        let pending = self
            .bookings
            .list_needing_sync(user.id, self.config.retry_attempts, self.config.batch_size)
            .await?;

        let mut report = PushReport { attempted: pending.len(), ..PushReport::default() };
        for mut booking in pending {
            if self.push_one(calendar.as_ref(), &mut booking).await? {
                report.synced += 1;
            } else {
                report.failed += 1;
            }
        }
        Ok(report)
    }

    async fn push_one(&self, calendar: &dyn CalendarClient, booking: &mut Booking) -> Result<bool> {
        let (mark, ok) = match push_booking(calendar, booking).await {
            Ok(event_id) => (synced_mark(event_id), true),
            Err(err) => {
                warn!(booking_id = booking.id, error = %err, "booking sync failed");
                (failed_mark(booking, err.message()), false)
            }
        };
        self.bookings.mark_sync(booking.id, &mark).await?;
        apply_mark(booking, mark);
        Ok(ok)
    }

    /// Both directions for one user, calendar first
    pub async fn force_sync(&self, user: &User) -> Result<UserSyncReport> {
        let pull = self.pull_from_calendar(user).await?;
        let push = self.push_to_calendar(user).await?;
        Ok(UserSyncReport { user_id: user.id, pull, push, error: None })
    }

    /// One pass over every user with a connected calendar
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<SyncCycleReport> {
        let mut cycle =
            SyncCycleReport { started_at: Some(Utc::now()), ..SyncCycleReport::default() };
        if !self.config.enabled || !self.config.is_provider_enabled(GOOGLE_PROVIDER) {
            cycle.skipped = true;
            return Ok(cycle);
        }

        for user in self.users.list_calendar_users().await? {
            let report = match self.force_sync(&user).await {
                Ok(report) => report,
                Err(err) => {
                    warn!(user_id = user.id, error = %err, "user sync failed");
                    UserSyncReport {
                        user_id: user.id,
                        error: Some(err.message().to_string()),
                        ..UserSyncReport::default()
                    }
                }
            };
            cycle.absorb(&report);
        }
        info!(
            users = cycle.users_processed,
            failed_users = cycle.users_failed,
            synced = cycle.bookings_synced,
            updated = cycle.bookings_updated,
            "sync cycle finished"
        );
        Ok(cycle)
    }

    /// Retry every failed booking regardless of host
    pub async fn sync_failed_bookings(&self) -> Result<FailedSyncReport> {
        let failed = self.bookings.list_failed().await?;
        let mut report = FailedSyncReport { synced_count: 0, total_failed: failed.len() };
        let mut hosts: BTreeMap<i64, Option<User>> = BTreeMap::new();

        for mut booking in failed {
            if !hosts.contains_key(&booking.host_user_id) {
                let host = self.users.get_by_id(booking.host_user_id).await?;
                hosts.insert(booking.host_user_id, host);
            }
            let host = hosts.get(&booking.host_user_id).and_then(Option::as_ref);
            let Some(calendar) = host.and_then(|h| self.calendars.client_for(h)) else {
                continue;
            };
            if self.push_one(calendar.as_ref(), &mut booking).await? {
                report.synced_count += 1;
            }
        }
        Ok(report)
    }

    /// Reset the attempt counter and sync a single booking
    pub async fn retry_booking(&self, user: &User, booking_id: i64) -> Result<Booking> {
        let mut booking = self
            .bookings
            .get(booking_id)
            .await?
            .filter(|b| b.host_user_id == user.id)
            .ok_or_else(|| SlotwiseError::NotFound("Booking not found".into()))?;
        let calendar = self.calendar(user)?;
        booking.sync_attempts = 0;
        if !self.push_one(calendar.as_ref(), &mut booking).await? {
            return Err(SlotwiseError::Calendar(
                booking.sync_error.clone().unwrap_or_else(|| "Calendar sync failed".to_string()),
            ));
        }
        Ok(booking)
    }

    /// Synced and unsynced booking counts for every account
    pub async fn status_summary(&self) -> Result<Vec<UserSyncSummary>> {
        let mut summary = Vec::new();
        for user in self.users.list_all().await? {
            let bookings = self.bookings.list_for_host(user.id, None).await?;
            let synced = bookings.iter().filter(|b| b.sync_status == SyncStatus::Synced).count();
            summary.push(UserSyncSummary {
                user_id: user.id,
                email: user.email.clone(),
                total: bookings.len(),
                synced,
                unsynced: bookings.len() - synced,
            });
        }
        Ok(summary)
    }

    pub async fn user_sync_status(&self, user: &User) -> Result<UserSyncStatus> {
        let bookings = self.bookings.list_for_host(user.id, None).await?;
        let mut status_counts = BTreeMap::new();
        for booking in &bookings {
            *status_counts.entry(booking.sync_status.to_string()).or_insert(0) += 1;
        }
        let failed_bookings = bookings
            .iter()
            .filter(|b| b.sync_status == SyncStatus::Failed)
            .map(|b| FailedBookingView {
                id: b.id,
                guest_name: b.guest_name.clone(),
                sync_error: b.sync_error.clone(),
                sync_attempts: b.sync_attempts,
            })
            .collect();
        Ok(UserSyncStatus {
            total_bookings: bookings.len(),
            status_counts,
            failed_bookings,
            calendar_connected: user.has_calendar(),
        })
    }

    /// Apply a provider push notification.
    ///
    /// The payload is either `{"event_id": ..}` or a full event object.
    #[instrument(skip(self, payload))]
    pub async fn handle_webhook(
        &self,
        provider: &str,
        payload: &serde_json::Value,
    ) -> Result<WebhookOutcome> {
        if !self.config.is_provider_enabled(provider) {
            return Ok(WebhookOutcome::skipped("provider disabled"));
        }
        if provider != GOOGLE_PROVIDER {
            return Ok(WebhookOutcome::skipped("unsupported provider"));
        }

        let event_id = payload
            .get("event_id")
            .or_else(|| payload.get("id"))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| SlotwiseError::InvalidInput("Webhook payload has no event id".into()))?;

        let Some(booking) = self.bookings.find_by_event_id(event_id).await? else {
            return Ok(WebhookOutcome::skipped("unknown event"));
        };
        let Some(host) = self.users.get_by_id(booking.host_user_id).await? else {
            return Ok(WebhookOutcome::skipped("unknown host"));
        };

        let event = if payload.get("start").is_some() {
            let event = serde_json::from_value::<CalendarEvent>(payload.clone())
                .map_err(|e| SlotwiseError::InvalidInput(e.to_string()))?;
            Some(event)
        } else {
            self.calendar(&host)?.get_event(event_id).await?
        };
        let Some(event) = event else {
            return Ok(WebhookOutcome::skipped("event no longer exists"));
        };

        let booking_id = booking.id;
        self.apply_if_changed(booking, &event).await?;
        Ok(WebhookOutcome { processed: true, booking_id: Some(booking_id), reason: None })
    }
}
