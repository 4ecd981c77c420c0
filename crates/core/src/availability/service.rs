//! Availability slot use cases

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use slotwise_domain::utils::timezone::{day_bounds_utc, user_timezone};
use slotwise_domain::{
    AvailabilitySlot, AvailabilitySlotUpdate, BulkDeleteFailure, BulkDeleteReport,
    NewAvailabilitySlot, NewCalendarEvent, Result, SlotCreated, SlotDeletion, SlotView,
    SlotwiseError, User,
};
use tracing::{info, instrument, warn};

use super::planner::{busy_intervals, free_slots_for_day, WorkingHours};
use super::ports::AvailabilityRepository;
use crate::booking::ports::BookingRepository;
use crate::calendar::CalendarGateway;

const SLOT_EVENT_SUMMARY: &str = "Available for Booking";

fn validate_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end <= start {
        return Err(SlotwiseError::InvalidInput("End time must be after start time".into()));
    }
    Ok(())
}

const fn span(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> NewAvailabilitySlot {
    NewAvailabilitySlot { start_time, end_time }
}

/// Parse a comma separated id list such as `"4, 5,6"`.
pub fn parse_slot_ids(raw: &str) -> Result<Vec<i64>> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| SlotwiseError::InvalidInput(format!("Invalid slot id: {s}")))
        })
        .collect::<Result<Vec<_>>>()?;
    if ids.is_empty() {
        return Err(SlotwiseError::InvalidInput("No slot ids provided".into()));
    }
    Ok(ids)
}

/// Availability slot use cases
pub struct AvailabilityService {
    slots: Arc<dyn AvailabilityRepository>,
    bookings: Arc<dyn BookingRepository>,
    calendars: Arc<dyn CalendarGateway>,
    hours: WorkingHours,
}

impl AvailabilityService {
    /// Service with the default 09:00 to 17:00 working day.
    pub fn new(
        slots: Arc<dyn AvailabilityRepository>,
        bookings: Arc<dyn BookingRepository>,
        calendars: Arc<dyn CalendarGateway>,
    ) -> Self {
        Self { slots, bookings, calendars, hours: WorkingHours::default() }
    }

    #[must_use]
    pub fn with_working_hours(mut self, hours: WorkingHours) -> Self {
        self.hours = hours;
        self
    }

    /// Create a slot and mirror it to the host calendar when connected.
    ///
    /// A calendar failure removes the slot again.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn create_slot(
        &self,
        user: &User,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<SlotCreated> {
        validate_range(start, end)?;
        let mut slot = self.slots.create(user.id, &span(start, end)).await?;

        let Some(calendar) = self.calendars.client_for(user) else {
            return Ok(SlotCreated { slot, calendar_event_created: false });
        };

        let event = NewCalendarEvent {
            summary: SLOT_EVENT_SUMMARY.to_string(),
            description: Some("Open slot for bookings".to_string()),
            start,
            end,
            attendees: Vec::new(),
            transparency: Some("opaque".to_string()),
        };
        match calendar.create_event(&event).await {
            Ok(created) => {
                self.slots.set_event_id(slot.id, Some(&created.id)).await?;
                slot.google_event_id = Some(created.id);
                Ok(SlotCreated { slot, calendar_event_created: true })
            }
            Err(err) => {
                warn!(
                    slot_id = slot.id,
                    error = %err,
                    "calendar event creation failed, removing slot"
                );
                self.slots.delete(slot.id).await?;
                Err(SlotwiseError::Calendar(format!(
                    "Failed to create calendar event: {}",
                    err.message()
                )))
            }
        }
    }

    /// The user's slots by start time; closed slots only when asked for
    pub async fn list_slots(
        &self,
        user: &User,
        include_unavailable: bool,
    ) -> Result<Vec<AvailabilitySlot>> {
        self.slots.list_for_user(user.id, include_unavailable).await
    }

    /// Available, future, unbooked slots
    pub async fn list_bookable_slots(
        &self,
        user_id: i64,
        from: Option<DateTime<Utc>>,
    ) -> Result<Vec<AvailabilitySlot>> {
        let now = Utc::now();
        let from = from.filter(|f| *f > now).unwrap_or(now);
        self.slots.list_bookable(user_id, from, None).await
    }

    /// Bookable slots on a local calendar date of the host
    pub async fn slots_for_date(
        &self,
        user: &User,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilitySlot>> {
        let (day_start, day_end) = day_bounds_utc(date, user_timezone(Some(&user.timezone)))?;
        let from = day_start.max(Utc::now());
        self.slots.list_bookable(user.id, from, Some(day_end)).await
    }

    pub async fn get_slot(&self, user: &User, slot_id: i64) -> Result<AvailabilitySlot> {
        self.slots
            .get(slot_id)
            .await?
            .filter(|s| s.user_id == user.id)
            .ok_or_else(|| SlotwiseError::NotFound("Availability slot not found".into()))
    }

    /// Patch times or the open flag of one of the user's slots
    pub async fn update_slot(
        &self,
        user: &User,
        slot_id: i64,
        update: AvailabilitySlotUpdate,
    ) -> Result<AvailabilitySlot> {
        let mut slot = self.get_slot(user, slot_id).await?;
        if let Some(start) = update.start_time {
            slot.start_time = start;
        }
        if let Some(end) = update.end_time {
            slot.end_time = end;
        }
        if let Some(available) = update.is_available {
            slot.is_available = available;
        }
        validate_range(slot.start_time, slot.end_time)?;
        self.slots.update(&slot).await?;
        Ok(slot)
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn delete_slot(&self, user: &User, slot_id: i64) -> Result<SlotDeletion> {
        let slot = self.get_slot(user, slot_id).await?;
        if self.bookings.has_confirmed_for_slot(slot.id).await? {
            return Err(SlotwiseError::Conflict(
                "Cannot delete slot with confirmed bookings".into(),
            ));
        }

        let mut report = SlotDeletion { slot_id, ..SlotDeletion::default() };
        if let Some(event_id) = slot.google_event_id.as_deref() {
            match self.calendars.client_for(user) {
                Some(calendar) => match calendar.delete_event(event_id).await {
                    Ok(()) => report.calendar_deleted = true,
                    Err(err) => {
                        warn!(slot_id, error = %err, "failed to delete slot event");
                        report.calendar_error = Some(err.message().to_string());
                    }
                },
                None => report.calendar_error = Some("Google Calendar not connected".to_string()),
            }
        }

        self.slots.delete(slot.id).await?;
        info!(slot_id, calendar_deleted = report.calendar_deleted, "slot deleted");
        Ok(report)
    }

    /// Delete each slot independently and report per-id failures
    pub async fn bulk_delete(&self, user: &User, slot_ids: &[i64]) -> Result<BulkDeleteReport> {
        let mut report = BulkDeleteReport::default();
        for &slot_id in slot_ids {
            match self.delete_slot(user, slot_id).await {
                Ok(deletion) => {
                    report.deleted += 1;
                    if deletion.calendar_deleted {
                        report.calendar_deleted += 1;
                    } else if deletion.calendar_error.is_some() {
                        report.calendar_failed += 1;
                    }
                }
                Err(err) => {
                    report.failed += 1;
                    let reason = err.message().to_string();
                    report.failures.push(BulkDeleteFailure { slot_id, reason });
                }
            }
        }
        Ok(report)
    }

    /// Slot exists, is open, lies in the future and has no confirmed booking
    pub async fn check_slot_availability(&self, slot_id: i64) -> Result<bool> {
        let Some(slot) = self.slots.get(slot_id).await? else {
            return Ok(false);
        };
        if !slot.is_available || slot.start_time <= Utc::now() {
            return Ok(false);
        }
        Ok(!self.bookings.has_confirmed_for_slot(slot.id).await?)
    }

    /// Some open slot covers the range and none of the covering slots is booked
    pub async fn check_time_range_available(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool> {
        validate_range(start, end)?;
        let covering = self.slots.list_covering(user_id, start, end).await?;
        if covering.is_empty() {
            return Ok(false);
        }
        for slot in &covering {
            if self.bookings.has_confirmed_for_slot(slot.id).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Derive free slots from the host calendar for each day in the range
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn generate_from_calendar(
        &self,
        user: &User,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AvailabilitySlot>> {
        if end_date < start_date {
            return Err(SlotwiseError::InvalidInput(
                "End date must not be before start date".into(),
            ));
        }
        if end_date - start_date > Duration::days(62) {
            return Err(SlotwiseError::InvalidInput("Date range is limited to 62 days".into()));
        }
        let calendar = self
            .calendars
            .client_for(user)
            .ok_or_else(|| SlotwiseError::Calendar("Google Calendar not connected".into()))?;

        let mut created = Vec::new();
        let mut day = start_date;
        while day <= end_date {
            let (from, to) = day_bounds_utc(day, chrono_tz::Tz::UTC)?;
            let events = calendar.list_events(from, to).await?;
            let busy = busy_intervals(&events);
            for (start, end) in free_slots_for_day(day, self.hours, &busy) {
                if self.slots.exists_exact(user.id, start, end).await? {
                    continue;
                }
                created.push(self.slots.create(user.id, &span(start, end)).await?);
            }
            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
        info!(created = created.len(), "slots generated from calendar");
        Ok(created)
    }

    /// Bookable slots, optionally limited to a UTC date, in display form
    pub async fn user_availability(
        &self,
        user_id: i64,
        date: Option<NaiveDate>,
        duration_minutes: i64,
    ) -> Result<Vec<SlotView>> {
        let slots = match date {
            Some(date) => {
                let (from, to) = day_bounds_utc(date, chrono_tz::Tz::UTC)?;
                self.slots.list_bookable(user_id, from.max(Utc::now()), Some(to)).await?
            }
            None => self.list_bookable_slots(user_id, None).await?,
        };
        Ok(slots
            .iter()
            .filter(|s| s.duration_minutes() >= duration_minutes)
            .map(SlotView::from)
            .collect())
    }

    /// Open slot covering the range, created on demand
    pub async fn find_or_create_covering_slot(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AvailabilitySlot> {
        validate_range(start, end)?;
        for slot in self.slots.list_covering(user_id, start, end).await? {
            if !self.bookings.has_confirmed_for_slot(slot.id).await? {
                return Ok(slot);
            }
        }
        self.slots.create(user_id, &span(start, end)).await
    }
}
