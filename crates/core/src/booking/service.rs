//! Booking lifecycle use cases

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use slotwise_domain::utils::timezone::parse_user_datetime;
use slotwise_domain::{
    Booking, BookingEventView, BookingOutcome, BookingStatus, BookingUpdate, EventPerson, EventTime,
    GuestDetails, NewBooking, Result, SlotwiseError, User,
};
use tracing::{info, instrument, warn};

use super::mirror::{apply_mark, booking_event, booking_patch, failed_mark, synced_mark};
use super::ports::BookingRepository;
use crate::availability::{AvailabilityRepository, AvailabilityService};
use crate::calendar::CalendarGateway;
use crate::notifications::Notifier;
use crate::user::UserRepository;

const DEFAULT_UPCOMING_LIMIT: usize = 10;

fn validate_guest(guest: &GuestDetails) -> Result<()> {
    if guest.guest_name.trim().is_empty() {
        return Err(SlotwiseError::InvalidInput("Guest name is required".into()));
    }
    if !guest.guest_email.contains('@') {
        return Err(SlotwiseError::InvalidInput("A valid guest email is required".into()));
    }
    Ok(())
}

fn untouched(booking: &Booking) -> BookingOutcome {
    BookingOutcome {
        booking: booking.clone(),
        calendar_updated: false,
        calendar_error: None,
        message: None,
    }
}

/// Booking use cases
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    slots: Arc<dyn AvailabilityRepository>,
    users: Arc<dyn UserRepository>,
    calendars: Arc<dyn CalendarGateway>,
    availability: Arc<AvailabilityService>,
    notifier: Notifier,
}

impl BookingService {
    /// Wire the service to its stores, the calendar gateway and guest mail.
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        slots: Arc<dyn AvailabilityRepository>,
        users: Arc<dyn UserRepository>,
        calendars: Arc<dyn CalendarGateway>,
        availability: Arc<AvailabilityService>,
        notifier: Notifier,
    ) -> Self {
        Self { bookings, slots, users, calendars, availability, notifier }
    }

    async fn host(&self, host_id: i64) -> Result<User> {
        self.users
            .get_by_id(host_id)
            .await?
            .ok_or_else(|| SlotwiseError::NotFound("Host not found".into()))
    }

    /// Book an open slot for a guest
    #[instrument(skip(self, guest), fields(guest = %guest.guest_name))]
    pub async fn create_booking(&self, slot_id: i64, guest: GuestDetails) -> Result<Booking> {
        validate_guest(&guest)?;
        if !self.availability.check_slot_availability(slot_id).await? {
            return Err(SlotwiseError::Conflict("Slot is not available".into()));
        }
        let slot = self
            .slots
            .get(slot_id)
            .await?
            .ok_or_else(|| SlotwiseError::NotFound("Availability slot not found".into()))?;
        let host = self.host(slot.user_id).await?;

        let booking = self
            .bookings
            .create(&NewBooking {
                host_user_id: host.id,
                availability_slot_id: Some(slot.id),
                guest,
                start_time: slot.start_time,
                end_time: slot.end_time,
            })
            .await?;
        self.slots.set_available(slot.id, false).await?;
        self.finish_new_booking(&host, booking).await
    }

    /// Book a host by scheduling slug at a local date and time
    pub async fn book_public(
        &self,
        slug: &str,
        date: &str,
        time: &str,
        guest: GuestDetails,
    ) -> Result<Booking> {
        validate_guest(&guest)?;
        let host = self
            .users
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| SlotwiseError::NotFound("User not found".into()))?;
        let start = parse_user_datetime(date, time, &host.timezone)?;
        if start <= Utc::now() {
            return Err(SlotwiseError::InvalidInput("Cannot book a time in the past".into()));
        }
        let end = start + Duration::minutes(host.meeting_duration_minutes);
        self.book_range(&host, start, end, guest).await
    }

    /// Book an arbitrary range for a host, finding or creating the covering slot
    pub async fn create_booking_from_calendar(
        &self,
        host: &User,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        guest_email: Option<&str>,
        message: Option<String>,
    ) -> Result<Booking> {
        let guest = GuestDetails {
            guest_name: title.to_string(),
            guest_email: guest_email.unwrap_or(&host.email).to_string(),
            guest_message: message,
        };
        self.book_range(host, start, end, guest).await
    }

    async fn book_range(
        &self,
        host: &User,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        guest: GuestDetails,
    ) -> Result<Booking> {
        let existing = self.bookings.list_for_host(host.id, None).await?;
        let overlaps = |b: &Booking| b.start_time < end && b.end_time > start;
        if existing.iter().any(|b| b.occupies_time() && overlaps(b)) {
            return Err(SlotwiseError::Conflict("Requested time is already booked".into()));
        }
        let slot = self.availability.find_or_create_covering_slot(host.id, start, end).await?;
        let booking = self
            .bookings
            .create(&NewBooking {
                host_user_id: host.id,
                availability_slot_id: Some(slot.id),
                guest,
                start_time: start,
                end_time: end,
            })
            .await?;
        self.slots.set_available(slot.id, false).await?;
        self.finish_new_booking(host, booking).await
    }

    async fn finish_new_booking(&self, host: &User, mut booking: Booking) -> Result<Booking> {
        if let Some(calendar) = self.calendars.client_for(host) {
            let event = booking_event(&booking, booking.event_description());
            let mark = match calendar.create_event(&event).await {
                Ok(event) => synced_mark(event.id),
                Err(err) => {
                    warn!(booking_id = booking.id, error = %err, "calendar event creation failed");
                    failed_mark(&booking, err.message())
                }
            };
            self.bookings.mark_sync(booking.id, &mark).await?;
            apply_mark(&mut booking, mark);
        }

        self.notifier.booking_confirmed(host, &booking).await;
        info!(booking_id = booking.id, host_id = host.id, "booking created");
        Ok(booking)
    }

    /// The host's bookings, newest first, optionally narrowed to one status
    pub async fn list_bookings(
        &self,
        user: &User,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>> {
        self.bookings.list_for_host(user.id, status).await
    }

    /// One of the host's bookings; another host's booking reads as `NotFound`
    pub async fn get_booking(&self, user: &User, booking_id: i64) -> Result<Booking> {
        self.bookings
            .get(booking_id)
            .await?
            .filter(|b| b.host_user_id == user.id)
            .ok_or_else(|| SlotwiseError::NotFound("Booking not found".into()))
    }

    /// Apply a partial update and mirror a cancel or new time to the calendar
    #[instrument(skip(self, user, update), fields(user_id = user.id))]
    pub async fn update_booking(
        &self,
        user: &User,
        booking_id: i64,
        update: BookingUpdate,
    ) -> Result<BookingOutcome> {
        let mut booking = self.get_booking(user, booking_id).await?;
        let cancelling = update.status == Some(BookingStatus::Cancelled)
            && booking.status != BookingStatus::Cancelled;
        let retimed = update.changes_time();

        if let Some(name) = update.guest_name {
            booking.guest_name = name;
        }
        if let Some(email) = update.guest_email {
            booking.guest_email = email;
        }
        if update.guest_message.is_some() {
            booking.guest_message = update.guest_message;
        }
        if let Some(start) = update.start_time {
            booking.start_time = start;
        }
        if let Some(end) = update.end_time {
            booking.end_time = end;
        }
        if let Some(status) = update.status {
            booking.status = status;
        }
        if booking.end_time <= booking.start_time {
            return Err(SlotwiseError::InvalidInput("End time must be after start time".into()));
        }
        self.bookings.update(&booking).await?;

        let mut outcome = untouched(&booking);
        let Some(event_id) = booking.google_event_id.clone() else {
            return Ok(outcome);
        };
        let Some(calendar) = self.calendars.client_for(user) else {
            return Ok(outcome);
        };

        let result = if cancelling {
            calendar.delete_event(&event_id).await
        } else if retimed {
            calendar.update_event(&event_id, &booking_patch(&booking)).await.map(|_| ())
        } else {
            return Ok(outcome);
        };
        match result {
            Ok(()) => outcome.calendar_updated = true,
            Err(err) => {
                warn!(booking_id, error = %err, "calendar update failed");
                outcome.calendar_error = Some(err.message().to_string());
            }
        }
        Ok(outcome)
    }

    /// Cancel a booking, remove its event and reopen the slot
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn cancel_booking(&self, user: &User, booking_id: i64) -> Result<BookingOutcome> {
        let mut booking = self.get_booking(user, booking_id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Err(SlotwiseError::Conflict("Booking is already cancelled".into()));
        }
        booking.status = BookingStatus::Cancelled;
        self.bookings.update(&booking).await?;
        if let Some(slot_id) = booking.availability_slot_id {
            self.slots.set_available(slot_id, true).await?;
        }

        let mut outcome = untouched(&booking);
        let calendar = self.calendars.client_for(user);
        if let (Some(event_id), Some(calendar)) = (booking.google_event_id.as_deref(), calendar) {
            match calendar.delete_event(event_id).await {
                Ok(()) => outcome.calendar_updated = true,
                Err(err) => {
                    warn!(booking_id, error = %err, "calendar event deletion failed");
                    outcome.calendar_error = Some(err.message().to_string());
                }
            }
        }

        self.notifier.booking_cancelled(user, &booking).await;
        outcome.message = Some("Booking cancelled".to_string());
        info!(booking_id, "booking cancelled");
        Ok(outcome)
    }

    /// Confirmed bookings still ahead, soonest first
    pub async fn upcoming(&self, user: &User, limit: Option<usize>) -> Result<Vec<Booking>> {
        self.bookings.upcoming(user.id, Utc::now(), limit.unwrap_or(DEFAULT_UPCOMING_LIMIT)).await
    }

    pub async fn find_by_guest_email(&self, user: &User, email: &str) -> Result<Vec<Booking>> {
        self.bookings.find_by_guest_email(user.id, &email.trim().to_lowercase()).await
    }

    /// Send a free-form message from the host to the booking's guest
    pub async fn email_guest(
        &self,
        user: &User,
        booking_id: i64,
        subject: &str,
        message: &str,
    ) -> Result<bool> {
        if subject.trim().is_empty() || message.trim().is_empty() {
            return Err(SlotwiseError::InvalidInput("Subject and message are required".into()));
        }
        let booking = self.get_booking(user, booking_id).await?;
        Ok(self.notifier.host_to_guest(user, &booking, subject, message).await)
    }

    /// Bookings mirrored to the calendar, in event shape
    pub async fn calendar_events(&self, user: &User) -> Result<Vec<BookingEventView>> {
        let bookings = self.bookings.list_with_events(user.id).await?;
        Ok(bookings
            .into_iter()
            .filter_map(|b| {
                let id = b.google_event_id.clone()?;
                Some(BookingEventView {
                    id,
                    summary: b.event_summary(),
                    start: EventTime::at(b.start_time),
                    end: EventTime::at(b.end_time),
                    description: b.guest_message.clone(),
                    organizer: EventPerson { email: Some(user.email.clone()) },
                })
            })
            .collect())
    }
}
