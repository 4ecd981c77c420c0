//! Port interfaces for bookings

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotwise_domain::{Booking, BookingStatus, NewBooking, Result, SyncMark};

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a confirmed booking with a pending sync status
    async fn create(&self, booking: &NewBooking) -> Result<Booking>;

    async fn get(&self, id: i64) -> Result<Option<Booking>>;

    /// Bookings for a host, newest start first
    async fn list_for_host(
        &self,
        host_id: i64,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>>;

    /// Confirmed bookings starting after `now`, soonest first
    async fn upcoming(&self, host_id: i64, now: DateTime<Utc>, limit: usize)
        -> Result<Vec<Booking>>;

    async fn find_by_guest_email(&self, host_id: i64, email: &str) -> Result<Vec<Booking>>;

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<Booking>>;

    /// Persist guest fields, times and status of an existing booking
    async fn update(&self, booking: &Booking) -> Result<()>;

    async fn mark_sync(&self, id: i64, mark: &SyncMark) -> Result<()>;

    async fn has_confirmed_for_slot(&self, slot_id: i64) -> Result<bool>;

    /// Bookings whose calendar mirror is pending, failed or missing and that
    /// have not exhausted `max_attempts`
    async fn list_needing_sync(
        &self,
        host_id: i64,
        max_attempts: u32,
        limit: usize,
    ) -> Result<Vec<Booking>>;

    /// Bookings that carry a calendar event id
    async fn list_with_events(&self, host_id: i64) -> Result<Vec<Booking>>;

    /// Failed bookings across all hosts
    async fn list_failed(&self) -> Result<Vec<Booking>>;
}
