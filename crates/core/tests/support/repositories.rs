//! In-memory repository mocks
//!
//! Each mock keeps its rows behind `Arc<Mutex<..>>` so clones handed to the
//! services share state with the copy the test inspects.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotwise_core::agent::ConversationRepository;
use slotwise_core::{AvailabilityRepository, BookingRepository, UserRepository};
use slotwise_domain::{
    AvailabilitySlot, Booking, BookingStatus, Conversation, GoogleTokens, NewAvailabilitySlot,
    NewBooking, NewUser, Result as DomainResult, SyncMark, SyncStatus, User,
};

/// Account with defaults used across the tests
pub fn sample_user(id: i64, email: &str) -> User {
    let now = Utc::now();
    User {
        id,
        email: email.to_string(),
        full_name: Some("Host Person".to_string()),
        hashed_password: None,
        is_active: true,
        is_verified: true,
        verification_token: None,
        google_id: None,
        google_access_token: None,
        google_refresh_token: None,
        google_calendar_connected: false,
        scheduling_slug: format!("host-{id}"),
        meeting_duration_minutes: 30,
        timezone: "UTC".to_string(),
        created_at: now,
        updated_at: now,
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Default, Clone)]
pub struct MemoryUsers {
    rows: Arc<Mutex<Vec<User>>>,
}

impl MemoryUsers {
    pub fn insert(&self, user: User) -> User {
        self.rows.lock().unwrap().push(user.clone());
        user
    }

    pub fn find(&self, id: i64) -> Option<User> {
        self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn modify(&self, id: i64, change: impl FnOnce(&mut User)) {
        if let Some(user) = self.rows.lock().unwrap().iter_mut().find(|u| u.id == id) {
            change(user);
        }
    }

    fn find_by(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.rows.lock().unwrap().iter().find(|u| predicate(u)).cloned()
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let id = self.rows.lock().unwrap().len() as i64 + 1;
        let mut row = sample_user(id, &user.email);
        row.full_name = user.full_name;
        row.hashed_password = user.hashed_password;
        row.is_verified = user.is_verified;
        row.verification_token = user.verification_token;
        row.google_id = user.google_id;
        row.scheduling_slug = user.scheduling_slug;
        Ok(self.insert(row))
    }

    async fn get_by_id(&self, id: i64) -> DomainResult<Option<User>> {
        Ok(self.find(id))
    }

    async fn get_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self.find_by(|u| u.email == email))
    }

    async fn get_by_google_id(&self, google_id: &str) -> DomainResult<Option<User>> {
        Ok(self.find_by(|u| u.google_id.as_deref() == Some(google_id)))
    }

    async fn get_by_slug(&self, slug: &str) -> DomainResult<Option<User>> {
        Ok(self.find_by(|u| u.scheduling_slug == slug))
    }

    async fn get_by_verification_token(&self, token: &str) -> DomainResult<Option<User>> {
        Ok(self.find_by(|u| u.verification_token.as_deref() == Some(token)))
    }

    async fn mark_verified(&self, id: i64) -> DomainResult<()> {
        self.modify(id, |u| {
            u.is_verified = true;
            u.verification_token = None;
        });
        Ok(())
    }

    async fn connect_google(
        &self,
        id: i64,
        google_id: Option<&str>,
        tokens: &GoogleTokens,
    ) -> DomainResult<()> {
        self.modify(id, |u| {
            if let Some(google_id) = google_id {
                u.google_id = Some(google_id.to_string());
            }
            u.google_access_token = Some(tokens.access_token.clone());
            if tokens.refresh_token.is_some() {
                u.google_refresh_token = tokens.refresh_token.clone();
            }
            u.google_calendar_connected = true;
        });
        Ok(())
    }

    async fn update_access_token(&self, id: i64, access_token: &str) -> DomainResult<()> {
        self.modify(id, |u| u.google_access_token = Some(access_token.to_string()));
        Ok(())
    }

    async fn disconnect_calendar(&self, id: i64, forget_tokens: bool) -> DomainResult<()> {
        self.modify(id, |u| {
            u.google_calendar_connected = false;
            if forget_tokens {
                u.google_access_token = None;
                u.google_refresh_token = None;
            }
        });
        Ok(())
    }

    async fn list_calendar_users(&self) -> DomainResult<Vec<User>> {
        Ok(self.rows.lock().unwrap().iter().filter(|u| u.has_calendar()).cloned().collect())
    }

    async fn list_all(&self) -> DomainResult<Vec<User>> {
        Ok(self.rows.lock().unwrap().clone())
    }
}

// ============================================================================
// Bookings
// ============================================================================

#[derive(Default, Clone)]
pub struct MemoryBookings {
    rows: Arc<Mutex<Vec<Booking>>>,
}

impl MemoryBookings {
    pub fn all(&self) -> Vec<Booking> {
        self.rows.lock().unwrap().clone()
    }

    pub fn find(&self, id: i64) -> Option<Booking> {
        self.rows.lock().unwrap().iter().find(|b| b.id == id).cloned()
    }

    /// Overwrite a stored row, bypassing service rules
    pub fn put(&self, booking: Booking) {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|b| b.id == booking.id) {
            Some(existing) => *existing = booking,
            None => rows.push(booking),
        }
    }

    fn select(&self, predicate: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        self.rows.lock().unwrap().iter().filter(|b| predicate(b)).cloned().collect()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookings {
    async fn create(&self, booking: &NewBooking) -> DomainResult<Booking> {
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        let row = Booking {
            id: rows.len() as i64 + 1,
            host_user_id: booking.host_user_id,
            availability_slot_id: booking.availability_slot_id,
            guest_name: booking.guest.guest_name.clone(),
            guest_email: booking.guest.guest_email.clone(),
            guest_message: booking.guest.guest_message.clone(),
            start_time: booking.start_time,
            end_time: booking.end_time,
            status: BookingStatus::Confirmed,
            google_event_id: None,
            sync_status: SyncStatus::Pending,
            sync_error: None,
            sync_attempts: 0,
            last_synced: None,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn get(&self, id: i64) -> DomainResult<Option<Booking>> {
        Ok(self.find(id))
    }

    async fn list_for_host(
        &self,
        host_id: i64,
        status: Option<BookingStatus>,
    ) -> DomainResult<Vec<Booking>> {
        let mut rows =
            self.select(|b| b.host_user_id == host_id && status.map_or(true, |s| b.status == s));
        rows.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(rows)
    }

    async fn upcoming(
        &self,
        host_id: i64,
        now: DateTime<Utc>,
        limit: usize,
    ) -> DomainResult<Vec<Booking>> {
        let mut rows = self.select(|b| {
            b.host_user_id == host_id && b.status == BookingStatus::Confirmed && b.start_time > now
        });
        rows.sort_by_key(|b| b.start_time);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn find_by_guest_email(&self, host_id: i64, email: &str) -> DomainResult<Vec<Booking>> {
        Ok(self.select(|b| b.host_user_id == host_id && b.guest_email.to_lowercase() == email))
    }

    async fn find_by_event_id(&self, event_id: &str) -> DomainResult<Option<Booking>> {
        Ok(self.select(|b| b.google_event_id.as_deref() == Some(event_id)).into_iter().next())
    }

    async fn update(&self, booking: &Booking) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|b| b.id == booking.id) {
            row.guest_name = booking.guest_name.clone();
            row.guest_email = booking.guest_email.clone();
            row.guest_message = booking.guest_message.clone();
            row.start_time = booking.start_time;
            row.end_time = booking.end_time;
            row.status = booking.status;
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_sync(&self, id: i64, mark: &SyncMark) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|b| b.id == id) {
            row.google_event_id = mark.google_event_id.clone();
            row.sync_status = mark.sync_status;
            row.sync_error = mark.sync_error.clone();
            row.sync_attempts = mark.sync_attempts;
            row.last_synced = mark.last_synced;
        }
        Ok(())
    }

    async fn has_confirmed_for_slot(&self, slot_id: i64) -> DomainResult<bool> {
        let confirmed = self.select(|b| {
            b.availability_slot_id == Some(slot_id) && b.status == BookingStatus::Confirmed
        });
        Ok(!confirmed.is_empty())
    }

    async fn list_needing_sync(
        &self,
        host_id: i64,
        max_attempts: u32,
        limit: usize,
    ) -> DomainResult<Vec<Booking>> {
        let mut rows = self.select(|b| {
            b.host_user_id == host_id && b.needs_sync() && b.sync_attempts < max_attempts
        });
        rows.truncate(limit);
        Ok(rows)
    }

    async fn list_with_events(&self, host_id: i64) -> DomainResult<Vec<Booking>> {
        Ok(self.select(|b| b.host_user_id == host_id && b.google_event_id.is_some()))
    }

    async fn list_failed(&self) -> DomainResult<Vec<Booking>> {
        Ok(self.select(|b| b.sync_status == SyncStatus::Failed))
    }
}

// ============================================================================
// Availability slots
// ============================================================================

#[derive(Clone)]
pub struct MemorySlots {
    rows: Arc<Mutex<Vec<AvailabilitySlot>>>,
    bookings: MemoryBookings,
}

impl MemorySlots {
    pub fn new(bookings: MemoryBookings) -> Self {
        Self { rows: Arc::default(), bookings }
    }

    pub fn all(&self) -> Vec<AvailabilitySlot> {
        self.rows.lock().unwrap().clone()
    }

    pub fn find(&self, id: i64) -> Option<AvailabilitySlot> {
        self.rows.lock().unwrap().iter().find(|s| s.id == id).cloned()
    }

    fn booked(&self, slot_id: i64) -> bool {
        self.bookings.all().iter().any(|b| {
            b.availability_slot_id == Some(slot_id) && b.status == BookingStatus::Confirmed
        })
    }

    fn select(&self, predicate: impl Fn(&AvailabilitySlot) -> bool) -> Vec<AvailabilitySlot> {
        let mut rows: Vec<AvailabilitySlot> =
            self.rows.lock().unwrap().iter().filter(|s| predicate(s)).cloned().collect();
        rows.sort_by_key(|s| s.start_time);
        rows
    }

    fn modify(&self, id: i64, change: impl FnOnce(&mut AvailabilitySlot)) {
        if let Some(slot) = self.rows.lock().unwrap().iter_mut().find(|s| s.id == id) {
            change(slot);
        }
    }
}

#[async_trait]
impl AvailabilityRepository for MemorySlots {
    async fn create(
        &self,
        user_id: i64,
        slot: &NewAvailabilitySlot,
    ) -> DomainResult<AvailabilitySlot> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let row = AvailabilitySlot {
            id,
            user_id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            is_available: true,
            google_event_id: None,
            created_at: Utc::now(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn get(&self, id: i64) -> DomainResult<Option<AvailabilitySlot>> {
        Ok(self.find(id))
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        include_unavailable: bool,
    ) -> DomainResult<Vec<AvailabilitySlot>> {
        Ok(self.select(|s| s.user_id == user_id && (include_unavailable || s.is_available)))
    }

    async fn list_bookable(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> DomainResult<Vec<AvailabilitySlot>> {
        let rows = self.select(|s| {
            s.user_id == user_id
                && s.is_available
                && s.start_time >= from
                && until.map_or(true, |u| s.start_time < u)
        });
        Ok(rows.into_iter().filter(|s| !self.booked(s.id)).collect())
    }

    async fn list_covering(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<AvailabilitySlot>> {
        Ok(self.select(|s| {
            s.user_id == user_id && s.is_available && s.start_time <= start && s.end_time >= end
        }))
    }

    async fn exists_exact(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let matching =
            self.select(|s| s.user_id == user_id && s.start_time == start && s.end_time == end);
        Ok(!matching.is_empty())
    }

    async fn update(&self, slot: &AvailabilitySlot) -> DomainResult<()> {
        self.modify(slot.id, |row| {
            row.start_time = slot.start_time;
            row.end_time = slot.end_time;
            row.is_available = slot.is_available;
        });
        Ok(())
    }

    async fn set_available(&self, id: i64, available: bool) -> DomainResult<()> {
        self.modify(id, |row| row.is_available = available);
        Ok(())
    }

    async fn set_event_id(&self, id: i64, event_id: Option<&str>) -> DomainResult<()> {
        self.modify(id, |row| row.google_event_id = event_id.map(str::to_string));
        Ok(())
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        self.rows.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }
}

// ============================================================================
// Conversations
// ============================================================================

#[derive(Default, Clone)]
pub struct MemoryConversations {
    rows: Arc<Mutex<Vec<Conversation>>>,
}

#[async_trait]
impl ConversationRepository for MemoryConversations {
    async fn get(&self, context_id: &str) -> DomainResult<Option<Conversation>> {
        Ok(self.rows.lock().unwrap().iter().find(|c| c.context_id == context_id).cloned())
    }

    async fn save(&self, conversation: &Conversation) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|c| c.context_id != conversation.context_id);
        rows.push(conversation.clone());
        Ok(())
    }

    async fn delete(&self, context_id: &str) -> DomainResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|c| c.context_id != context_id);
        Ok(rows.len() != before)
    }

    async fn list_for_user(&self, user_id: i64) -> DomainResult<Vec<Conversation>> {
        Ok(self.rows.lock().unwrap().iter().filter(|c| c.user_id == user_id).cloned().collect())
    }
}
