//! Shared test helpers for `slotwise-core` integration tests.
//!
//! `Harness` wires every service over the in-memory mocks so tests can drive
//! use cases end to end and then inspect the stored rows.
#![allow(dead_code)]

pub mod calendar;
pub mod mail;
pub mod repositories;

use std::sync::Arc;

use chrono::{DateTime, Duration, DurationRound, Utc};
use slotwise_core::availability::AvailabilityService;
use slotwise_core::booking::{BookingService, RescheduleService};
use slotwise_core::{AgentService, KnowledgeBase, Notifier, SyncService};
use slotwise_domain::{AvailabilitySlot, NewAvailabilitySlot, SyncConfig, User};

pub use calendar::{MockCalendar, MockGateway};
pub use mail::{CannedModel, RecordingMailer};
pub use repositories::{
    sample_user, MemoryBookings, MemoryConversations, MemorySlots, MemoryUsers,
};

use slotwise_core::AvailabilityRepository;

pub struct Harness {
    pub users: MemoryUsers,
    pub slots: MemorySlots,
    pub bookings: MemoryBookings,
    pub conversations: MemoryConversations,
    pub gateway: MockGateway,
    pub mailer: RecordingMailer,
    pub availability: Arc<AvailabilityService>,
    pub booking: Arc<BookingService>,
    pub reschedule: RescheduleService,
    pub sync: SyncService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_sync_config(SyncConfig::default())
    }

    pub fn with_sync_config(config: SyncConfig) -> Self {
        let users = MemoryUsers::default();
        let bookings = MemoryBookings::default();
        let slots = MemorySlots::new(bookings.clone());
        let gateway = MockGateway::default();
        let mailer = RecordingMailer::default();
        let notifier = Notifier::new(Arc::new(mailer.clone()), "http://localhost:8000");

        let availability = Arc::new(AvailabilityService::new(
            Arc::new(slots.clone()),
            Arc::new(bookings.clone()),
            Arc::new(gateway.clone()),
        ));
        let booking = Arc::new(BookingService::new(
            Arc::new(bookings.clone()),
            Arc::new(slots.clone()),
            Arc::new(users.clone()),
            Arc::new(gateway.clone()),
            Arc::clone(&availability),
            notifier.clone(),
        ));
        let reschedule =
            RescheduleService::new(Arc::new(bookings.clone()), Arc::new(gateway.clone()), notifier);
        let sync = SyncService::new(
            Arc::new(users.clone()),
            Arc::new(bookings.clone()),
            Arc::new(gateway.clone()),
            config,
        );

        Self {
            users,
            slots,
            bookings,
            conversations: MemoryConversations::default(),
            gateway,
            mailer,
            availability,
            booking,
            reschedule,
            sync,
        }
    }

    pub fn agent(&self, knowledge: KnowledgeBase) -> AgentService {
        AgentService::new(
            Arc::clone(&self.booking),
            Arc::clone(&self.availability),
            Arc::new(self.conversations.clone()),
            Arc::new(self.gateway.clone()),
            knowledge,
        )
    }

    pub fn calendar(&self) -> &MockCalendar {
        &self.gateway.calendar
    }

    /// Host with or without a linked calendar
    pub fn host(&self, connected: bool) -> User {
        let id = self.users.len() as i64 + 1;
        let mut user = sample_user(id, &format!("host{id}@example.com"));
        if connected {
            user.google_access_token = Some("access".to_string());
            user.google_refresh_token = Some("refresh".to_string());
            user.google_calendar_connected = true;
        }
        self.users.insert(user)
    }

    pub async fn slot(&self, user: &User, start: DateTime<Utc>, minutes: i64) -> AvailabilitySlot {
        let end_time = start + Duration::minutes(minutes);
        let slot = NewAvailabilitySlot { start_time: start, end_time };
        self.slots.create(user.id, &slot).await.unwrap()
    }
}

/// Whole hour `days` from now, always in the future
pub fn hours_ahead(days: i64, hour_offset: i64) -> DateTime<Utc> {
    (Utc::now() + Duration::days(days) + Duration::hours(hour_offset))
        .duration_trunc(Duration::hours(1))
        .unwrap()
}
