//! Calendar provider port interfaces

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotwise_domain::{CalendarEvent, EventPatch, NewCalendarEvent, Result, User};

/// Operations on one user's primary calendar
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Events overlapping `[from, to)`
    async fn list_events(&self, from: DateTime<Utc>, to: DateTime<Utc>)
        -> Result<Vec<CalendarEvent>>;

    /// `Ok(None)` when the provider no longer has the event
    async fn get_event(&self, event_id: &str) -> Result<Option<CalendarEvent>>;

    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CalendarEvent>;

    async fn update_event(&self, event_id: &str, patch: &EventPatch) -> Result<CalendarEvent>;

    /// Deleting an already removed event succeeds
    async fn delete_event(&self, event_id: &str) -> Result<()>;
}

/// Builds calendar clients for users with a linked calendar
pub trait CalendarGateway: Send + Sync {
    /// `None` when the user has no usable calendar connection
    fn client_for(&self, user: &User) -> Option<Arc<dyn CalendarClient>>;
}
