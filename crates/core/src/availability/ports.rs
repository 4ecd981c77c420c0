//! Port interfaces for availability slots

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotwise_domain::{AvailabilitySlot, NewAvailabilitySlot, Result};

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn create(&self, user_id: i64, slot: &NewAvailabilitySlot) -> Result<AvailabilitySlot>;

    async fn get(&self, id: i64) -> Result<Option<AvailabilitySlot>>;

    /// Slots for a user ordered by start time
    async fn list_for_user(
        &self,
        user_id: i64,
        include_unavailable: bool,
    ) -> Result<Vec<AvailabilitySlot>>;

    /// Available slots starting in `[from, until)` that carry no confirmed booking
    async fn list_bookable(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<AvailabilitySlot>>;

    /// Available slots that fully cover `[start, end]`
    async fn list_covering(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AvailabilitySlot>>;

    async fn exists_exact(&self, user_id: i64, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<bool>;

    /// Persist start, end and availability of an existing slot
    async fn update(&self, slot: &AvailabilitySlot) -> Result<()>;

    async fn set_available(&self, id: i64, available: bool) -> Result<()>;

    async fn set_event_id(&self, id: i64, event_id: Option<&str>) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;
}
