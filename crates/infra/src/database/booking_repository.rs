//! Booking repository implementation using SQLite

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row, ToSql};
use slotwise_core::booking::ports::BookingRepository;
use slotwise_domain::{
    Booking, BookingStatus, NewBooking, Result as DomainResult, SlotwiseError, SyncMark,
};
use tokio::task;

use super::manager::DbManager;
use super::sql::{map_join_error, opt_ts, parse_enum, parse_opt_ts, parse_ts, ts, usize_to_i64};
use crate::errors::conversions::to_domain;

const BOOKING_COLUMNS: &str = "id, host_user_id, availability_slot_id, guest_name, guest_email,
        guest_message, start_time, end_time, status, google_event_id, sync_status, sync_error,
        sync_attempts, last_synced, created_at, updated_at";

type BoxedParam = Box<dyn ToSql + Send>;

/// SQLite-backed implementation of `BookingRepository`
pub struct SqliteBookingRepository {
    db: Arc<DbManager>,
}

impl SqliteBookingRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Runs `SELECT <columns> FROM bookings <clause>` with positional values.
    async fn query(
        &self,
        clause: &'static str,
        values: Vec<BoxedParam>,
    ) -> DomainResult<Vec<Booking>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<Booking>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings {clause}");
            let mut stmt = conn.prepare(&sql).map_err(to_domain)?;
            let bound: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref() as &dyn ToSql).collect();
            let rows = stmt.query_map(bound.as_slice(), map_booking_row).map_err(to_domain)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(to_domain)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn query_one(
        &self,
        clause: &'static str,
        value: BoxedParam,
    ) -> DomainResult<Option<Booking>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<Booking>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings {clause}");
            let params: [&dyn ToSql; 1] = [value.as_ref()];
            conn.query_row(&sql, params.as_slice(), map_booking_row).optional().map_err(to_domain)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn create(&self, booking: &NewBooking) -> DomainResult<Booking> {
        let db = Arc::clone(&self.db);
        let booking = booking.clone();

        task::spawn_blocking(move || -> DomainResult<Booking> {
            let conn = db.get_connection()?;
            let now = ts(Utc::now());
            let start = ts(booking.start_time);
            let end = ts(booking.end_time);
            let params: [&dyn ToSql; 9] = [
                &booking.host_user_id,
                &booking.availability_slot_id,
                &booking.guest.guest_name,
                &booking.guest.guest_email,
                &booking.guest.guest_message,
                &start,
                &end,
                &now,
                &now,
            ];
            conn.execute(
                "INSERT INTO bookings (host_user_id, availability_slot_id, guest_name, guest_email,
                     guest_message, start_time, end_time, status, sync_status, sync_attempts,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'confirmed', 'pending', 0, ?8, ?9)",
                params.as_slice(),
            )
            .map_err(to_domain)?;

            let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
            conn.query_row(&sql, params![conn.last_insert_rowid()], map_booking_row)
                .map_err(to_domain)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get(&self, id: i64) -> DomainResult<Option<Booking>> {
        self.query_one("WHERE id = ?1", Box::new(id)).await
    }

    async fn list_for_host(
        &self,
        host_id: i64,
        status: Option<BookingStatus>,
    ) -> DomainResult<Vec<Booking>> {
        self.query(
            "WHERE host_user_id = ?1 AND (?2 IS NULL OR status = ?2) ORDER BY start_time DESC",
            vec![Box::new(host_id), Box::new(status.map(|s| s.to_string()))],
        )
        .await
    }

    async fn upcoming(
        &self,
        host_id: i64,
        now: DateTime<Utc>,
        limit: usize,
    ) -> DomainResult<Vec<Booking>> {
        self.query(
            "WHERE host_user_id = ?1 AND status = 'confirmed' AND start_time > ?2
             ORDER BY start_time LIMIT ?3",
            vec![Box::new(host_id), Box::new(ts(now)), Box::new(usize_to_i64(limit))],
        )
        .await
    }

    async fn find_by_guest_email(&self, host_id: i64, email: &str) -> DomainResult<Vec<Booking>> {
        self.query(
            "WHERE host_user_id = ?1 AND lower(guest_email) = ?2 ORDER BY start_time",
            vec![Box::new(host_id), Box::new(email.to_lowercase())],
        )
        .await
    }

    async fn find_by_event_id(&self, event_id: &str) -> DomainResult<Option<Booking>> {
        self.query_one("WHERE google_event_id = ?1 LIMIT 1", Box::new(event_id.to_string())).await
    }

    async fn update(&self, booking: &Booking) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let booking = booking.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let start = ts(booking.start_time);
            let end = ts(booking.end_time);
            let status = booking.status.to_string();
            let now = ts(Utc::now());
            let params: [&dyn ToSql; 8] = [
                &booking.guest_name,
                &booking.guest_email,
                &booking.guest_message,
                &start,
                &end,
                &status,
                &now,
                &booking.id,
            ];
            let changed = conn
                .execute(
                    "UPDATE bookings SET guest_name = ?1, guest_email = ?2, guest_message = ?3,
                         start_time = ?4, end_time = ?5, status = ?6, updated_at = ?7
                     WHERE id = ?8",
                    params.as_slice(),
                )
                .map_err(to_domain)?;
            ensure_changed(changed, booking.id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn mark_sync(&self, id: i64, mark: &SyncMark) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let mark = mark.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let status = mark.sync_status.to_string();
            let attempts = i64::from(mark.sync_attempts);
            let last_synced = opt_ts(mark.last_synced);
            let now = ts(Utc::now());
            let params: [&dyn ToSql; 7] = [
                &mark.google_event_id,
                &status,
                &mark.sync_error,
                &attempts,
                &last_synced,
                &now,
                &id,
            ];
            let changed = conn
                .execute(
                    "UPDATE bookings SET google_event_id = ?1, sync_status = ?2, sync_error = ?3,
                         sync_attempts = ?4, last_synced = ?5, updated_at = ?6
                     WHERE id = ?7",
                    params.as_slice(),
                )
                .map_err(to_domain)?;
            ensure_changed(changed, id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn has_confirmed_for_slot(&self, slot_id: i64) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<bool> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM bookings
                     WHERE availability_slot_id = ?1 AND status = 'confirmed')",
                params![slot_id],
                |row| row.get::<_, i64>(0),
            )
            .map(|found| found != 0)
            .map_err(to_domain)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_needing_sync(
        &self,
        host_id: i64,
        max_attempts: u32,
        limit: usize,
    ) -> DomainResult<Vec<Booking>> {
        self.query(
            "WHERE host_user_id = ?1 AND status != 'cancelled'
               AND (sync_status IN ('pending', 'failed') OR google_event_id IS NULL)
               AND sync_attempts < ?2
             ORDER BY start_time LIMIT ?3",
            vec![
                Box::new(host_id),
                Box::new(i64::from(max_attempts)),
                Box::new(usize_to_i64(limit)),
            ],
        )
        .await
    }

    async fn list_with_events(&self, host_id: i64) -> DomainResult<Vec<Booking>> {
        self.query(
            "WHERE host_user_id = ?1 AND google_event_id IS NOT NULL ORDER BY start_time",
            vec![Box::new(host_id)],
        )
        .await
    }

    async fn list_failed(&self) -> DomainResult<Vec<Booking>> {
        self.query("WHERE sync_status = 'failed' ORDER BY host_user_id, start_time", Vec::new())
            .await
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn ensure_changed(changed: usize, id: i64) -> DomainResult<()> {
    if changed == 0 {
        return Err(SlotwiseError::NotFound(format!("Booking {id} not found")));
    }
    Ok(())
}

fn map_booking_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    let start: String = row.get(6)?;
    let end: String = row.get(7)?;
    let status: String = row.get(8)?;
    let sync_status: String = row.get(10)?;
    let attempts: i64 = row.get(12)?;
    let created: String = row.get(14)?;
    let updated: String = row.get(15)?;

    Ok(Booking {
        id: row.get(0)?,
        host_user_id: row.get(1)?,
        availability_slot_id: row.get(2)?,
        guest_name: row.get(3)?,
        guest_email: row.get(4)?,
        guest_message: row.get(5)?,
        start_time: parse_ts(6, &start)?,
        end_time: parse_ts(7, &end)?,
        status: parse_enum(8, &status)?,
        google_event_id: row.get(9)?,
        sync_status: parse_enum(10, &sync_status)?,
        sync_error: row.get(11)?,
        sync_attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
        last_synced: parse_opt_ts(13, row.get(13)?)?,
        created_at: parse_ts(14, &created)?,
        updated_at: parse_ts(15, &updated)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use slotwise_core::availability::ports::AvailabilityRepository;
    use slotwise_core::user::ports::UserRepository;
    use slotwise_domain::{GuestDetails, NewAvailabilitySlot, NewUser, SyncStatus};
    use tempfile::TempDir;

    use super::*;
    use crate::database::{SqliteAvailabilityRepository, SqliteUserRepository};

    struct Fixture {
        _dir: TempDir,
        db: Arc<DbManager>,
        repo: SqliteBookingRepository,
        host_id: i64,
    }

    async fn setup() -> Fixture {
        let dir = TempDir::new().expect("temp dir created");
        let db =
            Arc::new(DbManager::new(dir.path().join("bookings.db"), 2).expect("manager created"));
        db.run_migrations().expect("migrations run");
        let host = NewUser {
            email: "host@example.com".into(),
            scheduling_slug: "host".into(),
            ..NewUser::default()
        };
        let host = SqliteUserRepository::new(Arc::clone(&db)).create(host).await.unwrap();
        let repo = SqliteBookingRepository::new(Arc::clone(&db));
        Fixture { _dir: dir, repo, db, host_id: host.id }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 3, hour, 0, 0).unwrap()
    }

    fn new_booking(host_id: i64, hour: u32, email: &str) -> NewBooking {
        NewBooking {
            host_user_id: host_id,
            availability_slot_id: None,
            guest: GuestDetails {
                guest_name: "Guest".into(),
                guest_email: email.into(),
                guest_message: None,
            },
            start_time: at(hour),
            end_time: at(hour) + Duration::minutes(30),
        }
    }

    #[tokio::test]
    async fn create_starts_confirmed_and_pending() {
        let f = setup().await;
        let booking = f.repo.create(&new_booking(f.host_id, 9, "guest@example.com")).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.sync_status, SyncStatus::Pending);
        assert_eq!(booking.sync_attempts, 0);
        assert_eq!(booking.start_time, at(9));
        assert_eq!(f.repo.get(booking.id).await.unwrap(), Some(booking));
    }

    #[tokio::test]
    async fn listings_are_ordered_and_filtered() {
        let f = setup().await;
        let early = f.repo.create(&new_booking(f.host_id, 9, "a@example.com")).await.unwrap();
        let mut late = f.repo.create(&new_booking(f.host_id, 15, "B@Example.com")).await.unwrap();
        late.status = BookingStatus::Cancelled;
        f.repo.update(&late).await.unwrap();

        let all = f.repo.list_for_host(f.host_id, None).await.unwrap();
        assert_eq!(all.iter().map(|b| b.id).collect::<Vec<_>>(), vec![late.id, early.id]);
        let cancelled =
            f.repo.list_for_host(f.host_id, Some(BookingStatus::Cancelled)).await.unwrap();
        assert_eq!(cancelled.len(), 1);

        let upcoming = f.repo.upcoming(f.host_id, at(8), 10).await.unwrap();
        assert_eq!(upcoming.iter().map(|b| b.id).collect::<Vec<_>>(), vec![early.id]);
        assert!(f.repo.upcoming(f.host_id, at(10), 10).await.unwrap().is_empty());

        assert_eq!(f.repo.find_by_guest_email(f.host_id, "b@example.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sync_marks_drive_the_retry_queue() {
        let f = setup().await;
        let booking = f.repo.create(&new_booking(f.host_id, 9, "a@example.com")).await.unwrap();
        assert_eq!(f.repo.list_needing_sync(f.host_id, 3, 10).await.unwrap().len(), 1);

        let failed = SyncMark {
            google_event_id: None,
            sync_status: SyncStatus::Failed,
            sync_error: Some("boom".into()),
            sync_attempts: 3,
            last_synced: None,
        };
        f.repo.mark_sync(booking.id, &failed).await.unwrap();
        assert!(f.repo.list_needing_sync(f.host_id, 3, 10).await.unwrap().is_empty());
        assert_eq!(f.repo.list_failed().await.unwrap().len(), 1);

        let synced = SyncMark {
            google_event_id: Some("evt-9".into()),
            sync_status: SyncStatus::Synced,
            sync_error: None,
            sync_attempts: 0,
            last_synced: Some(at(10)),
        };
        f.repo.mark_sync(booking.id, &synced).await.unwrap();
        let stored = f.repo.find_by_event_id("evt-9").await.unwrap().unwrap();
        assert_eq!(stored.last_synced, Some(at(10)));
        assert_eq!(f.repo.list_with_events(f.host_id).await.unwrap().len(), 1);
        assert!(f.repo.list_failed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn slot_links_report_confirmed_bookings_and_survive_slot_deletion() {
        let f = setup().await;
        let slots = SqliteAvailabilityRepository::new(Arc::clone(&f.db));
        let slot = slots
            .create(f.host_id, &NewAvailabilitySlot { start_time: at(9), end_time: at(10) })
            .await
            .unwrap();
        let mut request = new_booking(f.host_id, 9, "a@example.com");
        request.availability_slot_id = Some(slot.id);
        let booking = f.repo.create(&request).await.unwrap();

        assert!(f.repo.has_confirmed_for_slot(slot.id).await.unwrap());
        slots.delete(slot.id).await.unwrap();
        assert_eq!(f.repo.get(booking.id).await.unwrap().unwrap().availability_slot_id, None);
        let missing = f.repo.update(&Booking { id: 999, ..booking }).await;
        assert!(matches!(missing, Err(SlotwiseError::NotFound(_))));
    }
}
