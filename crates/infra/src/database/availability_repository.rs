//! Availability slot repository implementation using SQLite

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row, ToSql};
use slotwise_core::availability::ports::AvailabilityRepository;
use slotwise_domain::{AvailabilitySlot, NewAvailabilitySlot, Result as DomainResult, SlotwiseError};
use tokio::task;

use super::manager::DbManager;
use super::sql::{bool_to_int, int_to_bool, map_join_error, opt_ts, parse_ts, ts};
use crate::errors::conversions::to_domain;

const SLOT_COLUMNS: &str =
    "id, user_id, start_time, end_time, is_available, google_event_id, created_at";

/// SQLite-backed implementation of `AvailabilityRepository`
pub struct SqliteAvailabilityRepository {
    db: Arc<DbManager>,
}

impl SqliteAvailabilityRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    async fn query(
        &self,
        sql: String,
        values: Vec<Box<dyn ToSql + Send>>,
    ) -> DomainResult<Vec<AvailabilitySlot>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<AvailabilitySlot>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(&sql).map_err(to_domain)?;
            let bound: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref() as &dyn ToSql).collect();
            let rows = stmt.query_map(bound.as_slice(), map_slot_row).map_err(to_domain)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(to_domain)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn execute(
        &self,
        id: i64,
        sql: &'static str,
        value: Box<dyn ToSql + Send>,
    ) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let params: [&dyn ToSql; 2] = [value.as_ref(), &id];
            let changed = conn.execute(sql, params.as_slice()).map_err(to_domain)?;
            if changed == 0 {
                return Err(SlotwiseError::NotFound(format!("Availability slot {id} not found")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl AvailabilityRepository for SqliteAvailabilityRepository {
    async fn create(
        &self,
        user_id: i64,
        slot: &NewAvailabilitySlot,
    ) -> DomainResult<AvailabilitySlot> {
        let db = Arc::clone(&self.db);
        let start = ts(slot.start_time);
        let end = ts(slot.end_time);

        task::spawn_blocking(move || -> DomainResult<AvailabilitySlot> {
            let conn = db.get_connection()?;
            let now = ts(Utc::now());
            conn.execute(
                "INSERT INTO availability_slots
                     (user_id, start_time, end_time, is_available, created_at)
                 VALUES (?1, ?2, ?3, 1, ?4)",
                params![user_id, start, end, now],
            )
            .map_err(to_domain)?;

            let sql = format!("SELECT {SLOT_COLUMNS} FROM availability_slots WHERE id = ?1");
            conn.query_row(&sql, params![conn.last_insert_rowid()], map_slot_row)
                .map_err(to_domain)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get(&self, id: i64) -> DomainResult<Option<AvailabilitySlot>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<AvailabilitySlot>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {SLOT_COLUMNS} FROM availability_slots WHERE id = ?1");
            conn.query_row(&sql, params![id], map_slot_row).optional().map_err(to_domain)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        include_unavailable: bool,
    ) -> DomainResult<Vec<AvailabilitySlot>> {
        let filter = if include_unavailable { "" } else { " AND is_available = 1" };
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM availability_slots
             WHERE user_id = ?1{filter} ORDER BY start_time"
        );
        self.query(sql, vec![Box::new(user_id)]).await
    }

    async fn list_bookable(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> DomainResult<Vec<AvailabilitySlot>> {
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM availability_slots s
             WHERE s.user_id = ?1 AND s.is_available = 1 AND s.start_time >= ?2
               AND (?3 IS NULL OR s.start_time < ?3)
               AND NOT EXISTS (
                   SELECT 1 FROM bookings b
                   WHERE b.availability_slot_id = s.id AND b.status = 'confirmed'
               )
             ORDER BY s.start_time"
        );
        self.query(sql, vec![Box::new(user_id), Box::new(ts(from)), Box::new(opt_ts(until))]).await
    }

    async fn list_covering(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<AvailabilitySlot>> {
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM availability_slots
             WHERE user_id = ?1 AND is_available = 1 AND start_time <= ?2 AND end_time >= ?3
             ORDER BY start_time"
        );
        self.query(sql, vec![Box::new(user_id), Box::new(ts(start)), Box::new(ts(end))]).await
    }

    async fn exists_exact(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);
        let start = ts(start);
        let end = ts(end);

        task::spawn_blocking(move || -> DomainResult<bool> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM availability_slots
                               WHERE user_id = ?1 AND start_time = ?2 AND end_time = ?3)",
                params![user_id, start, end],
                |row| row.get::<_, i64>(0),
            )
            .map(int_to_bool)
            .map_err(to_domain)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, slot: &AvailabilitySlot) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = slot.id;
        let start = ts(slot.start_time);
        let end = ts(slot.end_time);
        let available = bool_to_int(slot.is_available);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE availability_slots SET start_time = ?1, end_time = ?2, is_available = ?3
                     WHERE id = ?4",
                    params![start, end, available, id],
                )
                .map_err(to_domain)?;
            if changed == 0 {
                return Err(SlotwiseError::NotFound(format!("Availability slot {id} not found")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_available(&self, id: i64, available: bool) -> DomainResult<()> {
        self.execute(
            id,
            "UPDATE availability_slots SET is_available = ?1 WHERE id = ?2",
            Box::new(bool_to_int(available)),
        )
        .await
    }

    async fn set_event_id(&self, id: i64, event_id: Option<&str>) -> DomainResult<()> {
        self.execute(
            id,
            "UPDATE availability_slots SET google_event_id = ?1 WHERE id = ?2",
            Box::new(event_id.map(str::to_string)),
        )
        .await
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute("DELETE FROM availability_slots WHERE id = ?1", params![id])
                .map_err(to_domain)?;
            if changed == 0 {
                return Err(SlotwiseError::NotFound(format!("Availability slot {id} not found")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_slot_row(row: &Row<'_>) -> rusqlite::Result<AvailabilitySlot> {
    let start: String = row.get(2)?;
    let end: String = row.get(3)?;
    let created: String = row.get(6)?;

    Ok(AvailabilitySlot {
        id: row.get(0)?,
        user_id: row.get(1)?,
        start_time: parse_ts(2, &start)?,
        end_time: parse_ts(3, &end)?,
        is_available: int_to_bool(row.get(4)?),
        google_event_id: row.get(5)?,
        created_at: parse_ts(6, &created)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use slotwise_core::user::ports::UserRepository;
    use slotwise_domain::NewUser;
    use tempfile::TempDir;

    use super::*;
    use crate::database::SqliteUserRepository;

    struct Fixture {
        _dir: TempDir,
        db: Arc<DbManager>,
        repo: SqliteAvailabilityRepository,
        user_id: i64,
    }

    async fn setup() -> Fixture {
        let dir = TempDir::new().expect("temp dir created");
        let db = Arc::new(DbManager::new(dir.path().join("slots.db"), 2).expect("manager created"));
        db.run_migrations().expect("migrations run");
        let user = NewUser {
            email: "host@example.com".into(),
            scheduling_slug: "host".into(),
            ..NewUser::default()
        };
        let user = SqliteUserRepository::new(Arc::clone(&db)).create(user).await.unwrap();
        let repo = SqliteAvailabilityRepository::new(Arc::clone(&db));
        Fixture { _dir: dir, repo, db, user_id: user.id }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 3, hour, 0, 0).unwrap()
    }

    fn window(hour: u32) -> NewAvailabilitySlot {
        NewAvailabilitySlot { start_time: at(hour), end_time: at(hour) + Duration::minutes(30) }
    }

    #[tokio::test]
    async fn list_orders_by_start_and_hides_unavailable() {
        let f = setup().await;
        let late = f.repo.create(f.user_id, &window(14)).await.unwrap();
        let early = f.repo.create(f.user_id, &window(9)).await.unwrap();
        f.repo.set_available(late.id, false).await.unwrap();

        let visible = f.repo.list_for_user(f.user_id, false).await.unwrap();
        assert_eq!(visible.iter().map(|s| s.id).collect::<Vec<_>>(), vec![early.id]);

        let all = f.repo.list_for_user(f.user_id, true).await.unwrap();
        assert_eq!(all.iter().map(|s| s.id).collect::<Vec<_>>(), vec![early.id, late.id]);
    }

    #[tokio::test]
    async fn bookable_excludes_confirmed_bookings_and_respects_window() {
        let f = setup().await;
        let booked = f.repo.create(f.user_id, &window(9)).await.unwrap();
        let open = f.repo.create(f.user_id, &window(10)).await.unwrap();
        f.repo.create(f.user_id, &window(16)).await.unwrap();

        let conn = f.db.get_connection().unwrap();
        conn.execute(
            "INSERT INTO bookings (host_user_id, availability_slot_id, guest_name, guest_email,
                 start_time, end_time, status, created_at, updated_at)
             VALUES (?1, ?2, 'Guest', 'g@example.com', ?3, ?4, 'confirmed', ?3, ?3)",
            params![f.user_id, booked.id, ts(booked.start_time), ts(booked.end_time)],
        )
        .unwrap();

        let bookable = f.repo.list_bookable(f.user_id, at(8), Some(at(12))).await.unwrap();
        assert_eq!(bookable.iter().map(|s| s.id).collect::<Vec<_>>(), vec![open.id]);
        assert_eq!(f.repo.list_bookable(f.user_id, at(8), None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn covering_and_exact_lookups() {
        let f = setup().await;
        let slot = f
            .repo
            .create(f.user_id, &NewAvailabilitySlot { start_time: at(9), end_time: at(12) })
            .await
            .unwrap();

        assert_eq!(f.repo.list_covering(f.user_id, at(10), at(11)).await.unwrap()[0].id, slot.id);
        assert!(f.repo.list_covering(f.user_id, at(11), at(13)).await.unwrap().is_empty());
        assert!(f.repo.exists_exact(f.user_id, at(9), at(12)).await.unwrap());
        assert!(!f.repo.exists_exact(f.user_id, at(9), at(11)).await.unwrap());
    }

    #[tokio::test]
    async fn update_event_id_and_delete() {
        let f = setup().await;
        let mut slot = f.repo.create(f.user_id, &window(9)).await.unwrap();

        slot.end_time = at(10);
        f.repo.update(&slot).await.unwrap();
        f.repo.set_event_id(slot.id, Some("evt-1")).await.unwrap();
        let stored = f.repo.get(slot.id).await.unwrap().unwrap();
        assert_eq!(stored.end_time, at(10));
        assert_eq!(stored.google_event_id.as_deref(), Some("evt-1"));

        f.repo.delete(slot.id).await.unwrap();
        assert!(f.repo.get(slot.id).await.unwrap().is_none());
        assert!(matches!(f.repo.delete(slot.id).await, Err(SlotwiseError::NotFound(_))));
    }
}
