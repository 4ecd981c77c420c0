//! Account repository implementation using SQLite

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use slotwise_core::user::ports::UserRepository;
use slotwise_domain::utils::timezone::DEFAULT_TIMEZONE;
use slotwise_domain::{
    GoogleTokens, NewUser, Result as DomainResult, SlotwiseError, User,
    DEFAULT_MEETING_DURATION_MINUTES,
};
use tokio::task;

use super::manager::DbManager;
use super::sql::{bool_to_int, int_to_bool, map_join_error, parse_ts, ts};
use crate::errors::conversions::to_domain;

const USER_COLUMNS: &str = "id, email, full_name, hashed_password, is_active, is_verified,
        verification_token, google_id, google_access_token, google_refresh_token,
        google_calendar_connected, scheduling_slug, meeting_duration_minutes, timezone, created_at,
        updated_at";

/// SQLite-backed implementation of `UserRepository`
pub struct SqliteUserRepository {
    db: Arc<DbManager>,
}

impl SqliteUserRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &'static str, value: &str) -> DomainResult<Option<User>> {
        let db = Arc::clone(&self.db);
        let value = value.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<User>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
            conn.query_row(&sql, params![value], map_user_row).optional().map_err(to_domain)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Runs an update whose text params precede `updated_at` and the id.
    async fn execute(
        &self,
        sql: &'static str,
        values: Vec<Option<String>>,
        id: i64,
    ) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let now = ts(Utc::now());
            let mut bound: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
            bound.push(&now);
            bound.push(&id);
            let changed = conn.execute(sql, bound.as_slice()).map_err(to_domain)?;
            ensure_changed(changed, id)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<User> {
            let conn = db.get_connection()?;
            let now = ts(Utc::now());
            let params: [&dyn ToSql; 11] = [
                &user.email,
                &user.full_name,
                &user.hashed_password,
                &bool_to_int(user.is_verified),
                &user.verification_token,
                &user.google_id,
                &user.scheduling_slug,
                &DEFAULT_MEETING_DURATION_MINUTES,
                &DEFAULT_TIMEZONE,
                &now,
                &now,
            ];
            conn.execute(
                "INSERT INTO users (email, full_name, hashed_password, is_active, is_verified,
                    verification_token, google_id, scheduling_slug, meeting_duration_minutes,
                    timezone, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params.as_slice(),
            )
            .map_err(to_domain)?;

            load_user(&conn, conn.last_insert_rowid())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_by_id(&self, id: i64) -> DomainResult<Option<User>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<User>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
            conn.query_row(&sql, params![id], map_user_row).optional().map_err(to_domain)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn get_by_google_id(&self, google_id: &str) -> DomainResult<Option<User>> {
        self.find_one("google_id", google_id).await
    }

    async fn get_by_slug(&self, slug: &str) -> DomainResult<Option<User>> {
        self.find_one("scheduling_slug", slug).await
    }

    async fn get_by_verification_token(&self, token: &str) -> DomainResult<Option<User>> {
        self.find_one("verification_token", token).await
    }

    async fn mark_verified(&self, id: i64) -> DomainResult<()> {
        self.execute(
            "UPDATE users SET is_verified = 1, verification_token = NULL, updated_at = ?1
             WHERE id = ?2",
            Vec::new(),
            id,
        )
        .await
    }

    async fn connect_google(
        &self,
        id: i64,
        google_id: Option<&str>,
        tokens: &GoogleTokens,
    ) -> DomainResult<()> {
        self.execute(
            "UPDATE users SET google_id = COALESCE(?1, google_id),
                    google_access_token = ?2,
                    google_refresh_token = COALESCE(?3, google_refresh_token),
                    google_calendar_connected = 1,
                    updated_at = ?4
             WHERE id = ?5",
            vec![
                google_id.map(str::to_string),
                Some(tokens.access_token.clone()),
                tokens.refresh_token.clone(),
            ],
            id,
        )
        .await
    }

    async fn update_access_token(&self, id: i64, access_token: &str) -> DomainResult<()> {
        self.execute(
            "UPDATE users SET google_access_token = ?1, updated_at = ?2 WHERE id = ?3",
            vec![Some(access_token.to_string())],
            id,
        )
        .await
    }

    async fn disconnect_calendar(&self, id: i64, forget_tokens: bool) -> DomainResult<()> {
        let sql = if forget_tokens {
            "UPDATE users SET google_calendar_connected = 0, google_access_token = NULL,
                    google_refresh_token = NULL, updated_at = ?1
             WHERE id = ?2"
        } else {
            "UPDATE users SET google_calendar_connected = 0, updated_at = ?1 WHERE id = ?2"
        };
        self.execute(sql, Vec::new(), id).await
    }

    async fn list_calendar_users(&self) -> DomainResult<Vec<User>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<User>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE google_calendar_connected = 1 AND google_access_token IS NOT NULL
                 ORDER BY id"
            );
            query_users(&conn, &sql)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_all(&self) -> DomainResult<Vec<User>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<User>> {
            let conn = db.get_connection()?;
            query_users(&conn, &format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn load_user(conn: &Connection, id: i64) -> DomainResult<User> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, params![id], map_user_row).map_err(to_domain)
}

fn query_users(conn: &Connection, sql: &str) -> DomainResult<Vec<User>> {
    let mut stmt = conn.prepare(sql).map_err(to_domain)?;
    let rows = stmt.query_map([], map_user_row).map_err(to_domain)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(to_domain)
}

fn ensure_changed(changed: usize, id: i64) -> DomainResult<()> {
    if changed == 0 {
        return Err(SlotwiseError::NotFound(format!("User {id} not found")));
    }
    Ok(())
}

fn map_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(14)?;
    let updated_at: String = row.get(15)?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        hashed_password: row.get(3)?,
        is_active: int_to_bool(row.get(4)?),
        is_verified: int_to_bool(row.get(5)?),
        verification_token: row.get(6)?,
        google_id: row.get(7)?,
        google_access_token: row.get(8)?,
        google_refresh_token: row.get(9)?,
        google_calendar_connected: int_to_bool(row.get(10)?),
        scheduling_slug: row.get(11)?,
        meeting_duration_minutes: row.get(12)?,
        timezone: row.get(13)?,
        created_at: parse_ts(14, &created_at)?,
        updated_at: parse_ts(15, &updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn setup() -> (TempDir, SqliteUserRepository) {
        let dir = TempDir::new().expect("temp dir created");
        let db = DbManager::new(dir.path().join("users.db"), 2).expect("manager created");
        db.run_migrations().expect("migrations run");
        (dir, SqliteUserRepository::new(Arc::new(db)))
    }

    fn new_user(email: &str, slug: &str) -> NewUser {
        NewUser {
            email: email.into(),
            full_name: Some("Ada Lovelace".into()),
            hashed_password: Some("hash".into()),
            verification_token: Some(format!("token-{slug}")),
            scheduling_slug: slug.into(),
            ..NewUser::default()
        }
    }

    #[tokio::test]
    async fn create_applies_defaults_and_lookups_find_the_row() {
        let (_dir, repo) = setup();
        let user = repo.create(new_user("ada@example.com", "ada")).await.unwrap();

        assert!(user.is_active);
        assert!(!user.is_verified);
        assert_eq!(user.timezone, "UTC");
        assert_eq!(user.meeting_duration_minutes, 30);
        assert_eq!(repo.get_by_email("ada@example.com").await.unwrap().unwrap().id, user.id);
        assert_eq!(repo.get_by_slug("ada").await.unwrap().unwrap().id, user.id);
        assert!(repo.get_by_id(user.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (_dir, repo) = setup();
        repo.create(new_user("ada@example.com", "ada")).await.unwrap();

        let err = repo.create(new_user("ada@example.com", "ada-2")).await.unwrap_err();
        assert!(matches!(err, SlotwiseError::Conflict(_)));
    }

    #[tokio::test]
    async fn verification_clears_the_token() {
        let (_dir, repo) = setup();
        let user = repo.create(new_user("ada@example.com", "ada")).await.unwrap();
        let found = repo.get_by_verification_token("token-ada").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        repo.mark_verified(user.id).await.unwrap();

        let verified = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(verified.is_verified);
        assert!(verified.verification_token.is_none());
        assert!(repo.get_by_verification_token("token-ada").await.unwrap().is_none());
        assert!(matches!(repo.mark_verified(999).await, Err(SlotwiseError::NotFound(_))));
    }

    #[tokio::test]
    async fn google_connection_keeps_refresh_token_until_forgotten() {
        let (_dir, repo) = setup();
        let user = repo.create(new_user("ada@example.com", "ada")).await.unwrap();
        let first = GoogleTokens {
            access_token: "access-1".into(),
            refresh_token: Some("refresh-1".into()),
            expires_in: Some(3600),
        };
        repo.connect_google(user.id, Some("g-123"), &first).await.unwrap();

        let second =
            GoogleTokens { access_token: "access-2".into(), refresh_token: None, expires_in: None };
        repo.connect_google(user.id, None, &second).await.unwrap();

        let linked = repo.get_by_google_id("g-123").await.unwrap().unwrap();
        assert!(linked.has_calendar());
        assert_eq!(linked.google_access_token.as_deref(), Some("access-2"));
        assert_eq!(linked.google_refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(repo.list_calendar_users().await.unwrap().len(), 1);

        repo.update_access_token(user.id, "access-3").await.unwrap();
        repo.disconnect_calendar(user.id, false).await.unwrap();
        let paused = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(!paused.google_calendar_connected);
        assert_eq!(paused.google_access_token.as_deref(), Some("access-3"));
        assert!(repo.list_calendar_users().await.unwrap().is_empty());

        repo.disconnect_calendar(user.id, true).await.unwrap();
        let cleared = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(cleared.google_access_token.is_none());
        assert!(cleared.google_refresh_token.is_none());
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }
}
