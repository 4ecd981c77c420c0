use std::sync::Arc;
use std::time::Duration;

use slotwise_core::UserRepository;
use slotwise_domain::{GoogleConfig, GoogleTokens, NewUser, User};
use slotwise_infra::database::{DbManager, SqliteUserRepository};
use slotwise_infra::http::HttpClient;
use tempfile::TempDir;

/// Temporary database that stays alive for the duration of a test.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = DbManager::new(temp_dir.path().join("test.db"), 4)
            .expect("db manager should be created");
        manager.run_migrations().expect("migrations should apply");
        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn users(&self) -> Arc<SqliteUserRepository> {
        Arc::new(SqliteUserRepository::new(Arc::clone(&self.manager)))
    }
}

/// HTTP client without retries so mock expectations stay exact.
pub fn test_http() -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(5))
        .max_attempts(1)
        .build()
        .expect("http client")
}

pub fn google_config() -> GoogleConfig {
    GoogleConfig {
        client_id: "client-1".into(),
        client_secret: "secret-1".into(),
        redirect_uri: "http://localhost:8000/api/v1/auth/google/callback".into(),
        calendar_redirect_uri: String::new(),
    }
}

/// Host with a linked calendar holding `access_token` and, optionally, a refresh token.
pub async fn connected_user(
    users: &SqliteUserRepository,
    access_token: &str,
    refresh_token: Option<&str>,
) -> User {
    let user = users
        .create(NewUser {
            email: "host@example.com".into(),
            full_name: Some("Host Person".into()),
            is_verified: true,
            scheduling_slug: "host-person".into(),
            ..NewUser::default()
        })
        .await
        .expect("user should be created");
    let tokens = GoogleTokens {
        access_token: access_token.into(),
        refresh_token: refresh_token.map(str::to_string),
        expires_in: Some(3600),
    };
    users
        .connect_google(user.id, Some("google-1"), &tokens)
        .await
        .expect("calendar should connect");
    users.get_by_id(user.id).await.expect("lookup").expect("user exists")
}
