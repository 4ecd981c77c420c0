//! Port interfaces for account management
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations for accounts and credentials.

use async_trait::async_trait;
use slotwise_domain::{GoogleTokens, NewUser, Result, User};

/// Trait for account persistence and retrieval
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account and return the stored row
    async fn create(&self, user: NewUser) -> Result<User>;

    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn get_by_google_id(&self, google_id: &str) -> Result<Option<User>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<User>>;

    async fn get_by_verification_token(&self, token: &str) -> Result<Option<User>>;

    /// Mark the account verified and clear its verification token
    async fn mark_verified(&self, id: i64) -> Result<()>;

    /// Store Google credentials and flag the calendar as connected.
    ///
    /// A `None` refresh token keeps the stored one.
    async fn connect_google(
        &self,
        id: i64,
        google_id: Option<&str>,
        tokens: &GoogleTokens,
    ) -> Result<()>;

    /// Replace the access token after a refresh
    async fn update_access_token(&self, id: i64, access_token: &str) -> Result<()>;

    /// Clear the connected flag; tokens are dropped when `forget_tokens` is set
    async fn disconnect_calendar(&self, id: i64, forget_tokens: bool) -> Result<()>;

    /// Accounts with a connected calendar and a stored access token
    async fn list_calendar_users(&self) -> Result<Vec<User>>;

    async fn list_all(&self) -> Result<Vec<User>>;
}

/// One-way password hashing
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;

    /// Returns `Ok(false)` on mismatch; errors are reserved for malformed hashes
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Signed bearer tokens carrying the account email
pub trait TokenService: Send + Sync {
    fn issue(&self, subject: &str) -> Result<String>;

    /// Returns the subject of a valid, unexpired token
    fn verify(&self, token: &str) -> Result<String>;
}
