//! User account types
//!
//! Accounts are created either by email/password registration or by the
//! Google sign-in callback. Google tokens live on the account row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default meeting length offered on the public booking page.
pub const DEFAULT_MEETING_DURATION_MINUTES: i64 = 30;

/// User account stored in the local database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(skip_serializing)]
    pub hashed_password: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    pub google_id: Option<String>,
    #[serde(skip_serializing)]
    pub google_access_token: Option<String>,
    #[serde(skip_serializing)]
    pub google_refresh_token: Option<String>,
    pub google_calendar_connected: bool,
    pub scheduling_slug: String,
    pub meeting_duration_minutes: i64,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name used in emails and calendar invites.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(&self.email)
    }

    /// True when calendar calls can be attempted for this user.
    pub fn has_calendar(&self) -> bool {
        self.google_calendar_connected && self.google_access_token.is_some()
    }
}

/// Public projection of a user (no secrets)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub google_calendar_connected: bool,
    pub scheduling_slug: String,
    pub meeting_duration_minutes: i64,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            is_active: user.is_active,
            is_verified: user.is_verified,
            google_calendar_connected: user.google_calendar_connected,
            scheduling_slug: user.scheduling_slug.clone(),
            meeting_duration_minutes: user.meeting_duration_minutes,
            timezone: user.timezone.clone(),
            created_at: user.created_at,
        }
    }
}

/// Public host card shown to guests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProfile {
    pub name: String,
    pub scheduling_slug: String,
    pub meeting_duration_minutes: i64,
    pub timezone: String,
}

impl From<&User> for HostProfile {
    fn from(user: &User) -> Self {
        Self {
            name: user.display_name().to_string(),
            scheduling_slug: user.scheduling_slug.clone(),
            meeting_duration_minutes: user.meeting_duration_minutes,
            timezone: user.timezone.clone(),
        }
    }
}

/// Insert payload for a new account
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub full_name: Option<String>,
    pub hashed_password: Option<String>,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub google_id: Option<String>,
    pub scheduling_slug: String,
}

/// Tokens returned by the Google token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

/// Subset of the Google userinfo document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub verified_email: Option<bool>,
}

/// Bearer token issued after a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

impl AccessToken {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self { access_token: token.into(), token_type: "bearer".to_string() }
    }
}
