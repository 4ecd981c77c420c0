//! Google integrations: OAuth sign-in, Calendar v3 and Gmail delivery

pub mod calendar;
pub mod errors;
pub mod gateway;
pub mod gmail;
pub mod oauth;

pub use calendar::GoogleCalendarClient;
pub use errors::{GoogleApiError, GoogleResult};
pub use gateway::{GoogleCalendarGateway, RefreshingCalendarClient};
pub use gmail::GmailMailer;
pub use oauth::{GoogleOAuth, OAuthIntent};

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";
const GMAIL_SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

/// Google endpoint URLs, overridable so tests can point at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub events_url: String,
    pub gmail_send_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            events_url: EVENTS_URL.to_string(),
            gmail_send_url: GMAIL_SEND_URL.to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// Every endpoint rooted at `base`, using short paths.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{base}/auth"),
            token_url: format!("{base}/token"),
            userinfo_url: format!("{base}/userinfo"),
            events_url: format!("{base}/calendars/primary/events"),
            gmail_send_url: format!("{base}/gmail/send"),
        }
    }
}
