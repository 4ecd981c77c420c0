//! Port interface for outgoing email

use async_trait::async_trait;
use slotwise_domain::{Result, User};

/// Rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivers email on behalf of an account
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send `message` as `sender`
    async fn send(&self, sender: &User, message: &EmailMessage) -> Result<()>;
}
