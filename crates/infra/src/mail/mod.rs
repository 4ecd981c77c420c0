//! Mailers that do not depend on a provider

use async_trait::async_trait;
use slotwise_core::notifications::ports::{EmailMessage, Mailer};
use slotwise_domain::{Result, User};

/// Used when outgoing email is disabled: logs and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, sender: &User, message: &EmailMessage) -> Result<()> {
        log::info!(
            "email disabled; dropping '{}' from user {} to {}",
            message.subject,
            sender.id,
            message.to
        );
        Ok(())
    }
}
