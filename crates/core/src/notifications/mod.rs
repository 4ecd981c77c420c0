//! Outgoing notifications
//!
//! Delivery failures never fail the operation that triggered them; they are
//! logged and reported as `false`.

pub mod ports;
pub mod templates;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use slotwise_domain::{Booking, User};
use tracing::warn;

pub use ports::{EmailMessage, Mailer};

/// Renders templates and hands them to the configured mailer
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    base_url: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, base_url: impl Into<String>) -> Self {
        Self { mailer, base_url: base_url.into() }
    }

    async fn deliver(&self, sender: &User, message: EmailMessage) -> bool {
        match self.mailer.send(sender, &message).await {
            Ok(()) => true,
            Err(err) => {
                warn!(subject = %message.subject, error = %err, "email delivery failed");
                false
            }
        }
    }

    pub async fn verification(&self, user: &User, token: &str) -> bool {
        self.deliver(user, templates::verification(user, &self.base_url, token)).await
    }

    /// Guest confirmation and host notice; true when both were delivered
    pub async fn booking_confirmed(&self, host: &User, booking: &Booking) -> bool {
        let guest = self.deliver(host, templates::guest_confirmation(host, booking)).await;
        let host_sent = self.deliver(host, templates::host_notification(host, booking)).await;
        guest && host_sent
    }

    pub async fn booking_rescheduled(
        &self,
        host: &User,
        booking: &Booking,
        old_start: DateTime<Utc>,
        reason: &str,
    ) -> bool {
        let to_guest = templates::rescheduled(
            host,
            booking,
            &booking.guest_email,
            &booking.guest_name,
            old_start,
            reason,
        );
        let to_host = templates::rescheduled(
            host,
            booking,
            &host.email,
            host.display_name(),
            old_start,
            reason,
        );
        let guest = self.deliver(host, to_guest).await;
        let host_sent = self.deliver(host, to_host).await;
        guest && host_sent
    }

    pub async fn booking_cancelled(&self, host: &User, booking: &Booking) -> bool {
        self.deliver(host, templates::cancelled(host, booking)).await
    }

    pub async fn host_to_guest(
        &self,
        host: &User,
        booking: &Booking,
        subject: &str,
        message: &str,
    ) -> bool {
        self.deliver(host, templates::host_to_guest(host, booking, subject, message)).await
    }
}
