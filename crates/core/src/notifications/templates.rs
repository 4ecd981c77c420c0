//! Email bodies for account and booking events

use chrono::{DateTime, Utc};
use slotwise_domain::{Booking, User};

use super::ports::EmailMessage;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn long_time(instant: DateTime<Utc>) -> String {
    instant.format("%B %d, %Y at %I:%M %p UTC").to_string()
}

fn short_time(instant: DateTime<Utc>) -> String {
    instant.format("%I:%M %p UTC").to_string()
}

fn page(banner: &str, color: &str, inner: &str) -> String {
    format!(
        "<html><body style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
<div style=\"background-color: {color}; color: white; padding: 20px; text-align: center;\">\
<h1>{banner}</h1></div>\
<div style=\"padding: 20px;\">{inner}<p>Best regards,<br>The Slotwise Team</p></div>\
</body></html>"
    )
}

fn details(booking: &Booking) -> String {
    format!(
        "<div style=\"background-color: #f3f4f6; padding: 15px; border-radius: 8px;\">\
<p><strong>Date &amp; Time:</strong> {} - {}</p><p><strong>Booking ID:</strong> #{}</p></div>",
        long_time(booking.start_time),
        short_time(booking.end_time),
        booking.id
    )
}

/// Account verification link under `base_url`
pub fn verification(user: &User, base_url: &str, token: &str) -> EmailMessage {
    let base = base_url.trim_end_matches('/');
    let url = format!("{base}/api/v1/auth/verify-email?token={token}");
    let inner = format!(
        "<p>Please verify your email address by clicking the link below:</p>\
<p><a href=\"{url}\">Verify Email</a></p>\
<p>If the link doesn't work, copy this URL into your browser:</p><p>{url}</p>"
    );
    EmailMessage {
        to: user.email.clone(),
        subject: "Verify Your Email - Slotwise".to_string(),
        html_body: page("Welcome to Slotwise!", "#4f46e5", &inner),
    }
}

pub fn guest_confirmation(host: &User, booking: &Booking) -> EmailMessage {
    let host_name = escape(host.display_name());
    let mut inner = format!(
        "<p>Hi {},</p>\
<p>Great news! Your booking with <strong>{host_name}</strong> has been confirmed.</p>{}",
        escape(&booking.guest_name),
        details(booking)
    );
    if let Some(message) = booking.guest_message.as_deref().filter(|m| !m.is_empty()) {
        inner.push_str(&format!("<p><strong>Your Message:</strong> {}</p>", escape(message)));
    }
    inner.push_str("<p>You should receive a calendar invitation shortly.</p>");
    EmailMessage {
        to: booking.guest_email.clone(),
        subject: format!("Booking Confirmed with {}", host.display_name()),
        html_body: page("Booking Confirmed!", "#4f46e5", &inner),
    }
}

pub fn host_notification(host: &User, booking: &Booking) -> EmailMessage {
    let mut inner = format!(
        "<p>Hi {},</p><p>You have a new booking.</p>\
<p><strong>Guest:</strong> {}</p><p><strong>Email:</strong> {}</p>{}",
        escape(host.display_name()),
        escape(&booking.guest_name),
        escape(&booking.guest_email),
        details(booking)
    );
    if let Some(message) = booking.guest_message.as_deref().filter(|m| !m.is_empty()) {
        inner.push_str(&format!("<p><strong>Guest Message:</strong> \"{}\"</p>", escape(message)));
    }
    EmailMessage {
        to: host.email.clone(),
        subject: format!("New Booking: {}", booking.guest_name),
        html_body: page("New Booking Received!", "#059669", &inner),
    }
}

/// Reschedule notice addressed to `to_name` at `to_email`.
pub fn rescheduled(
    host: &User,
    booking: &Booking,
    to_email: &str,
    to_name: &str,
    old_start: DateTime<Utc>,
    reason: &str,
) -> EmailMessage {
    let mut inner = format!(
        "<p>Hi {},</p>\
<p>The meeting with <strong>{}</strong> originally at {} has been moved.</p>{}",
        escape(to_name),
        escape(host.display_name()),
        long_time(old_start),
        details(booking)
    );
    if !reason.trim().is_empty() {
        inner.push_str(&format!("<p><strong>Reason:</strong> {}</p>", escape(reason)));
    }
    EmailMessage {
        to: to_email.to_string(),
        subject: format!("Booking Rescheduled with {}", host.display_name()),
        html_body: page("Booking Rescheduled", "#d97706", &inner),
    }
}

pub fn cancelled(host: &User, booking: &Booking) -> EmailMessage {
    let inner = format!(
        "<p>Hi {},</p><p>Your booking with <strong>{}</strong> has been cancelled.</p>{}",
        escape(&booking.guest_name),
        escape(host.display_name()),
        details(booking)
    );
    EmailMessage {
        to: booking.guest_email.clone(),
        subject: format!("Booking Cancelled with {}", host.display_name()),
        html_body: page("Booking Cancelled", "#dc2626", &inner),
    }
}

pub fn host_to_guest(host: &User, booking: &Booking, subject: &str, message: &str) -> EmailMessage {
    let inner = format!(
        "<p>Hi {},</p>{}<div style=\"white-space: pre-wrap;\">{}</div>",
        escape(&booking.guest_name),
        details(booking),
        escape(message)
    );
    EmailMessage {
        to: booking.guest_email.clone(),
        subject: subject.to_string(),
        html_body: page(
            &format!("Message from {}", escape(host.display_name())),
            "#4f46e5",
            &inner,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_in_guest_text() {
        assert_eq!(
            escape("<b>Tom & \"Jerry\"</b>"),
            "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;"
        );
    }
}
