//! Email delivery through the Gmail REST API

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use reqwest::Method;
use serde::Serialize;
use slotwise_core::notifications::ports::{EmailMessage, Mailer};
use slotwise_domain::{Result, SlotwiseError, User};
use tracing::debug;

use super::errors::GoogleApiError;
use crate::http::HttpClient;

#[derive(Serialize)]
struct SendRequest {
    raw: String,
}

/// Sends mail as the host using their stored Google token.
pub struct GmailMailer {
    http: HttpClient,
    send_url: String,
    from_name: String,
}

impl GmailMailer {
    pub fn new(
        http: HttpClient,
        send_url: impl Into<String>,
        from_name: impl Into<String>,
    ) -> Self {
        Self { http, send_url: send_url.into(), from_name: from_name.into() }
    }
}

#[async_trait]
impl Mailer for GmailMailer {
    async fn send(&self, sender: &User, message: &EmailMessage) -> Result<()> {
        let token = sender
            .google_access_token
            .as_deref()
            .ok_or_else(|| {
                SlotwiseError::Auth("Sender has no Google credentials for Gmail".into())
            })?;

        let raw = URL_SAFE_NO_PAD.encode(rfc2822(sender, &self.from_name, message));
        let request = self
            .http
            .request(Method::POST, &self.send_url)
            .bearer_auth(token)
            .json(&SendRequest { raw });
        let response = self.http.send(request).await?;

        if !response.status().is_success() {
            return Err(GoogleApiError::from_response(response).await.into());
        }

        debug!(subject = %message.subject, "email handed to Gmail");
        Ok(())
    }
}

/// Minimal single-part HTML message.
fn rfc2822(sender: &User, from_name: &str, message: &EmailMessage) -> String {
    let display = format!("{} via {from_name}", sender.display_name());
    format!(
        "From: {} <{}>\r\nTo: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\n\
         Content-Type: text/html; charset=\"UTF-8\"\r\n\r\n{}",
        encode_header(&display),
        sender.email,
        message.to,
        encode_header(&message.subject),
        message.html_body
    )
}

/// RFC 2047 encoded word for non-ASCII header values
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value))
    }
}
