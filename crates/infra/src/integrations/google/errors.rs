//! Google API error classification

use reqwest::{Response, StatusCode};
use slotwise_domain::SlotwiseError;

/// Outcome of a failed Google API call.
///
/// `Unauthorized` drives the token refresh path; the rest are surfaced to
/// the caller as domain errors.
#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    #[error("Google rejected the access token")]
    Unauthorized,

    /// The refresh token was revoked or expired
    #[error("reconnection required")]
    ReconnectRequired,

    #[error("resource no longer exists")]
    Gone,

    #[error("resource not found")]
    NotFound,

    #[error("Google API error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] SlotwiseError),
}

impl GoogleApiError {
    /// Classify a non-success response, consuming its body for context.
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::GONE => Self::Gone,
            _ => {
                let body = response.text().await.unwrap_or_default();
                Self::Status { status: status.as_u16(), body }
            }
        }
    }
}

impl From<GoogleApiError> for SlotwiseError {
    fn from(value: GoogleApiError) -> Self {
        match value {
            GoogleApiError::Unauthorized => {
                SlotwiseError::Auth("Google rejected the access token".into())
            }
            GoogleApiError::ReconnectRequired => {
                SlotwiseError::Calendar("reconnection required".into())
            }
            GoogleApiError::Gone | GoogleApiError::NotFound => {
                SlotwiseError::NotFound("Calendar event not found".into())
            }
            GoogleApiError::Status { status, body } => SlotwiseError::Calendar(format!(
                "Google API error ({status}): {}",
                truncate(&body, 200)
            )),
            GoogleApiError::Transport(inner) => inner,
        }
    }
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

pub type GoogleResult<T> = std::result::Result<T, GoogleApiError>;
