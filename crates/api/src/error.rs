//! HTTP error mapping

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use slotwise_domain::SlotwiseError;
use thiserror::Error;

/// Domain error carried to the HTTP boundary
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub SlotwiseError);

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(SlotwiseError::InvalidInput(message.into()))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(SlotwiseError::Auth(message.into()))
    }

    pub const fn status(&self) -> StatusCode {
        match &self.0 {
            SlotwiseError::NotFound(_) => StatusCode::NOT_FOUND,
            SlotwiseError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SlotwiseError::Auth(_) => StatusCode::UNAUTHORIZED,
            SlotwiseError::Security(_) => StatusCode::FORBIDDEN,
            SlotwiseError::Conflict(_) => StatusCode::CONFLICT,
            SlotwiseError::Calendar(_) | SlotwiseError::Network(_) => StatusCode::BAD_GATEWAY,
            SlotwiseError::Config(_) | SlotwiseError::Database(_) | SlotwiseError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({ "error": self.0.kind(), "detail": self.0.message() });
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
