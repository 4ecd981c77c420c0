//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Slotwise
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SlotwiseError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SlotwiseError {
    /// Short machine-readable label for the variant.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::Security(_) => "security",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Conflict(_) => "conflict",
            Self::Calendar(_) => "calendar",
            Self::Internal(_) => "internal",
        }
    }

    /// Message carried by the variant, without the display prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Database(m)
            | Self::Config(m)
            | Self::Network(m)
            | Self::Auth(m)
            | Self::Security(m)
            | Self::NotFound(m)
            | Self::InvalidInput(m)
            | Self::Conflict(m)
            | Self::Calendar(m)
            | Self::Internal(m) => m,
        }
    }
}

/// Result type alias for Slotwise operations
pub type Result<T> = std::result::Result<T, SlotwiseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let err = SlotwiseError::NotFound("booking 4".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "NotFound");
        assert_eq!(json["message"], "booking 4");
    }

    #[test]
    fn kind_and_message_expose_parts() {
        let err = SlotwiseError::Conflict("slot already booked".into());
        assert_eq!(err.kind(), "conflict");
        assert_eq!(err.message(), "slot already booked");
        assert_eq!(err.to_string(), "Conflict: slot already booked");
    }
}
