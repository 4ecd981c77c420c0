//! OpenAI Chat Completions wire types

use serde::{Deserialize, Serialize};
use slotwise_domain::SlotwiseError;

/// OpenAI API error types
#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    /// Network-level error (connection failed, retries exhausted)
    #[error("Network error: {0}")]
    Network(String),

    /// OpenAI API returned an error response
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limit exceeded (retry after {0}s)")]
    RateLimit(u64),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Response body doesn't match expected schema
    #[error("Invalid response schema: {0}")]
    InvalidSchema(String),

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),
}

impl From<OpenAIError> for SlotwiseError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::Authentication(msg) => SlotwiseError::Auth(msg),
            OpenAIError::Network(_) | OpenAIError::Timeout(_) | OpenAIError::RateLimit(_) => {
                SlotwiseError::Network(err.to_string())
            }
            OpenAIError::Api { .. } | OpenAIError::InvalidSchema(_) => {
                SlotwiseError::Internal(err.to_string())
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Usage {
    pub total_tokens: i32,
}
