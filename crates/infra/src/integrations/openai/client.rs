//! OpenAI API client backing the agent's free-text answers

use async_trait::async_trait;
use reqwest::Method;
use slotwise_core::agent::ports::LanguageModel;
use slotwise_domain::{Result, SlotwiseError};
use tracing::{debug, info};

use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenAIError};
use crate::http::HttpClient;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 150;
const DEFAULT_TEMPERATURE: f32 = 0.3;
const RATE_LIMIT_RETRY_SECS: u64 = 60;

pub struct OpenAIClient {
    http_client: HttpClient,
    api_key: String,
    model: String,
    api_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key
    /// * `http_client` - HTTP client with retry logic
    pub fn new(api_key: impl Into<String>, http_client: HttpClient) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a different endpoint (tests, proxies)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system and one user message and return the trimmed reply.
    ///
    /// # Errors
    /// Returns `OpenAIError` for network failures, API errors, or replies
    /// without content.
    pub async fn chat(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> std::result::Result<String, OpenAIError> {
        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system", content: system_prompt.to_string() },
                ChatMessage { role: "user", content: user_message.to_string() },
            ],
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        };

        let request_builder = self
            .http_client
            .request(Method::POST, &self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload);

        let response = self.http_client.send(request_builder).await.map_err(|err| match err {
            SlotwiseError::Network(msg) | SlotwiseError::Internal(msg) => OpenAIError::Network(msg),
            other => OpenAIError::Network(format!("HTTP error: {other}")),
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), "Received OpenAI API response");

        if !status.is_success() {
            return Err(Self::handle_error_status(status.as_u16(), response).await);
        }

        let chat_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| OpenAIError::InvalidSchema(format!("Failed to parse response: {e}")))?;

        let choice = chat_response.choices.into_iter().next().ok_or_else(|| {
            OpenAIError::InvalidSchema("Response contained no choices".to_string())
        })?;
        let content = choice
            .message
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| OpenAIError::InvalidSchema("Response message was empty".to_string()))?;

        if let Some(usage) = chat_response.usage {
            info!(tokens = usage.total_tokens, model = %self.model, "OpenAI completion finished");
        }

        Ok(content)
    }

    async fn handle_error_status(status: u16, response: reqwest::Response) -> OpenAIError {
        let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        match status {
            401 | 403 => OpenAIError::Authentication(format!("Invalid API key ({status})")),
            429 => OpenAIError::RateLimit(RATE_LIMIT_RETRY_SECS),
            _ => OpenAIError::Api { status, message },
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAIClient {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String> {
        self.chat(system_prompt, user_message).await.map_err(SlotwiseError::from)
    }
}
