//! Port interfaces for the conversational agent

use async_trait::async_trait;
use slotwise_domain::{Conversation, Result};

/// Storage for per-context conversation history
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn get(&self, context_id: &str) -> Result<Option<Conversation>>;

    /// Insert or replace the conversation stored under its context id
    async fn save(&self, conversation: &Conversation) -> Result<()>;

    /// Returns `false` when nothing was stored under `context_id`
    async fn delete(&self, context_id: &str) -> Result<bool>;

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Conversation>>;
}

/// Hosted chat model used for open-ended questions
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String>;
}
