//! Agent conversation storage using SQLite
//!
//! Turns are stored as a JSON array alongside the owning user.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use slotwise_core::agent::ports::ConversationRepository;
use slotwise_domain::{Conversation, ConversationTurn, Result as DomainResult};
use tokio::task;

use super::manager::DbManager;
use super::sql::{map_join_error, parse_ts, ts};
use crate::errors::conversions::to_domain;

pub struct SqliteConversationRepository {
    db: Arc<DbManager>,
}

impl SqliteConversationRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConversationRepository for SqliteConversationRepository {
    async fn get(&self, context_id: &str) -> DomainResult<Option<Conversation>> {
        let db = Arc::clone(&self.db);
        let context_id = context_id.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<Conversation>> {
            let conn = db.get_connection()?;
            let row = conn
                .query_row(
                    "SELECT context_id, user_id, turns, updated_at FROM agent_conversations
                     WHERE context_id = ?1",
                    params![context_id],
                    map_conversation_row,
                )
                .optional()
                .map_err(to_domain)?;
            row.map(StoredConversation::decode).transpose()
        })
        .await
        .map_err(map_join_error)?
    }

    async fn save(&self, conversation: &Conversation) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let turns = serde_json::to_string(&conversation.turns).map_err(to_domain)?;
        let context_id = conversation.context_id.clone();
        let user_id = conversation.user_id;
        let updated_at = ts(conversation.updated_at);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO agent_conversations (context_id, user_id, turns, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(context_id) DO UPDATE SET
                     user_id = excluded.user_id,
                     turns = excluded.turns,
                     updated_at = excluded.updated_at",
                params![context_id, user_id, turns, updated_at],
            )
            .map_err(to_domain)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, context_id: &str) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);
        let context_id = context_id.to_string();

        task::spawn_blocking(move || -> DomainResult<bool> {
            let conn = db.get_connection()?;
            let sql = "DELETE FROM agent_conversations WHERE context_id = ?1";
            let removed = conn.execute(sql, params![context_id]).map_err(to_domain)?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_for_user(&self, user_id: i64) -> DomainResult<Vec<Conversation>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<Conversation>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT context_id, user_id, turns, updated_at FROM agent_conversations
                     WHERE user_id = ?1 ORDER BY updated_at DESC",
                )
                .map_err(to_domain)?;
            let rows = stmt
                .query_map(params![user_id], map_conversation_row)
                .map_err(to_domain)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(to_domain)?;
            rows.into_iter().map(StoredConversation::decode).collect()
        })
        .await
        .map_err(map_join_error)?
    }
}

struct StoredConversation {
    context_id: String,
    user_id: i64,
    turns: String,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl StoredConversation {
    fn decode(self) -> DomainResult<Conversation> {
        let turns: Vec<ConversationTurn> = serde_json::from_str(&self.turns).map_err(to_domain)?;
        Ok(Conversation {
            context_id: self.context_id,
            user_id: self.user_id,
            turns,
            updated_at: self.updated_at,
        })
    }
}

fn map_conversation_row(row: &Row<'_>) -> rusqlite::Result<StoredConversation> {
    let updated: String = row.get(3)?;
    Ok(StoredConversation {
        context_id: row.get(0)?,
        user_id: row.get(1)?,
        turns: row.get(2)?,
        updated_at: parse_ts(3, &updated)?,
    })
}
