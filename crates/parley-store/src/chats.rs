use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use parley_client::TranscriptStore;
use parley_core::ids::ChatId;
use parley_core::messages::ChatMessage;

use crate::database::Database;
use crate::error::StoreError;

const TITLE_MAX_CHARS: usize = 50;
const DEFAULT_TITLE: &str = "New Chat";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRow {
    pub id: ChatId,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: String,
    pub updated_at: String,
}

/// List-view projection: everything except the message payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: ChatId,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Chat transcripts persisted as JSON blobs, one row per chat. The title is
/// derived from the first user message on every save, so it tracks edits
/// without a separate write path.
pub struct ChatRepo {
    db: Database,
}

impl ChatRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create(&self) -> Result<ChatRow, StoreError> {
        let id = ChatId::new();
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chats (id, title, messages, created_at, updated_at)
                 VALUES (?1, ?2, '[]', ?3, ?3)",
                rusqlite::params![id.as_str(), DEFAULT_TITLE, now],
            )?;
            Ok(ChatRow {
                id,
                title: DEFAULT_TITLE.to_string(),
                messages: Vec::new(),
                created_at: now.clone(),
                updated_at: now,
            })
        })
    }

    #[instrument(skip(self), fields(chat_id = %id))]
    pub fn get(&self, id: &ChatId) -> Result<ChatRow, StoreError> {
        self.db.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, messages, created_at, updated_at
                     FROM chats WHERE id = ?1",
                    [id.as_str()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    },
                )
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => {
                        StoreError::NotFound(id.to_string())
                    }
                    other => other.into(),
                })?;

            Ok(ChatRow {
                id: ChatId::from_raw(row.0),
                title: row.1,
                messages: serde_json::from_str(&row.2)?,
                created_at: row.3,
                updated_at: row.4,
            })
        })
    }

    /// All chats, most recently updated first.
    pub fn list(&self) -> Result<Vec<ChatSummary>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, created_at, updated_at
                 FROM chats ORDER BY updated_at DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(ChatSummary {
                    id: ChatId::from_raw(row.get::<_, String>(0)?),
                    title: row.get(1)?,
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    /// Replace a chat's transcript, creating the row if it does not exist.
    /// Refreshes the derived title and the updated timestamp.
    #[instrument(skip(self, messages), fields(chat_id = %id, count = messages.len()))]
    pub fn save_messages(
        &self,
        id: &ChatId,
        messages: &[ChatMessage],
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(messages)?;
        let title = derive_title(messages);
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chats (id, title, messages, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title,
                     messages = excluded.messages,
                     updated_at = excluded.updated_at",
                rusqlite::params![id.as_str(), title, json, now],
            )?;
            Ok(())
        })
    }

    pub fn rename(&self, id: &ChatId, title: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE chats SET title = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![id.as_str(), title, now],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Ok(())
        })
    }

    pub fn delete(&self, id: &ChatId) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM chats WHERE id = ?1", [id.as_str()])?;
            if changed == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Ok(())
        })
    }
}

#[async_trait]
impl TranscriptStore for ChatRepo {
    async fn save(&self, chat: &ChatId, messages: &[ChatMessage]) -> anyhow::Result<()> {
        self.save_messages(chat, messages)?;
        Ok(())
    }
}

/// Title of a chat: the first user message, trimmed and truncated.
pub fn derive_title(messages: &[ChatMessage]) -> String {
    let content = messages
        .iter()
        .find(|m| m.is_user())
        .and_then(|m| m.content.as_deref())
        .unwrap_or_default()
        .trim();

    let title: String = content.chars().take(TITLE_MAX_CHARS).collect();
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}
