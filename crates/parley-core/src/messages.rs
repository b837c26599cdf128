use serde::{Deserialize, Serialize};

use crate::errors::ErrorInfo;
use crate::parts::Part;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. User messages carry flat `content`; assistant
/// messages carry streamed `parts`. The two are never meaningfully combined.
/// `error` marks a failed turn without discarding whatever partial parts
/// arrived before the failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            parts: None,
            error: None,
        }
    }

    /// A fresh assistant message, created empty at turn start and filled in
    /// by the aggregation pipeline.
    pub fn assistant() -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            parts: Some(Vec::new()),
            error: None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// The parts vector, created on demand. Streaming always goes through
    /// this so a message loaded without `parts` still aggregates correctly.
    pub fn parts_mut(&mut self) -> &mut Vec<Part> {
        self.parts.get_or_insert_with(Vec::new)
    }
}
