//! Append-only chat transcript, consumed by the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub content: String,
    /// Chart data URI attached to the message, if any.
    pub image: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ConversationLog {
    messages: Vec<ChatMessage>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sender: Sender, content: impl Into<String>, image: Option<String>) {
        self.messages.push(ChatMessage {
            sender,
            content: content.into(),
            image,
            timestamp: Utc::now(),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
