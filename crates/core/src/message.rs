//! Message and chat history domain types.
//!
//! These are the value objects every worker reads:
//! a worker replies → the orchestrator appends the reply → the next worker scans the history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message author in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human user, or a worker speaking on their behalf
    User,
    /// An automated worker
    Assistant,
    /// Session instructions
    System,
}

/// Message body: plain text or a structured payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MessageContent {
    Text(String),
    Structured(serde_json::Value),
}

impl MessageContent {
    /// Render the content as text. Structured payloads become compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Structured(value) => value.to_string(),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

impl From<serde_json::Value> for MessageContent {
    fn from(value: serde_json::Value) -> Self {
        MessageContent::Structured(value)
    }
}

/// A single message in a conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Role of the author
    pub role: Role,

    /// The body
    pub content: MessageContent,

    /// Name of the participant that produced this message
    pub author: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message with an explicit role and author.
    pub fn new(role: Role, author: impl Into<String>, content: impl Into<MessageContent>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            author: author.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a message from the human user.
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::User, "user", content)
    }

    /// Create a message from an automated worker.
    pub fn assistant(author: impl Into<String>, content: impl Into<MessageContent>) -> Self {
        Self::new(Role::Assistant, author, content)
    }

    /// Create a session instruction message.
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::System, "system", content)
    }

    /// The body rendered as text.
    pub fn text(&self) -> String {
        self.content.to_text()
    }
}

/// Append-only, ordered log of messages for one conversation.
///
/// Append order is the only sequencing guarantee. The message list is private
/// so that nothing can edit or truncate it; readers get a slice or a
/// most-recent-first iterator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    /// Unique conversation ID
    pub id: ConversationId,

    messages: Vec<Message>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was appended
    pub updated_at: DateTime<Utc>,
}

impl ChatHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a history seeded with initial messages, in order.
    pub fn with_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        let mut history = Self::new();
        for message in messages {
            history.push(message);
        }
        history
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// All messages in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages from the most recent backward.
    pub fn iter_recent(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().rev()
    }

    /// The most recently appended message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new()
    }
}
