//! Domain entities for Conversations domain
//!
//! A conversation is an ordered list of chat turns. Turns are a closed set of
//! roles, so `Message` is an enum and callers dispatch on it with `match`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use colloquy_llm::LlmMessage;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Conversation identifier (chat platform ids fit directly)
pub type ConversationId = i64;

/// Message identifier (chat platform ids fit directly)
pub type MessageId = i64;

/// Conversation handle shared between the caller and detached title tasks
pub type SharedConversation = Arc<Mutex<Conversation>>;

/// Wrap a conversation so it can be passed to `CompletionOrchestrator::complete`.
pub fn shared(conversation: Conversation) -> SharedConversation {
    Arc::new(Mutex::new(conversation))
}

/// Message role; the same set of roles the completion endpoint accepts
pub use colloquy_llm::LlmRole as MessageRole;

/// Instructional message prepended to a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessage {
    pub content: String,
}

impl SystemMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// One inbound turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    pub id: MessageId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl UserMessage {
    pub fn new(id: MessageId, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            content: content.into(),
            timestamp,
        }
    }
}

/// Model reply; `reply_to` is the id of the UserMessage it answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub id: MessageId,
    pub content: String,
    pub reply_to: MessageId,
}

impl AssistantMessage {
    pub fn new(id: MessageId, content: impl Into<String>, reply_to: MessageId) -> Self {
        Self {
            id,
            content: content.into(),
            reply_to,
        }
    }
}

/// A single chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System(SystemMessage),
    User(UserMessage),
    Assistant(AssistantMessage),
}

impl Message {
    pub fn role(&self) -> MessageRole {
        match self {
            Message::System(_) => MessageRole::System,
            Message::User(_) => MessageRole::User,
            Message::Assistant(_) => MessageRole::Assistant,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System(m) => &m.content,
            Message::User(m) => &m.content,
            Message::Assistant(m) => &m.content,
        }
    }

    /// System messages carry no id.
    pub fn id(&self) -> Option<MessageId> {
        match self {
            Message::System(_) => None,
            Message::User(m) => Some(m.id),
            Message::Assistant(m) => Some(m.id),
        }
    }

    /// Wire form sent to the completion endpoint
    pub fn to_llm(&self) -> LlmMessage {
        LlmMessage::new(self.role(), self.content())
    }
}

impl From<SystemMessage> for Message {
    fn from(m: SystemMessage) -> Self {
        Message::System(m)
    }
}

impl From<UserMessage> for Message {
    fn from(m: UserMessage) -> Self {
        Message::User(m)
    }
}

impl From<AssistantMessage> for Message {
    fn from(m: AssistantMessage) -> Self {
        Message::Assistant(m)
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}#{}: {}", self.role(), id, self.content()),
            None => write!(f, "{}: {}", self.role(), self.content()),
        }
    }
}

/// Conversation entity. Messages are in chronological order and are only
/// ever appended or truncated from the front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Append a user turn. Callers do this before asking for a completion.
    pub fn push_user(&mut self, message: UserMessage) {
        self.messages.push(Message::User(message));
    }
}
