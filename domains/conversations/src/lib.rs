//! Conversations domain: chat threads, messages, completion orchestration

pub mod domain;
pub mod orchestrator;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{
    shared, AssistantMessage, Conversation, ConversationId, Message, MessageId, MessageRole,
    SharedConversation, SystemMessage, UserMessage,
};
pub use domain::factory::{trim_history, ConversationFactory};

// Re-export orchestration types
pub use orchestrator::{CompletionConfig, CompletionOrchestrator, TITLE_PROMPT};
