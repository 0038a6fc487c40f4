//! Conversation construction and history capping

use super::entities::{Conversation, ConversationId, Message, UserMessage};

/// Builds new conversations and applies the retained-message cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversationFactory {
    max_message_count: Option<usize>,
}

impl ConversationFactory {
    /// `None` or `Some(0)` means no cap.
    pub fn new(max_message_count: Option<usize>) -> Self {
        Self {
            max_message_count: max_message_count.filter(|&max| max > 0),
        }
    }

    /// Start a conversation from its first user turn. The turn's timestamp
    /// becomes the conversation's creation time.
    pub fn new_conversation(
        &self,
        conversation_id: ConversationId,
        user_message: UserMessage,
    ) -> Conversation {
        let mut conversation = Conversation {
            id: conversation_id,
            title: None,
            created_at: user_message.timestamp,
            messages: vec![Message::User(user_message)],
        };

        trim_history(&mut conversation.messages, self.max_message_count);

        tracing::debug!(
            conversation_id,
            messages = conversation.messages.len(),
            "Created conversation"
        );

        conversation
    }
}

/// When `messages` is longer than `max`, drop the oldest `max` entries so the
/// most recent `len - max` remain in their original order.
pub fn trim_history(messages: &mut Vec<Message>, max: Option<usize>) {
    match max {
        Some(max) if max > 0 && messages.len() > max => {
            messages.drain(..max);
        }
        _ => {}
    }
}
