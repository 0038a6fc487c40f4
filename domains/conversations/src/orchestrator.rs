//! Completion orchestration
//!
//! Builds the prompt from a conversation, asks the model for a reply,
//! appends it, and for new conversations spawns a detached task that
//! derives a title.

use std::sync::Arc;
use std::time::Duration;

use colloquy_common::{Error, Result};
use colloquy_llm::{CompletionRequest, LlmMessage, LlmService};

use crate::domain::entities::{
    AssistantMessage, Conversation, Message, MessageId, SharedConversation, SystemMessage,
    UserMessage,
};

/// Bound on each remote completion call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(500);

/// Instruction used for the title-generation call
pub const TITLE_PROMPT: &str = "You are a title generator. You will receive one or multiple messages of a conversation. You will reply with only the title of the conversation without any punctuation mark either at the begining or the end.";

/// A title is only derived while the conversation is shorter than this.
const TITLE_MESSAGE_THRESHOLD: usize = 3;

/// Orchestrator settings fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    /// Model sent with every request; empty selects the service default
    pub model: String,
    pub request_timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Coordinates prompt assembly, the remote call and conversation updates.
/// Cloning is cheap; clones share the same LLM service.
#[derive(Clone)]
pub struct CompletionOrchestrator {
    llm: Arc<dyn LlmService>,
    config: CompletionConfig,
}

impl CompletionOrchestrator {
    pub fn new(llm: Arc<dyn LlmService>, config: CompletionConfig) -> Self {
        Self { llm, config }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Ask the model to answer the conversation.
    ///
    /// `user_message` must already be the latest entry of the conversation.
    /// On success the reply is appended and returned; on failure the
    /// conversation is left untouched. When the conversation has no title
    /// and fewer than three messages after the append, a title task is
    /// spawned and left running in the background.
    pub async fn complete(
        &self,
        conversation: &SharedConversation,
        user_message: &UserMessage,
        sent_message_id: MessageId,
        system_message: Option<&SystemMessage>,
    ) -> Result<AssistantMessage> {
        let (conversation_id, prompt) = {
            let guard = conversation.lock().await;

            tracing::info!(
                conversation_id = guard.id,
                user_message_id = user_message.id,
                "Completing message"
            );
            tracing::debug!(conversation = ?*guard, "Current conversation");

            let mut prompt = Vec::with_capacity(guard.messages.len() + 1);
            if let Some(system) = system_message {
                prompt.push(Message::System(system.clone()).to_llm());
            }
            prompt.extend(guard.messages.iter().map(Message::to_llm));

            (guard.id, prompt)
        };

        let text = self.request(prompt).await.inspect_err(|e| {
            tracing::error!(
                conversation_id,
                error = %e,
                code = e.error_code(),
                "Completion failed"
            );
        })?;

        let assistant_message = AssistantMessage::new(sent_message_id, text, user_message.id);

        let mut guard = conversation.lock().await;
        guard
            .messages
            .push(Message::Assistant(assistant_message.clone()));

        tracing::info!(
            conversation_id,
            assistant_message_id = assistant_message.id,
            "Completed message"
        );

        if needs_title(&guard) {
            let snapshot = guard.messages.clone();
            drop(guard);
            self.spawn_title_task(Arc::clone(conversation), snapshot);
        }

        Ok(assistant_message)
    }

    /// Single bounded call to the completion endpoint.
    async fn request(&self, messages: Vec<LlmMessage>) -> Result<String> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: None,
        };

        let response = tokio::time::timeout(self.config.request_timeout, self.llm.complete(request))
            .await
            .map_err(|_| Error::Timeout(self.config.request_timeout))??;

        Ok(response.content)
    }

    /// Fire-and-forget: the handle is dropped and failures are only logged.
    fn spawn_title_task(&self, conversation: SharedConversation, messages: Vec<Message>) {
        let orchestrator = self.clone();

        tokio::spawn(async move {
            let conversation_id = conversation.lock().await.id;

            let mut prompt = Vec::with_capacity(messages.len() + 1);
            prompt.push(Message::from(SystemMessage::new(TITLE_PROMPT)).to_llm());
            prompt.extend(messages.iter().map(Message::to_llm));

            match orchestrator.request(prompt).await {
                Ok(title) => {
                    conversation.lock().await.title = Some(title.clone());
                    tracing::info!(conversation_id, title = %title, "Set conversation title");
                }
                Err(e) => {
                    tracing::warn!(
                        conversation_id,
                        error = %e,
                        "Title generation failed"
                    );
                }
            }
        });
    }
}

fn needs_title(conversation: &Conversation) -> bool {
    conversation.title.is_none() && conversation.messages.len() < TITLE_MESSAGE_THRESHOLD
}
