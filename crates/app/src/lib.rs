//! Colloquy application composition root
//!
//! Wires configuration, the LLM service and the conversations domain into
//! a single chat session.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use colloquy_common::Config;
use colloquy_conversations::{
    shared, AssistantMessage, CompletionConfig, CompletionOrchestrator, ConversationFactory,
    ConversationId, MessageId, SharedConversation, SystemMessage, UserMessage,
};
use colloquy_llm::{LlmConfig, LlmService, LlmServiceFactory};
use tracing_subscriber::EnvFilter;

/// Long-lived services shared by every session
#[derive(Clone)]
pub struct ChatApp {
    pub orchestrator: CompletionOrchestrator,
    pub factory: ConversationFactory,
    pub system_message: Option<SystemMessage>,
}

/// Build the application from process configuration
pub fn create_app(config: &Config, llm_config: LlmConfig) -> Result<ChatApp, anyhow::Error> {
    let model = llm_config.default_model.clone();
    let llm: Arc<dyn LlmService> = Arc::from(LlmServiceFactory::create(llm_config)?);

    Ok(ChatApp::new(llm, config, model))
}

/// Log filter for the binary. `config.rust_log` already holds `RUST_LOG`
/// or the `colloquy=info` default, which also matches the `colloquy` binary.
pub fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::new(&config.rust_log)
}

impl ChatApp {
    pub fn new(llm: Arc<dyn LlmService>, config: &Config, model: String) -> Self {
        let orchestrator = CompletionOrchestrator::new(
            llm,
            CompletionConfig {
                model,
                request_timeout: Duration::from_secs(config.request_timeout_secs),
            },
        );

        Self {
            orchestrator,
            factory: ConversationFactory::new(config.max_message_count),
            system_message: config.system_prompt.clone().map(SystemMessage::new),
        }
    }

    /// Start a session; the conversation is created on the first message.
    pub fn session(&self, conversation_id: ConversationId) -> ChatSession {
        ChatSession {
            app: self.clone(),
            conversation_id,
            conversation: None,
            next_message_id: 1,
        }
    }
}

/// One interactive conversation. Owns the conversation for its lifetime.
pub struct ChatSession {
    app: ChatApp,
    conversation_id: ConversationId,
    conversation: Option<SharedConversation>,
    next_message_id: MessageId,
}

impl ChatSession {
    /// Record the user's turn and ask the model to answer it.
    pub async fn send(&mut self, text: &str) -> colloquy_common::Result<AssistantMessage> {
        let user_message = UserMessage::new(self.next_message_id, text, Utc::now());
        let reply_id = self.next_message_id + 1;
        self.next_message_id += 2;

        let conversation = match &self.conversation {
            Some(conversation) => {
                conversation.lock().await.push_user(user_message.clone());
                Arc::clone(conversation)
            }
            None => {
                let created = shared(
                    self.app
                        .factory
                        .new_conversation(self.conversation_id, user_message.clone()),
                );
                self.conversation = Some(Arc::clone(&created));
                created
            }
        };

        self.app
            .orchestrator
            .complete(
                &conversation,
                &user_message,
                reply_id,
                self.app.system_message.as_ref(),
            )
            .await
    }

    /// Title derived in the background, once it has arrived
    pub async fn title(&self) -> Option<String> {
        match &self.conversation {
            Some(conversation) => conversation.lock().await.title.clone(),
            None => None,
        }
    }

    pub fn conversation(&self) -> Option<&SharedConversation> {
        self.conversation.as_ref()
    }
}
