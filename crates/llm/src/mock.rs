//! Mock LLM Service Implementation
//!
//! Used by `LlmServiceFactory` when provider is `"mock"`. Returns
//! deterministic responses by default; tests can script replies, add an
//! artificial delay and inspect recorded requests.
//! Thread-safe via `Arc<Mutex<>>`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService};

/// Mock LLM service for testing
#[derive(Debug, Clone, Default)]
pub struct MockLlmService {
    scripted: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    delay: Option<Duration>,
}

impl MockLlmService {
    /// Create a new mock LLM service
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful reply. Queued replies are consumed in order.
    pub fn push_response(&self, content: impl Into<String>) {
        self.scripted
            .lock()
            .expect("script lock poisoned (prior test panicked)")
            .push_back(Ok(content.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: LlmError) {
        self.scripted
            .lock()
            .expect("script lock poisoned (prior test panicked)")
            .push_back(Err(error));
    }

    /// Return all recorded requests.
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .expect("requests lock poisoned (prior test panicked)")
            .clone()
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tracing::info!("Mock LLM service processing completion request");

        self.requests
            .lock()
            .map_err(|e| LlmError::Request(format!("requests lock poisoned: {e}")))?
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let model = if request.model.is_empty() {
            "mock-model".to_string()
        } else {
            request.model
        };

        let scripted = self
            .scripted
            .lock()
            .map_err(|e| LlmError::Request(format!("script lock poisoned: {e}")))?
            .pop_front();

        let content = match scripted {
            Some(reply) => reply?,
            None => {
                // Generate a simple response based on the last message
                let last_message = request
                    .messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or("empty");
                format!("Mock response to: {}", last_message)
            }
        };

        let input_tokens = request
            .messages
            .iter()
            .map(|m| m.content.len() as i32 / 4)
            .sum::<i32>();
        let output_tokens = content.len() as i32 / 4;

        Ok(CompletionResponse {
            content,
            model,
            input_tokens,
            output_tokens,
            stop_reason: "stop".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }
}
