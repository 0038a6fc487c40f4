//! Shared helpers for integration tests: a wiremock-backed chat completions
//! endpoint and an orchestrator wired to it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use colloquy_conversations::{CompletionConfig, CompletionOrchestrator, UserMessage};
use colloquy_llm::openai::OpenAiService;
use colloquy_llm::LlmConfig;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// OpenAI-shaped success body
pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1677652288,
        "model": "gpt-3.5-turbo-0613",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

/// Orchestrator talking to the mock server over real HTTP
pub fn orchestrator_for(server: &MockServer, request_timeout: Duration) -> CompletionOrchestrator {
    let service = OpenAiService::new(LlmConfig {
        provider: "openai".to_string(),
        api_key: "sk-integration".to_string(),
        base_url: Some(server.uri()),
        default_model: "gpt-3.5-turbo".to_string(),
        max_tokens: None,
    })
    .expect("build OpenAI service");

    CompletionOrchestrator::new(
        Arc::new(service),
        CompletionConfig {
            model: String::new(),
            request_timeout,
        },
    )
}

pub fn user(id: i64, content: &str) -> UserMessage {
    UserMessage::new(id, content, Utc.with_ymd_and_hms(2023, 3, 1, 12, 0, 0).unwrap())
}
