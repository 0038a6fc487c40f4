//! OpenAI Chat Completions Implementation
//!
//! Calls the Chat Completions API (https://api.openai.com/v1/chat/completions)
//! using a single reqwest HTTP client shared by every request.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{CompletionRequest, CompletionResponse, LlmConfig, LlmError, LlmMessage, LlmService};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Chat Completions request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [LlmMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat Completions response body
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: i32,
    completion_tokens: i32,
}

/// OpenAI API error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: String,
}

/// OpenAI LLM service implementation
pub struct OpenAiService {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

impl OpenAiService {
    /// Create a new OpenAI service. The HTTP client honours proxy
    /// environment variables and is reused for the service's lifetime.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .user_agent(concat!("colloquy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }
}

#[async_trait::async_trait]
impl LlmService for OpenAiService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.config.default_model.as_str()
        } else {
            request.model.as_str()
        };

        let body = ChatCompletionRequest {
            model,
            messages: &request.messages,
            max_tokens: request.max_tokens.or(self.config.max_tokens),
        };

        let url = format!("{}/v1/chat/completions", self.base_url);

        tracing::debug!(
            model = %model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimit);
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());

            // Try to parse as API error
            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_body) {
                return Err(LlmError::Response(format!(
                    "OpenAI API error ({}): {}",
                    error_response
                        .error
                        .error_type
                        .as_deref()
                        .unwrap_or("unknown"),
                    error_response.error.message
                )));
            }

            return Err(LlmError::Response(format!(
                "OpenAI API returned {}: {}",
                status, error_body
            )));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Response(format!("Failed to parse response: {}", e)))?;

        let Some(first_choice) = api_response.choices.into_iter().next() else {
            return Err(LlmError::Response(
                "OpenAI API returned no choices".to_string(),
            ));
        };

        let (input_tokens, output_tokens) = api_response
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(CompletionResponse {
            content: first_choice.message.content.unwrap_or_default(),
            model: api_response.model,
            input_tokens,
            output_tokens,
            stop_reason: first_choice
                .finish_reason
                .unwrap_or_else(|| "stop".to_string()),
        })
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
