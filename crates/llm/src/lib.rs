//! Colloquy LLM Service
//!
//! Provides chat completion support with:
//! - OpenAI-compatible chat completions API integration for production
//! - Mock LLM service for testing and development
//! - Configurable provider, credentials, base URL and model

pub mod mock;
pub mod openai;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model used when neither the request nor the environment names one
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request error: {0}")]
    Request(String),

    #[error("LLM response error: {0}")]
    Response(String),

    #[error("LLM rate limit exceeded")]
    RateLimit,
}

impl From<LlmError> for colloquy_common::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(msg) => colloquy_common::Error::Configuration(msg),
            other => colloquy_common::Error::RemoteCall(other.to_string()),
        }
    }
}

/// Role of a single chat message sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for LlmRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmRole::System => write!(f, "system"),
            LlmRole::User => write!(f, "user"),
            LlmRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A `{role, content}` pair as sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn new(role: LlmRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Chat completion request. An empty `model` selects the service default.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
}

/// Text of the first choice plus usage metadata
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub stop_reason: String,
}

/// LLM service configuration.
#[derive(Clone)]
pub struct LlmConfig {
    /// LLM provider (openai, mock)
    pub provider: String,
    /// API credential, sent as a bearer token
    pub api_key: String,
    /// Base URL override for OpenAI-compatible endpoints
    pub base_url: Option<String>,
    /// Model used when a request leaves `model` empty
    pub default_model: String,
    /// Optional completion length cap
    pub max_tokens: Option<u32>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl LlmConfig {
    /// Create LLM config from environment variables.
    pub fn from_env() -> Result<Self, LlmError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());

        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| {
            if provider == "mock" {
                "mock-api-key".to_string()
            } else {
                String::new()
            }
        });

        let base_url = std::env::var("OPENAI_BASE_URL").ok();

        let default_model =
            std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let max_tokens = match std::env::var("LLM_MAX_TOKENS") {
            Ok(raw) => Some(raw.trim().parse::<u32>().map_err(|_| {
                LlmError::Configuration(format!(
                    "LLM_MAX_TOKENS must be a positive integer, got '{}'",
                    raw
                ))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            provider,
            api_key,
            base_url,
            default_model,
            max_tokens,
        })
    }
}

/// LLM service trait for different implementations.
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Send the message sequence and return the first choice.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model used when a request does not name one.
    fn default_model(&self) -> &str;
}

/// Factory for creating LlmService implementations.
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    /// Create an LlmService based on configuration.
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "openai" => {
                tracing::info!(model = %config.default_model, "Creating OpenAI LLM service");
                if config.api_key.is_empty() {
                    return Err(LlmError::Configuration(
                        "OPENAI_API_KEY is required for OpenAI provider".to_string(),
                    ));
                }
                Ok(Box::new(openai::OpenAiService::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock LLM service");
                Ok(Box::new(mock::MockLlmService::new()))
            }
            provider => Err(LlmError::Configuration(format!(
                "Unknown LLM provider: {}. Supported providers: openai, mock",
                provider
            ))),
        }
    }
}
