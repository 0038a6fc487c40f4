//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config. Provider credentials live
//! in `colloquy_llm::LlmConfig`.

use serde::{Deserialize, Serialize};
use std::env;

use crate::{Error, Result};

/// Default bound on a single remote completion call, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 500;

/// Log filter used when `RUST_LOG` is unset. Covers every `colloquy*` target.
pub const DEFAULT_LOG_FILTER: &str = "colloquy=info";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of messages retained when a conversation is created.
    /// `None` means unlimited.
    pub max_message_count: Option<usize>,

    /// Optional system message prepended to every completion prompt
    pub system_prompt: Option<String>,

    /// Bound on each remote completion call
    pub request_timeout_secs: u64,

    /// Runtime configuration
    pub rust_log: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let max_message_count = match env::var("MAX_MESSAGE_COUNT") {
            Ok(raw) => parse_max_message_count(&raw)?,
            Err(_) => None,
        };

        let system_prompt = env::var("SYSTEM_PROMPT")
            .ok()
            .filter(|prompt| !prompt.trim().is_empty());

        let request_timeout_secs = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Configuration(format!(
                    "REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        if request_timeout_secs == 0 {
            return Err(Error::Configuration(
                "REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let config = Self {
            max_message_count,
            system_prompt,
            request_timeout_secs,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        };

        Ok(config)
    }
}

/// A cap of zero is treated the same as no cap.
fn parse_max_message_count(raw: &str) -> Result<Option<usize>> {
    let count = raw.trim().parse::<usize>().map_err(|_| {
        Error::Configuration(format!(
            "MAX_MESSAGE_COUNT must be a non-negative integer, got '{}'",
            raw
        ))
    })?;

    Ok((count > 0).then_some(count))
}
