//! Shared configuration and error handling for Colloquy
//!
//! This crate provides common functionality used across the Colloquy workspace:
//! - Configuration management following 12-factor principles
//! - Error types and handling

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{Error, Result};
