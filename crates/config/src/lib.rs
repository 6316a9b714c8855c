//! Configuration management for the language tutor
//!
//! Supports loading configuration from:
//! - TOML files
//! - Environment variables (LINGOTUTOR_ prefix)

pub mod settings;

pub use settings::{
    load_settings, LlmConfig, ServerConfig, Settings, SpeechConfig, TutorConfig, UsageConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for lingotutor_core::Error {
    fn from(err: ConfigError) -> Self {
        lingotutor_core::Error::Config(err.to_string())
    }
}
