//! Chat-completion backends
//!
//! Features:
//! - OpenAI-compatible chat completion API client
//! - Retry with exponential backoff for transient failures
//! - Usage metering decorator for per-client token accounting

pub mod backend;
pub mod metered;

pub use backend::{BackendConfig, OpenAiBackend};
pub use metered::MeteredModel;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for lingotutor_core::Error {
    fn from(err: LlmError) -> Self {
        lingotutor_core::Error::upstream(err.to_string())
    }
}
