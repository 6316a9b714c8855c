//! Error taxonomy shared across the workspace
//!
//! Only two failure kinds cross the tutoring-engine boundary:
//! [`Error::UpstreamModel`] and [`Error::UsageLimit`]. Speech synthesis
//! failures and missing sections in model output are absorbed where they
//! occur and never surface here.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Workspace result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Tutor errors
#[derive(Error, Debug)]
pub enum Error {
    /// An LLM or speech provider call failed (network, rate limit,
    /// malformed response). Carries the thread it happened in when the
    /// failure occurred inside a conversation turn.
    #[error("upstream model error: {message}")]
    UpstreamModel {
        message: String,
        thread_id: Option<String>,
    },

    /// The usage gate reported the caller as blocked.
    #[error("usage limit exceeded for {ip}")]
    UsageLimit {
        ip: String,
        blocked_until: Option<DateTime<Utc>>,
    },

    /// Thread memory could not be read or appended.
    #[error("memory error: {0}")]
    Memory(String),

    /// Configuration problem detected at startup or wiring time.
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller sent a request the engine cannot act on.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Construct an upstream-model error without thread context.
    pub fn upstream(message: impl Into<String>) -> Self {
        Error::UpstreamModel {
            message: message.into(),
            thread_id: None,
        }
    }

    /// Attach thread context to an upstream-model error, leaving other
    /// variants untouched.
    pub fn in_thread(self, thread_id: impl Into<String>) -> Self {
        match self {
            Error::UpstreamModel { message, .. } => Error::UpstreamModel {
                message,
                thread_id: Some(thread_id.into()),
            },
            other => other,
        }
    }

    /// Stable machine-readable code for the wire error object.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UpstreamModel { .. } => "upstream_model_error",
            Error::UsageLimit { .. } => "usage_limit_exceeded",
            Error::Memory(_) => "memory_error",
            Error::Config(_) => "config_error",
            Error::InvalidRequest(_) => "invalid_request",
        }
    }
}
