//! Speech adapters
//!
//! HTTP clients for an OpenAI-compatible audio API:
//! - text-to-speech for tutor replies
//! - speech-to-text for learner recordings

pub mod stt;
pub mod tts;

pub use stt::HttpTranscriber;
pub use tts::HttpSynthesizer;

use std::time::Duration;

use thiserror::Error;

/// Speech provider configuration, shared by synthesis and transcription
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// API base URL, without the /v1 suffix
    pub endpoint: String,
    /// API key (optional; omitted requests carry no Authorization header)
    pub api_key: Option<String>,
    /// Synthesis model
    pub tts_model: String,
    /// Default synthesis voice
    pub voice: String,
    /// Synthesis output format (mp3, opus, aac, flac, wav)
    pub audio_format: String,
    /// Transcription model
    pub stt_model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com".to_string(),
            api_key: None,
            tts_model: "tts-1".to_string(),
            voice: "nova".to_string(),
            audio_format: "mp3".to_string(),
            stt_model: "whisper-1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Speech errors
#[derive(Error, Debug)]
pub enum SpeechError {
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

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SpeechError::Timeout
        } else {
            SpeechError::Network(err.to_string())
        }
    }
}

impl From<SpeechError> for lingotutor_core::Error {
    fn from(err: SpeechError) -> Self {
        lingotutor_core::Error::upstream(err.to_string())
    }
}
