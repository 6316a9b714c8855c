//! Runtime settings
//!
//! Every field has a serde default so a bare `Settings::default()` is a
//! working development configuration. A TOML file and `LINGOTUTOR__`
//! environment variables override the defaults, file first.

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ConfigError;

/// Root settings tree
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub usage: UsageConfig,
    #[serde(default)]
    pub tutor: TutorConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins; empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// How many synthesized clips to keep addressable at /api/audio/:id
    #[serde(default = "default_audio_cache_clips")]
    pub audio_cache_clips: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            audio_cache_clips: default_audio_cache_clips(),
        }
    }
}

impl ServerConfig {
    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Chat-completion provider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    /// Bearer token; empty disables the Authorization header
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: String::new(),
            model: default_llm_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_provider_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// Speech provider settings (synthesis and transcription)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,
    /// Bearer token; empty disables the Authorization header
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    #[serde(default = "default_stt_model")]
    pub stt_model: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_speech_endpoint(),
            api_key: String::new(),
            tts_model: default_tts_model(),
            voice: default_voice(),
            audio_format: default_audio_format(),
            stt_model: default_stt_model(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

/// Per-IP usage limiting
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UsageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Tokens one IP may consume per UTC day
    #[serde(default = "default_daily_token_limit")]
    pub daily_token_limit: u32,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_token_limit: default_daily_token_limit(),
        }
    }
}

/// Tutor behavior settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TutorConfig {
    /// Name the tutor uses for itself in conversation
    #[serde(default = "default_tutor_name")]
    pub name: String,
    /// Temperature for grammar verdicts; kept low so YES/NO is stable
    #[serde(default = "default_grammar_temperature")]
    pub grammar_temperature: f32,
    #[serde(default = "default_temperature")]
    pub reply_temperature: f32,
    #[serde(default = "default_max_reply_tokens")]
    pub max_reply_tokens: u32,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            name: default_tutor_name(),
            grammar_temperature: default_grammar_temperature(),
            reply_temperature: default_temperature(),
            max_reply_tokens: default_max_reply_tokens(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    60
}

fn default_audio_cache_clips() -> usize {
    256
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.7
}

fn default_provider_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_speech_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_voice() -> String {
    "nova".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_stt_model() -> String {
    "whisper-1".to_string()
}

fn default_daily_token_limit() -> u32 {
    25_000
}

fn default_tutor_name() -> String {
    "Lingo".to_string()
}

fn default_grammar_temperature() -> f32 {
    0.0
}

fn default_max_reply_tokens() -> u32 {
    256
}

/// Load settings from an optional TOML file plus environment overrides.
///
/// Environment variables use the `LINGOTUTOR__SECTION__FIELD` form, e.g.
/// `LINGOTUTOR__SERVER__PORT=9000` or `LINGOTUTOR__LLM__API_KEY=...`.
pub fn load_settings(path: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !Path::new(path).exists() {
            return Err(ConfigError::FileNotFound(path.to_string()));
        }
        builder = builder.add_source(File::with_name(path));
        info!(path, "loading settings file");
    }

    builder = builder.add_source(
        Environment::with_prefix("LINGOTUTOR")
            .prefix_separator("__")
            .separator("__"),
    );

    let settings: Settings = builder.build()?.try_deserialize()?;
    validate(&settings)?;
    Ok(settings)
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.usage.enabled && settings.usage.daily_token_limit == 0 {
        return Err(ConfigError::InvalidValue {
            field: "usage.daily_token_limit".to_string(),
            message: "must be positive when usage limiting is enabled".to_string(),
        });
    }
    if settings.server.audio_cache_clips == 0 {
        return Err(ConfigError::InvalidValue {
            field: "server.audio_cache_clips".to_string(),
            message: "must be positive".to_string(),
        });
    }
    Ok(())
}
