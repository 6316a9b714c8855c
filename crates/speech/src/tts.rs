//! Text-to-speech over an OpenAI-compatible audio API

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use lingotutor_core::{Result, SpeechClip, SpeechSynthesizer};

use crate::{SpeechConfig, SpeechError};

/// HTTP synthesizer
#[derive(Clone)]
pub struct HttpSynthesizer {
    client: Client,
    config: SpeechConfig,
}

impl HttpSynthesizer {
    /// Create a new synthesizer
    pub fn new(config: SpeechConfig) -> std::result::Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SpeechError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1{}", self.config.endpoint.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SpeechClip> {
        let request = SpeechRequest {
            model: &self.config.tts_model,
            input: text,
            voice: &self.config.voice,
            response_format: &self.config.audio_format,
        };

        let mut builder = self.client.post(self.api_url("/audio/speech")).json(&request);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(SpeechError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api(format!("{status}: {error}")).into());
        }

        let audio = response.bytes().await.map_err(SpeechError::from)?.to_vec();
        if audio.is_empty() {
            return Err(
                SpeechError::InvalidResponse("synthesis returned no audio".to_string()).into(),
            );
        }

        tracing::debug!(bytes = audio.len(), voice = %self.config.voice, "synthesized clip");
        Ok(SpeechClip::new(
            audio,
            mime_for_format(&self.config.audio_format),
        ))
    }

    fn voice_name(&self) -> &str {
        &self.config.voice
    }
}

/// MIME type for a synthesis output format
fn mime_for_format(format: &str) -> &'static str {
    match format {
        "mp3" => "audio/mpeg",
        "opus" => "audio/opus",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_mapping() {
        assert_eq!(mime_for_format("mp3"), "audio/mpeg");
        assert_eq!(mime_for_format("wav"), "audio/wav");
        assert_eq!(mime_for_format("weird"), "application/octet-stream");
    }

    #[test]
    fn test_api_url() {
        let synth = HttpSynthesizer::new(SpeechConfig {
            endpoint: "http://localhost:7777".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            synth.api_url("/audio/speech"),
            "http://localhost:7777/v1/audio/speech"
        );
    }

    #[test]
    fn test_voice_name_comes_from_config() {
        let synth = HttpSynthesizer::new(SpeechConfig::default()).unwrap();
        assert_eq!(synth.voice_name(), "nova");
    }
}
