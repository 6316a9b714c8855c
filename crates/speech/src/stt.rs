//! Speech-to-text over an OpenAI-compatible audio API

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use lingotutor_core::{Result, Transcriber, Transcription};

use crate::{SpeechConfig, SpeechError};

/// HTTP transcriber
#[derive(Clone)]
pub struct HttpTranscriber {
    client: Client,
    config: SpeechConfig,
}

impl HttpTranscriber {
    /// Create a new transcriber
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
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<Transcription> {
        if audio.is_empty() {
            return Err(lingotutor_core::Error::InvalidRequest(
                "empty audio upload".to_string(),
            ));
        }

        let file = Part::bytes(audio.to_vec())
            .file_name(format!("recording.{}", extension_for_mime(mime_type)))
            .mime_str(mime_type)
            .unwrap_or_else(|_| Part::bytes(audio.to_vec()).file_name("recording"));

        let form = Form::new()
            .part("file", file)
            .text("model", self.config.stt_model.clone());

        let mut builder = self
            .client
            .post(self.api_url("/audio/transcriptions"))
            .multipart(form);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(SpeechError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api(format!("{status}: {error}")).into());
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::InvalidResponse(e.to_string()))?;

        tracing::debug!(chars = body.text.len(), "transcribed recording");
        Ok(Transcription::new(body.text))
    }

    fn model_name(&self) -> &str {
        &self.config.stt_model
    }
}

/// File extension hint for common recording MIME types
fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/webm" => "webm",
        "audio/mpeg" => "mp3",
        "audio/mp4" => "mp4",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/ogg" => "ogg",
        _ => "bin",
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let stt = HttpTranscriber::new(SpeechConfig::default()).unwrap();
        let err = stt.transcribe(&[], "audio/webm").await.unwrap_err();
        assert!(matches!(err, lingotutor_core::Error::InvalidRequest(_)));
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for_mime("audio/webm"), "webm");
        assert_eq!(extension_for_mime("audio/wav"), "wav");
        assert_eq!(extension_for_mime("video/avi"), "bin");
    }

    #[test]
    fn test_api_url() {
        let stt = HttpTranscriber::new(SpeechConfig {
            endpoint: "http://localhost:7777/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            stt.api_url("/audio/transcriptions"),
            "http://localhost:7777/v1/audio/transcriptions"
        );
    }
}
