//! Speech synthesis and transcription traits

use async_trait::async_trait;

use crate::error::Result;
use crate::speech::{SpeechClip, Transcription};

/// Text-to-speech provider.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + 'static {
    /// Synthesize speech for the given text
    async fn synthesize(&self, text: &str) -> Result<SpeechClip>;

    /// Voice identifier, for logs
    fn voice_name(&self) -> &str;
}

/// Speech-to-text provider.
#[async_trait]
pub trait Transcriber: Send + Sync + 'static {
    /// Transcribe an audio recording; `mime_type` describes the upload
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<Transcription>;

    /// Recognition model identifier, for logs
    fn model_name(&self) -> &str;
}
