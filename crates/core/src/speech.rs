//! Speech types
//!
//! Audio produced by synthesis and text produced by transcription.

use serde::{Deserialize, Serialize};

/// A synthesized audio clip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechClip {
    /// Raw audio bytes
    #[serde(with = "clip_bytes")]
    pub audio: Vec<u8>,
    /// MIME type of the audio (e.g. "audio/mpeg")
    pub mime_type: String,
}

impl SpeechClip {
    /// Create a clip from raw bytes
    pub fn new(audio: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            audio,
            mime_type: mime_type.into(),
        }
    }

    /// An MP3 clip
    pub fn mp3(audio: Vec<u8>) -> Self {
        Self::new(audio, "audio/mpeg")
    }

    /// Clip size in bytes
    pub fn len(&self) -> usize {
        self.audio.len()
    }

    /// True when the clip carries no audio
    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }
}

/// Serialize clip bytes as base64 so clips survive JSON transport.
mod clip_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Result of transcribing an audio recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// Recognized text
    pub text: String,
}

impl Transcription {
    /// Create a transcription
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_roundtrips_through_json() {
        let clip = SpeechClip::mp3(vec![0x49, 0x44, 0x33, 0x04]);
        let json = serde_json::to_string(&clip).unwrap();
        assert!(json.contains("audio/mpeg"));

        let back: SpeechClip = serde_json::from_str(&json).unwrap();
        assert_eq!(back.audio, clip.audio);
        assert_eq!(back.mime_type, "audio/mpeg");
    }

    #[test]
    fn test_empty_clip() {
        let clip = SpeechClip::mp3(Vec::new());
        assert!(clip.is_empty());
        assert_eq!(clip.len(), 0);
    }
}
