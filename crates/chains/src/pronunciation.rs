//! Pronunciation scoring
//!
//! The learner reads a target sentence aloud; the recording is transcribed
//! elsewhere and this chain compares the transcription against the target.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lingotutor_core::{ChatRequest, LanguageModel, Result};

use crate::sections::SectionParser;

/// Input for pronunciation scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PronunciationInput {
    /// Sentence the learner was asked to read
    pub target_text: String,
    /// What the recognizer heard
    pub transcribed_text: String,
    #[serde(default = "default_user_language")]
    pub user_language: String,
}

fn default_user_language() -> String {
    "English".to_string()
}

/// Pronunciation assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PronunciationReport {
    /// 0-100, `None` when the model's score was unusable
    pub score: Option<u8>,
    pub feedback: String,
}

/// Scores pronunciation from a transcription of the learner's reading
pub struct PronunciationChain {
    model: Arc<dyn LanguageModel>,
}

impl PronunciationChain {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn run(&self, input: &PronunciationInput) -> Result<PronunciationReport> {
        let request = ChatRequest::new(
            "You are a pronunciation coach. A learner read a sentence aloud and a \
             speech recognizer transcribed what it heard. Differences between the \
             target and the transcription indicate mispronunciations. \
             Answer with exactly two sections, each starting on its own line:\n\
             SCORE: a number from 0 to 100\n\
             FEEDBACK: which words to practice and how",
        )
        .with_user_message(format!(
            "Target sentence: {}\nRecognized as: {}\nGive the feedback in {}.",
            input.target_text, input.transcribed_text, input.user_language,
        ))
        .with_temperature(0.3);

        let response = self.model.complete(request).await?;
        tracing::debug!("scored pronunciation");

        let parsed = SectionParser::new(["SCORE", "FEEDBACK"]).parse(&response.text);
        Ok(PronunciationReport {
            score: parsed.get("SCORE").and_then(parse_score),
            feedback: parsed.get_or("FEEDBACK", "No feedback provided."),
        })
    }
}

/// First number in the section, when it is a valid 0-100 score
fn parse_score(text: &str) -> Option<u8> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|s| !s.is_empty())
        .and_then(|s| s.parse::<u8>().ok())
        .filter(|score| *score <= 100)
}
