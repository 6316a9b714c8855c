//! Translation review

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lingotutor_core::{CefrLevel, ChatRequest, LanguageModel, Result};

use crate::sections::SectionParser;

/// Input for translation review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationInput {
    /// Text the learner was asked to translate
    pub source_text: String,
    /// The learner's attempt
    pub user_translation: String,
    #[serde(default)]
    pub level: CefrLevel,
    #[serde(default = "default_user_language")]
    pub user_language: String,
}

fn default_user_language() -> String {
    "English".to_string()
}

/// Feedback on a translation attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationReview {
    pub grammar_feedback: String,
    pub vocabulary_feedback: String,
    pub corrected_translation: String,
}

/// Reviews a learner's translation attempt
pub struct TranslationChain {
    model: Arc<dyn LanguageModel>,
}

impl TranslationChain {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn run(&self, input: &TranslationInput) -> Result<TranslationReview> {
        let request = ChatRequest::new(
            "You are a language tutor reviewing a translation. \
             Answer with exactly three sections, each starting on its own line:\n\
             GRAMMAR FEEDBACK: grammar issues in the attempt\n\
             VOCABULARY FEEDBACK: word-choice issues in the attempt\n\
             CORRECTED TRANSLATION: your corrected version",
        )
        .with_user_message(format!(
            "Source text: {}\nLearner's translation: {}\n\
             The learner is at {} ({}) level. Give the feedback in {}.",
            input.source_text,
            input.user_translation,
            input.level.code(),
            input.level.describe(),
            input.user_language,
        ))
        .with_temperature(0.3);

        let response = self.model.complete(request).await?;
        tracing::debug!(level = %input.level, "reviewed translation");

        let parsed = SectionParser::new([
            "GRAMMAR FEEDBACK",
            "VOCABULARY FEEDBACK",
            "CORRECTED TRANSLATION",
        ])
        .parse(&response.text);

        Ok(TranslationReview {
            grammar_feedback: parsed.get_or("GRAMMAR FEEDBACK", "No grammar feedback provided."),
            vocabulary_feedback: parsed
                .get_or("VOCABULARY FEEDBACK", "No vocabulary feedback provided."),
            corrected_translation: parsed
                .get_or("CORRECTED TRANSLATION", "No corrected translation provided."),
        })
    }
}
