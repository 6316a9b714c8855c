//! Practice question generation

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lingotutor_core::{CefrLevel, ChatRequest, LanguageModel, Result};

use crate::sections::SectionParser;

/// Input for question generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionInput {
    #[serde(default)]
    pub level: CefrLevel,
    pub topic: String,
    #[serde(default = "default_user_language")]
    pub user_language: String,
}

fn default_user_language() -> String {
    "English".to_string()
}

/// A generated practice question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeQuestion {
    pub question: String,
    pub hint: String,
}

/// Generates one practice question with a hint
pub struct QuestionChain {
    model: Arc<dyn LanguageModel>,
}

impl QuestionChain {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn run(&self, input: &QuestionInput) -> Result<PracticeQuestion> {
        let request = ChatRequest::new(
            "You are a language tutor creating practice material. \
             Answer with exactly two sections, each starting on its own line:\n\
             QUESTION: the practice question\n\
             HINT: a short hint for answering it",
        )
        .with_user_message(format!(
            "Write one open-ended practice question about \"{}\" for a {} ({}) learner. {} \
             Write the question and the hint in {}.",
            input.topic,
            input.level.code(),
            input.level.describe(),
            input.level.vocabulary_guidance(),
            input.user_language,
        ))
        .with_temperature(0.8);

        let response = self.model.complete(request).await?;
        tracing::debug!(topic = %input.topic, level = %input.level, "generated practice question");

        let parsed = SectionParser::new(["QUESTION", "HINT"]).parse(&response.text);
        Ok(PracticeQuestion {
            question: parsed.get_or("QUESTION", "No question provided."),
            hint: parsed.get_or("HINT", "No hint provided."),
        })
    }
}
