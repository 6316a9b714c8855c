//! Free-response review

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lingotutor_core::{CefrLevel, ChatRequest, LanguageModel, Result};

use crate::sections::SectionParser;

/// Input for response review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseInput {
    /// The practice question that was asked
    pub question: String,
    /// The learner's written answer
    pub user_response: String,
    #[serde(default)]
    pub level: CefrLevel,
    #[serde(default = "default_user_language")]
    pub user_language: String,
}

fn default_user_language() -> String {
    "English".to_string()
}

/// Feedback on a free-form answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseReview {
    pub content_feedback: String,
    pub grammar_feedback: String,
    pub suggested_response: String,
}

/// Reviews a learner's answer to a practice question
pub struct ResponseChain {
    model: Arc<dyn LanguageModel>,
}

impl ResponseChain {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn run(&self, input: &ResponseInput) -> Result<ResponseReview> {
        let request = ChatRequest::new(
            "You are a language tutor reviewing a learner's answer. \
             Answer with exactly three sections, each starting on its own line:\n\
             CONTENT FEEDBACK: how well the answer addresses the question\n\
             GRAMMAR FEEDBACK: grammar issues in the answer\n\
             SUGGESTED RESPONSE: a model answer at the learner's level",
        )
        .with_user_message(format!(
            "Question: {}\nLearner's answer: {}\n\
             The learner is at {} ({}) level. {} Give the feedback in {}.",
            input.question,
            input.user_response,
            input.level.code(),
            input.level.describe(),
            input.level.vocabulary_guidance(),
            input.user_language,
        ))
        .with_temperature(0.3);

        let response = self.model.complete(request).await?;
        tracing::debug!(level = %input.level, "reviewed response");

        let parsed = SectionParser::new([
            "CONTENT FEEDBACK",
            "GRAMMAR FEEDBACK",
            "SUGGESTED RESPONSE",
        ])
        .parse(&response.text);

        Ok(ResponseReview {
            content_feedback: parsed.get_or("CONTENT FEEDBACK", "No content feedback provided."),
            grammar_feedback: parsed.get_or("GRAMMAR FEEDBACK", "No grammar feedback provided."),
            suggested_response: parsed
                .get_or("SUGGESTED RESPONSE", "No suggested response provided."),
        })
    }
}
