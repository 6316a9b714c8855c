//! Study tip generation

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lingotutor_core::{CefrLevel, ChatRequest, LanguageModel, Result};

use crate::sections::SectionParser;

/// Input for tip generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipsInput {
    #[serde(default)]
    pub level: CefrLevel,
    pub topic: String,
    #[serde(default = "default_user_language")]
    pub user_language: String,
}

fn default_user_language() -> String {
    "English".to_string()
}

/// A generated study tip with a worked example
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyTip {
    pub tip: String,
    pub example: String,
}

/// Generates one study tip with an example
pub struct TipsChain {
    model: Arc<dyn LanguageModel>,
}

impl TipsChain {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn run(&self, input: &TipsInput) -> Result<StudyTip> {
        let request = ChatRequest::new(
            "You are a language tutor sharing study advice. \
             Answer with exactly two sections, each starting on its own line:\n\
             TIP: one concrete study tip\n\
             EXAMPLE: a short example applying the tip",
        )
        .with_user_message(format!(
            "Give one study tip about \"{}\" for a {} ({}) learner, in {}.",
            input.topic,
            input.level.code(),
            input.level.describe(),
            input.user_language,
        ))
        .with_temperature(0.7);

        let response = self.model.complete(request).await?;
        tracing::debug!(topic = %input.topic, level = %input.level, "generated study tip");

        let parsed = SectionParser::new(["TIP", "EXAMPLE"]).parse(&response.text);
        Ok(StudyTip {
            tip: parsed.get_or("TIP", "No tip provided."),
            example: parsed.get_or("EXAMPLE", "No example provided."),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scripted;

    #[tokio::test]
    async fn test_decorated_answer_parses() {
        let chain = TipsChain::new(scripted(
            "**TIP:** Label objects around your home.\n**EXAMPLE:** Stick \"der Tisch\" on the table.",
        ));
        let tip = chain
            .run(&TipsInput {
                level: CefrLevel::A1,
                topic: "Vocabulary".to_string(),
                user_language: "English".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(tip.tip, "Label objects around your home.");
        assert_eq!(tip.example, "Stick \"der Tisch\" on the table.");
    }

    #[tokio::test]
    async fn test_unsectioned_answer_falls_back() {
        let chain = TipsChain::new(scripted("Just study every day!"));
        let tip = chain
            .run(&TipsInput {
                level: CefrLevel::B1,
                topic: "Grammar".to_string(),
                user_language: "English".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(tip.tip, "No tip provided.");
        assert_eq!(tip.example, "No example provided.");
    }
}
