//! Scripted models for chain tests

use std::sync::Arc;

use async_trait::async_trait;

use lingotutor_core::{ChatRequest, ChatResponse, Error, LanguageModel, Result};

/// Model that answers every completion with the same canned text
pub(crate) struct ScriptedModel {
    text: String,
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse> {
        Ok(ChatResponse::text(self.text.clone()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Arc'd scripted model
pub(crate) fn scripted(text: &str) -> Arc<dyn LanguageModel> {
    Arc::new(ScriptedModel {
        text: text.to_string(),
    })
}

/// Model whose completions always fail upstream
pub(crate) struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse> {
        Err(Error::upstream("provider unavailable"))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}
