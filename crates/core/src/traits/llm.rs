//! Language model trait

use async_trait::async_trait;

use crate::chat::{ChatRequest, ChatResponse};
use crate::error::Result;

/// A chat-completion language model.
///
/// Implementations wrap a hosted provider or a local model. Every prompt
/// chain and the tutor engine talk to models through this trait, so tests
/// can substitute scripted implementations.
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Run one chat completion
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Model identifier, for logs and metrics
    fn model_name(&self) -> &str;

    /// Rough token estimate for a prompt, used when the provider
    /// reports no usage. Four characters per token is close enough
    /// for budgeting.
    fn estimate_tokens(&self, text: &str) -> usize {
        text.len().div_ceil(4)
    }
}
