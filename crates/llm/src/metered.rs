//! Usage-metered model decorator

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use lingotutor_core::{
    next_utc_midnight, ChatRequest, ChatResponse, Error, LanguageModel, Result, UsageGate,
};

/// Decorates a model with per-client usage accounting.
///
/// Each completion is gated for the attached client: blocked clients fail
/// before any tokens are spent, successful completions are charged to the
/// ledger afterwards. The provider's own usage counts are preferred; when a
/// provider reports none, the inner model's estimate stands in.
pub struct MeteredModel {
    inner: Arc<dyn LanguageModel>,
    gate: Arc<dyn UsageGate>,
    client_ip: String,
}

impl MeteredModel {
    /// Meter `inner` for the client at `client_ip`
    pub fn new(
        inner: Arc<dyn LanguageModel>,
        gate: Arc<dyn UsageGate>,
        client_ip: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            gate,
            client_ip: client_ip.into(),
        }
    }

    fn charged_tokens(&self, request: &ChatRequest, response: &ChatResponse) -> u32 {
        if let Some(usage) = response.usage {
            return usage.total_tokens;
        }
        let prompt = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let estimate =
            self.inner.estimate_tokens(&prompt) + self.inner.estimate_tokens(&response.text);
        u32::try_from(estimate).unwrap_or(u32::MAX)
    }
}

#[async_trait]
impl LanguageModel for MeteredModel {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse> {
        if self.gate.is_blocked(&self.client_ip).await? {
            return Err(Error::UsageLimit {
                ip: self.client_ip.clone(),
                blocked_until: Some(next_utc_midnight(Utc::now())),
            });
        }

        let response = self.inner.complete(request.clone()).await?;

        let tokens = self.charged_tokens(&request, &response);
        let record = self.gate.record_usage(&self.client_ip, tokens).await?;
        tracing::debug!(
            ip = %self.client_ip,
            tokens,
            total_today = record.tokens_used,
            "charged completion"
        );

        Ok(response)
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
