//! OpenAI-compatible chat completion backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use lingotutor_core::{ChatRequest, ChatResponse, LanguageModel, Message, Result, TokenUsage};

use crate::LlmError;

/// Backend configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API base URL, without the /v1 suffix
    pub endpoint: String,
    /// API key (optional; omitted requests carry no Authorization header)
    pub api_key: Option<String>,
    /// Model name/ID
    pub model: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Temperature
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry)
    pub initial_backoff: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 512,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

/// OpenAI-compatible chat completion client
#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client,
    config: BackendConfig,
}

impl OpenAiBackend {
    /// Create a new backend
    pub fn new(config: BackendConfig) -> std::result::Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Build the API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/v1{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    /// Execute a single request (used by the retry loop)
    async fn execute_request(
        &self,
        request: &ApiChatRequest,
    ) -> std::result::Result<ApiChatResponse, LlmError> {
        let mut builder = self.client.post(self.api_url("/chat/completions")).json(request);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            // 5xx errors are retryable, 4xx are not
            if status.is_server_error() {
                return Err(LlmError::Network(format!("Server error {status}: {error}")));
            }
            return Err(LlmError::Api(format!("{status}: {error}")));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }

    /// Check whether the provider answers on its models endpoint
    pub async fn is_available(&self) -> bool {
        let mut builder = self.client.get(self.api_url("/models"));
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }
        builder
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl LanguageModel for OpenAiBackend {
    /// Run one completion with exponential-backoff retry on transient failures
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse> {
        let api_request = ApiChatRequest {
            model: request.model.clone().unwrap_or_else(|| self.config.model.clone()),
            messages: request.messages.iter().map(ApiMessage::from).collect(),
            temperature: request.temperature.unwrap_or(self.config.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
        };

        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    "completion failed, retrying in {:?} (attempt {}/{})",
                    backoff,
                    attempt,
                    self.config.max_retries
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(&api_request).await {
                Ok(api_response) => return Ok(to_chat_response(api_response)?),
                Err(e) if Self::is_retryable(&e) => {
                    last_error = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Network("Max retries exceeded".to_string()))
            .into())
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Map a wire response to the common chat response shape.
///
/// A success payload with no choices is a provider bug; surface it instead
/// of returning empty text.
fn to_chat_response(api: ApiChatResponse) -> std::result::Result<ChatResponse, LlmError> {
    let choice = api
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("response carried no choices".to_string()))?;

    let mut response = ChatResponse::text(choice.message.content);
    if let Some(usage) = api.usage {
        response = response.with_usage(TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        });
    }
    Ok(response)
}

// OpenAI API wire types
#[derive(Debug, Serialize)]
struct ApiChatRequest {
    model: String,
    messages: Vec<ApiMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

impl From<&Message> for ApiMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiChatResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = BackendConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_api_url_strips_trailing_slash() {
        let backend = OpenAiBackend::new(BackendConfig {
            endpoint: "http://localhost:9999/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            backend.api_url("/chat/completions"),
            "http://localhost:9999/v1/chat/completions"
        );
    }

    #[test]
    fn test_message_conversion() {
        let msg = Message::user("Hello");
        let api_msg = ApiMessage::from(&msg);
        assert_eq!(api_msg.role, "user");
        assert_eq!(api_msg.content, "Hello");
    }

    #[test]
    fn test_response_mapping() {
        let api = ApiChatResponse {
            choices: vec![ApiChoice {
                message: ApiMessage {
                    role: "assistant".to_string(),
                    content: "Guten Tag!".to_string(),
                },
            }],
            usage: Some(ApiUsage {
                prompt_tokens: 20,
                completion_tokens: 8,
                total_tokens: 28,
            }),
        };

        let response = to_chat_response(api).unwrap();
        assert_eq!(response.text, "Guten Tag!");
        assert_eq!(response.usage.unwrap().total_tokens, 28);
    }

    #[test]
    fn test_empty_choices_is_invalid() {
        let api = ApiChatResponse {
            choices: Vec::new(),
            usage: None,
        };
        assert!(matches!(
            to_chat_response(api),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
