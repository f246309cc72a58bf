use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use switchboard_common::{Provider, Result, SwitchboardError};
use tracing::{debug, warn};

use crate::config::{ClientFactory, ClientSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    pub system_prompt: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;
    fn model_name(&self) -> &str;
}

#[async_trait]
impl LlmClient for Box<dyn LlmClient> {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        (**self).complete(request).await
    }
    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Prefix of errors raised when no HTTP response arrived at all.
pub(crate) const TRANSPORT_FAILURE_PREFIX: &str = "request failed";

/// Turn a non-2xx response into an error message.
///
/// Prefers the `error.message` field most providers return, and always
/// keeps the status so retry classification can see it. A numeric
/// `Retry-After` header is carried along as `(Retry-After: <secs>)`.
pub(crate) fn http_error_message(
    status: reqwest::StatusCode,
    headers: &reqwest::header::HeaderMap,
    body: &str,
) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    let head = match retry_after_secs(headers) {
        Some(secs) => format!("HTTP {status} (Retry-After: {secs})"),
        None => format!("HTTP {status}"),
    };

    if detail.is_empty() {
        head
    } else {
        format!("{head}: {detail}")
    }
}

/// Delay-seconds form only; HTTP-date values are ignored.
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Outcome of a single capability call. Failures are data, not errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub provider: Provider,
    pub model: String,
    pub content: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Completion {
    fn succeeded(provider: Provider, response: LlmResponse) -> Self {
        let mut metadata = serde_json::Map::new();
        metadata.insert("model".into(), response.model.clone().into());
        if let Some(reason) = response.finish_reason {
            metadata.insert("finish_reason".into(), reason.into());
        }

        Self {
            provider,
            model: response.model,
            content: response.content,
            success: true,
            error: None,
            tokens_used: response.usage.map(|u| u.total()),
            metadata,
        }
    }

    fn failed(provider: Provider, model: &str, error: String) -> Self {
        let mut metadata = serde_json::Map::new();
        metadata.insert("model".into(), model.into());

        Self {
            provider,
            model: model.to_string(),
            content: String::new(),
            success: false,
            error: Some(error),
            tokens_used: None,
            metadata,
        }
    }
}

/// A provider-bound capability client.
///
/// Wraps whatever `LlmClient` the factory produced and applies the
/// request defaults. `complete` never returns an error.
#[derive(Clone)]
pub struct ProviderClient {
    provider: Provider,
    inner: Arc<dyn LlmClient>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ProviderClient {
    /// Build a client for `provider`. Fails when the credential is blank.
    pub fn connect(
        provider: Provider,
        credential: &str,
        model: &str,
        settings: &ClientSettings,
        factory: &dyn ClientFactory,
    ) -> Result<Self> {
        if credential.trim().is_empty() {
            return Err(SwitchboardError::Config(format!(
                "API key required for {}",
                provider.display_name()
            )));
        }

        let inner = factory.build(provider, credential, model, settings)?;
        debug!(provider = %provider, model = %inner.model_name(), "Capability client ready");

        Ok(Self {
            provider,
            inner,
            temperature: Some(settings.temperature),
            max_tokens: Some(settings.max_tokens),
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    pub async fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Completion {
        let request = LlmRequest {
            system_prompt: system_prompt.map(str::to_string),
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.inner.complete(request).await {
            Ok(response) => Completion::succeeded(self.provider, response),
            Err(e) => {
                let message = match e {
                    SwitchboardError::Provider { message, .. } => message,
                    other => other.to_string(),
                };
                warn!(provider = %self.provider, error = %message, "Completion failed");
                Completion::failed(self.provider, self.inner.model_name(), message)
            }
        }
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &self.provider)
            .field("model", &self.inner.model_name())
            .finish()
    }
}
