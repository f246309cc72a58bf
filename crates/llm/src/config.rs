use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use switchboard_common::{Provider, Result};

use crate::anthropic::AnthropicClient;
use crate::client::LlmClient;
use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;
use crate::retry::{RetryConfig, RetryingClient};

/// Request defaults applied to every capability client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub retry: RetryConfig,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4096,
            retry: RetryConfig::default(),
        }
    }
}

/// Produces the transport behind a `ProviderClient`.
///
/// The coordinator only sees this trait, so tests can swap in scripted
/// clients without touching the network.
pub trait ClientFactory: Send + Sync {
    fn build(
        &self,
        provider: Provider,
        credential: &str,
        model: &str,
        settings: &ClientSettings,
    ) -> Result<Arc<dyn LlmClient>>;
}

/// Builds real HTTP clients, each wrapped in retry.
#[derive(Debug, Clone, Default)]
pub struct HttpClientFactory {
    base_urls: HashMap<Provider, String>,
}

impl HttpClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `provider` at a different endpoint (proxies, local gateways).
    pub fn with_base_url(mut self, provider: Provider, url: impl Into<String>) -> Self {
        self.base_urls.insert(provider, url.into());
        self
    }

    pub fn base_url(&self, provider: Provider) -> Option<&str> {
        self.base_urls.get(&provider).map(String::as_str)
    }
}

impl ClientFactory for HttpClientFactory {
    fn build(
        &self,
        provider: Provider,
        credential: &str,
        model: &str,
        settings: &ClientSettings,
    ) -> Result<Arc<dyn LlmClient>> {
        let base_url = self.base_urls.get(&provider).cloned();
        let model = model.to_string();
        let api_key = credential.to_string();

        let base_client: Box<dyn LlmClient> = match provider {
            Provider::OpenAi | Provider::Moonshot => {
                Box::new(OpenAiClient::new(provider, base_url, model, api_key))
            }
            Provider::Anthropic => Box::new(AnthropicClient::new(base_url, model, api_key)),
            Provider::Gemini => Box::new(GeminiClient::new(base_url, model, api_key)),
        };

        Ok(Arc::new(RetryingClient::new(
            base_client,
            settings.retry.clone(),
        )))
    }
}
