pub mod anthropic;
pub mod client;
pub mod config;
pub mod gemini;
pub mod openai;
pub mod retry;

pub use anthropic::AnthropicClient;
pub use client::{
    ChatMessage, Completion, LlmClient, LlmRequest, LlmResponse, ProviderClient, Role, TokenUsage,
};
pub use config::{ClientFactory, ClientSettings, HttpClientFactory};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use retry::{RetryConfig, RetryingClient};
