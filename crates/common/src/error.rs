//! Error types for switchboard.

use crate::provider::Provider;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwitchboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No AI providers available. Please configure at least one API key.")]
    NoProviderAvailable,

    #[error("[{provider}] {message}")]
    Provider { provider: Provider, message: String },

    #[error("No client available for {0}")]
    NoClientForRoute(Provider),

    #[error("Invalid execution plan: {0}")]
    InvalidPlan(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("History error: {0}")]
    History(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SwitchboardError {
    pub fn provider(provider: Provider, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SwitchboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_is_tagged_with_identifier() {
        let err = SwitchboardError::provider(Provider::Gemini, "HTTP 500");
        assert_eq!(err.to_string(), "[gemini] HTTP 500");
    }

    #[test]
    fn no_client_for_route_names_provider() {
        let err = SwitchboardError::NoClientForRoute(Provider::Moonshot);
        assert_eq!(err.to_string(), "No client available for moonshot");
    }
}
