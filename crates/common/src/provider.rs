//! Capability provider identifiers.

use crate::error::SwitchboardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A backend that can turn a prompt into a completion.
///
/// The declaration order is the construction order used when resolving
/// clients, and therefore the order fallback routing walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Gemini,
    Moonshot,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Gemini,
        Provider::Moonshot,
    ];

    /// Stable lowercase identifier used in config keys and error tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
            Provider::Moonshot => "moonshot",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Gemini => "Gemini",
            Provider::Moonshot => "Moonshot",
        }
    }

    /// What this provider is preferred for, for status displays.
    pub fn specialty(&self) -> &'static str {
        match self {
            Provider::OpenAi => "Architecture & Roadmap",
            Provider::Anthropic => "Coding & Debugging",
            Provider::Gemini => "Reasoning & Logic",
            Provider::Moonshot => "Code Review",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4",
            Provider::Anthropic => "claude-3-opus-20240229",
            Provider::Gemini => "gemini-pro",
            Provider::Moonshot => "moonshot-v1-8k",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com",
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::Gemini => "https://generativelanguage.googleapis.com",
            Provider::Moonshot => "https://api.moonshot.cn",
        }
    }

    /// Environment variable consulted when no key is configured.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::Moonshot => "MOONSHOT_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = SwitchboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| SwitchboardError::UnknownProvider(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!(" gemini ".parse::<Provider>().unwrap(), Provider::Gemini);
    }

    #[test]
    fn unknown_identifier_fails_closed() {
        let err = "mistral".parse::<Provider>().unwrap_err();
        assert!(matches!(err, SwitchboardError::UnknownProvider(ref s) if s == "mistral"));
    }

    #[test]
    fn serde_uses_identifiers() {
        assert_eq!(serde_json::to_string(&Provider::OpenAi).unwrap(), "\"openai\"");
        assert_eq!(serde_json::to_string(&Provider::Moonshot).unwrap(), "\"moonshot\"");
        let parsed: Provider = serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(parsed, Provider::Anthropic);
    }

    #[test]
    fn display_matches_identifier() {
        for provider in Provider::ALL {
            assert_eq!(provider.to_string(), provider.as_str());
        }
    }
}
