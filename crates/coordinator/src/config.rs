//! Configuration and credential resolution.
//!
//! # Security
//!
//! - Config file permission validation on Unix systems
//! - Rejects world-readable files containing API keys
//! - Warns about API keys stored in config files

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use switchboard_common::Provider;
use switchboard_llm::{ClientSettings, HttpClientFactory, RetryConfig};
use tracing::warn;

/// Where the orchestrator gets keys and model names from.
pub trait CredentialSource: Send + Sync {
    /// Non-empty credential for `provider`, if one is configured.
    fn credential(&self, provider: Provider) -> Option<String>;

    /// Model identifier, falling back to the provider default.
    fn model(&self, provider: Provider) -> String;
}

/// Top-level TOML document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchboardConfig {
    /// Keyed by provider identifier (`openai`, `anthropic`, ...)
    pub providers: BTreeMap<String, ProviderConfig>,

    pub request: RequestConfig,

    pub retry: RetryConfig,

    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// If not set, the provider's environment variable is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Override for the provider's API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_items: usize,

    /// JSON file backing the history; in-memory only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_items: 50,
            path: None,
        }
    }
}

impl SwitchboardConfig {
    /// Load configuration from a TOML file.
    ///
    /// On Unix the file must be a regular file, must not be
    /// world-writable, and must not be world-readable if it holds a key.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        #[cfg(unix)]
        validate_file_type(path)?;

        let config = Self::from_file_unchecked(path)?;

        if config.has_stored_keys() {
            #[cfg(unix)]
            validate_key_file_permissions(path)?;

            warn!(
                path = %path.display(),
                "API key found in config file. Prefer environment variables \
                 (OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY, MOONSHOT_API_KEY)."
            );
        }

        Ok(config)
    }

    /// Load configuration without permission checks.
    pub fn from_file_unchecked(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;

        for id in config.providers.keys() {
            match id.parse::<Provider>() {
                Err(_) => warn!(provider = %id, "Ignoring unknown provider in config"),
                Ok(p) if p.as_str() != id && config.providers.contains_key(p.as_str()) => warn!(
                    provider = %id,
                    canonical = %p,
                    "Provider configured twice, using the lowercase table"
                ),
                Ok(_) => {}
            }
        }

        Ok(config)
    }

    fn has_stored_keys(&self) -> bool {
        self.providers
            .values()
            .any(|p| p.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()))
    }

    /// Settings for `provider`. Table names match case-insensitively, so
    /// `[providers.OpenAI]` configures `openai`; an exact key wins.
    pub fn provider(&self, provider: Provider) -> Option<&ProviderConfig> {
        self.providers.get(provider.as_str()).or_else(|| {
            self.providers
                .iter()
                .find(|(id, _)| id.parse::<Provider>().ok() == Some(provider))
                .map(|(_, config)| config)
        })
    }

    /// Request defaults and retry policy for every client.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            temperature: self.request.temperature,
            max_tokens: self.request.max_tokens,
            retry: self.retry.clone(),
        }
    }

    /// HTTP client factory honouring `api_url` overrides.
    pub fn client_factory(&self) -> HttpClientFactory {
        Provider::ALL
            .into_iter()
            .filter_map(|p| {
                let url = self.provider(p)?.api_url.as_deref()?;
                Some((p, url))
            })
            .fold(HttpClientFactory::new(), |factory, (p, url)| {
                factory.with_base_url(p, url)
            })
    }
}

impl ProviderConfig {
    /// Resolve the API key from config, then from `lookup(env var name)`.
    pub fn resolve_api_key_with(
        &self,
        provider: Provider,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.trim().is_empty() {
                return Some(key.clone());
            }
        }

        lookup(provider.api_key_env()).filter(|k| !k.trim().is_empty())
    }

    pub fn resolve_api_key(&self, provider: Provider) -> Option<String> {
        self.resolve_api_key_with(provider, |name| std::env::var(name).ok())
    }
}

impl CredentialSource for SwitchboardConfig {
    fn credential(&self, provider: Provider) -> Option<String> {
        self.provider(provider)
            .cloned()
            .unwrap_or_default()
            .resolve_api_key(provider)
    }

    fn model(&self, provider: Provider) -> String {
        self.provider(provider)
            .and_then(|p| p.model.as_deref())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(provider.default_model())
            .to_string()
    }
}

/// Fixed credentials, for embedding and tests. Never reads the environment.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    keys: HashMap<Provider, String>,
    models: HashMap<Provider, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, provider: Provider, key: impl Into<String>) -> Self {
        self.keys.insert(provider, key.into());
        self
    }

    pub fn with_model(mut self, provider: Provider, model: impl Into<String>) -> Self {
        self.models.insert(provider, model.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn credential(&self, provider: Provider) -> Option<String> {
        self.keys
            .get(&provider)
            .filter(|k| !k.trim().is_empty())
            .cloned()
    }

    fn model(&self, provider: Provider) -> String {
        self.models
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| provider.default_model().to_string())
    }
}

/// Config path must be a regular file and not world-writable.
#[cfg(unix)]
fn validate_file_type(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

    if !metadata.file_type().is_file() {
        anyhow::bail!(
            "Config path '{}' is not a regular file. Symlinks and directories are not allowed.",
            path.display()
        );
    }

    let permission_bits = metadata.permissions().mode() & 0o777;
    if permission_bits & 0o002 != 0 {
        anyhow::bail!(
            "Config file '{}' is world-writable (mode {:04o}). Fix with: chmod o-w {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    Ok(())
}

/// A file holding keys must not be world-readable.
#[cfg(unix)]
fn validate_key_file_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permission_bits = std::fs::metadata(path)?.permissions().mode() & 0o777;

    if permission_bits & 0o004 != 0 {
        anyhow::bail!(
            "Config file '{}' contains an API key but is world-readable (mode {:04o}). \
             Fix with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    if permission_bits & 0o040 != 0 {
        warn!(
            path = %path.display(),
            mode = %format!("{permission_bits:04o}"),
            "Config file contains an API key and is group-readable"
        );
    }

    Ok(())
}
