//! Provider and registry configuration.

use anyhow::{Result, bail};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// The kind of backend a provider config describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenRouter proxy API.
    OpenRouter,
    /// OpenAI API.
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
    /// Offline echo backend for `demo/*` models.
    Echo,
}

impl ProviderKind {
    /// The lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Echo => "echo",
        }
    }
}

/// Credentials and endpoint for one backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Which backend this config describes.
    pub kind: ProviderKind,

    /// API key. Required for remote backends.
    #[serde(default)]
    pub api_key: Option<CompactString>,

    /// Override for the backend's default base URL.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Create a config with a key and the backend's default base URL.
    pub fn new(kind: ProviderKind, api_key: impl Into<CompactString>) -> Self {
        Self {
            kind,
            api_key: Some(api_key.into()),
            base_url: None,
        }
    }

    /// Check the config is complete enough to build a provider.
    pub fn validate(&self) -> Result<()> {
        if self.kind != ProviderKind::Echo && self.api_key.is_none() {
            bail!("provider '{}' requires an api_key", self.kind.as_str());
        }
        Ok(())
    }
}

/// Configuration for building a [`ProviderRegistry`](crate::ProviderRegistry).
///
/// The registry is built once from this and is immutable thereafter;
/// a config change means rebuilding the registry, not mutating it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Backends to register. Only listed backends with valid
    /// credentials become resolvable.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Where to send models nothing else claims. `None` makes
    /// resolution strict.
    #[serde(default)]
    pub fallback: Option<ProviderKind>,

    /// Whether to register the offline echo backend for `demo/*`
    /// models.
    #[serde(default = "default_true")]
    pub demo: bool,

    /// Pause, in milliseconds, before each chunk the demo backend
    /// emits. Useful for exercising cancellation and live tailing.
    #[serde(default)]
    pub demo_delay_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            fallback: None,
            demo: true,
            demo_delay_ms: 0,
        }
    }
}

impl RegistryConfig {
    /// Build a config from the environment.
    ///
    /// Reads `OPENROUTER_API_KEY`/`CUSTOM_BASE_URL`,
    /// `OPENAI_API_KEY`/`OPENAI_BASE_URL`, and
    /// `ANTHROPIC_API_KEY`/`ANTHROPIC_BASE_URL`. When an OpenRouter key
    /// is present it becomes the fallback, preserving its role as the
    /// most broadly compatible backend.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
            config.providers.push(ProviderConfig {
                kind: ProviderKind::OpenRouter,
                api_key: Some(key.into()),
                base_url: std::env::var("CUSTOM_BASE_URL").ok(),
            });
            config.fallback = Some(ProviderKind::OpenRouter);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.providers.push(ProviderConfig {
                kind: ProviderKind::OpenAi,
                api_key: Some(key.into()),
                base_url: std::env::var("OPENAI_BASE_URL").ok(),
            });
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            config.providers.push(ProviderConfig {
                kind: ProviderKind::Anthropic,
                api_key: Some(key.into()),
                base_url: std::env::var("ANTHROPIC_BASE_URL").ok(),
            });
        }

        config
    }

    /// Add a provider config.
    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.providers.push(provider);
        self
    }

    /// Set the fallback policy.
    pub fn with_fallback(mut self, fallback: Option<ProviderKind>) -> Self {
        self.fallback = fallback;
        self
    }
}

fn default_true() -> bool {
    true
}
