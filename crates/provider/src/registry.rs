//! Model-name resolution over the configured providers.

use crate::config::{ProviderKind, RegistryConfig};
use crate::provider::{Provider, build_provider};
use crate::Echo;
use anyhow::Result;
use compact_str::{CompactString, format_compact};
use dugong_core::Error;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Models served through the OpenRouter proxy.
const OPENROUTER_MODELS: &[&str] = &[
    // OpenAI models via OpenRouter
    "openai/o3",
    "openai/o3-pro",
    "openai/o3-mini",
    "openai/o1",
    "openai/o1-mini",
    "openai/o1-preview",
    "openai/gpt-4o",
    "openai/gpt-4o-mini",
    "openai/gpt-4-turbo",
    "openai/gpt-3.5-turbo",
    // Anthropic models via OpenRouter
    "anthropic/claude-3.5-sonnet",
    "anthropic/claude-3.5-haiku",
    "anthropic/claude-3-opus",
    "anthropic/claude-3-sonnet",
    "anthropic/claude-3-haiku",
    // Google models via OpenRouter
    "google/gemini-pro-1.5",
    "google/gemini-flash-1.5",
    // xAI models via OpenRouter
    "xai/grok-beta",
    "xai/grok-2-1212",
    // Other popular models
    "meta-llama/llama-3.2-90b-vision-instruct",
    "microsoft/wizardlm-2-8x22b",
    "mistralai/mistral-large",
];

/// Models served directly by OpenAI.
const OPENAI_MODELS: &[&str] = &[
    "o3",
    "o3-pro",
    "o3-mini",
    "o1",
    "o1-mini",
    "o1-preview",
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-3.5-turbo",
];

/// Models served directly by Anthropic.
const ANTHROPIC_MODELS: &[&str] = &[
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
];

/// Namespace prefixes tried when an exact model lookup misses,
/// tolerating proxy-style naming.
const MODEL_PREFIXES: &[&str] = &["openai/", "anthropic/", "google/", "xai/"];

/// Model-name substrings that indicate reasoning support. A heuristic
/// keyword match, not a capability database.
const REASONING_KEYWORDS: &[&str] = &["o1", "o3", "grok"];

/// Basic information about a model, assembled from the resolution
/// table and name heuristics.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    /// The model name.
    pub id: CompactString,
    /// The provider that serves it.
    pub provider: ProviderKind,
    /// Whether the name matches the reasoning heuristic.
    pub supports_reasoning: bool,
    /// Whether the model streams (all registered models do).
    pub supports_streaming: bool,
    /// Context length heuristic from the model name.
    pub context_length: u32,
}

/// Resolves model names to providers.
///
/// Built once from a [`RegistryConfig`] and immutable thereafter:
/// configuration changes mean building a new registry (and stopping
/// the old one), never mutating this in place. Only providers whose
/// credentials were present at build time are registered.
pub struct ProviderRegistry {
    providers: BTreeMap<ProviderKind, Provider>,
    model_map: BTreeMap<CompactString, ProviderKind>,
    fallback: Option<ProviderKind>,
}

impl ProviderRegistry {
    /// Build a registry from the given config.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let client = reqwest::Client::new();
        let mut providers = BTreeMap::new();

        for provider_config in &config.providers {
            let provider = build_provider(provider_config, client.clone())?;
            tracing::info!("initialized {} provider", provider_config.kind.as_str());
            providers.insert(provider_config.kind, provider);
        }
        if config.demo {
            let echo = Echo::with_delay(Duration::from_millis(config.demo_delay_ms));
            providers.insert(ProviderKind::Echo, Provider::Echo(echo));
        }
        tracing::info!(
            "available providers: {:?}",
            providers.keys().map(ProviderKind::as_str).collect::<Vec<_>>()
        );

        let model_map = build_model_map(&providers);
        let fallback = config.fallback.filter(|kind| providers.contains_key(kind));

        Ok(Self {
            providers,
            model_map,
            fallback,
        })
    }

    /// Build a registry from environment credentials.
    pub fn from_env() -> Result<Self> {
        Self::new(&RegistryConfig::from_env())
    }

    /// Resolve a model name to a provider.
    ///
    /// Resolution order: `demo/` namespace → exact table match →
    /// known namespace prefixes prepended → configured fallback →
    /// [`Error::NoProviderAvailable`].
    pub fn resolve(&self, model: &str) -> Result<Provider, Error> {
        if model.starts_with("demo/")
            && let Some(provider) = self.providers.get(&ProviderKind::Echo)
        {
            return Ok(provider.clone());
        }

        if let Some(provider) = self.lookup(model) {
            return Ok(provider);
        }
        for prefix in MODEL_PREFIXES {
            if let Some(provider) = self.lookup(&format_compact!("{prefix}{model}")) {
                return Ok(provider);
            }
        }

        if let Some(provider) = self.fallback.and_then(|kind| self.providers.get(&kind)) {
            return Ok(provider.clone());
        }
        Err(Error::NoProviderAvailable(model.into()))
    }

    /// All model names in the resolution table.
    pub fn models(&self) -> Vec<CompactString> {
        self.model_map.keys().cloned().collect()
    }

    /// Model names containing the query, case-insensitively.
    pub fn search_models(&self, query: &str) -> Vec<CompactString> {
        let query = query.to_lowercase();
        self.model_map
            .keys()
            .filter(|model| model.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    /// Whether a model name matches the reasoning heuristic.
    pub fn supports_reasoning(&self, model: &str) -> bool {
        let model = model.to_lowercase();
        REASONING_KEYWORDS
            .iter()
            .any(|keyword| model.contains(keyword))
    }

    /// All table models matching the reasoning heuristic.
    pub fn reasoning_models(&self) -> Vec<CompactString> {
        self.model_map
            .keys()
            .filter(|model| self.supports_reasoning(model))
            .cloned()
            .collect()
    }

    /// Basic information about a model, or `None` when no provider
    /// would serve it.
    pub fn model_info(&self, model: &str) -> Option<ModelInfo> {
        let provider = self.resolve(model).ok()?;
        let lowered = model.to_lowercase();
        let context_length = if lowered.contains("o3") || lowered.contains("o1") {
            128_000
        } else {
            4_096
        };
        Some(ModelInfo {
            id: model.into(),
            provider: provider.kind(),
            supports_reasoning: self.supports_reasoning(model),
            supports_streaming: true,
            context_length,
        })
    }

    /// The configured provider kinds.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.providers.keys().copied().collect()
    }

    /// Start all registered providers. Idempotent.
    pub async fn start_all(&self) {
        for provider in self.providers.values() {
            provider.start().await;
        }
        tracing::info!("started all providers");
    }

    /// Stop all registered providers. Idempotent.
    pub async fn stop_all(&self) {
        for provider in self.providers.values() {
            provider.stop().await;
        }
        tracing::info!("stopped all providers");
    }

    fn lookup(&self, model: &str) -> Option<Provider> {
        let kind = self.model_map.get(model)?;
        self.providers.get(kind).cloned()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.kinds())
            .field("models", &self.model_map.len())
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// Assemble the model→provider table for the registered providers.
///
/// Direct backends are preferred for their own models; when absent,
/// the OpenRouter-namespaced alias is mapped instead so proxy naming
/// still resolves.
fn build_model_map(
    providers: &BTreeMap<ProviderKind, Provider>,
) -> BTreeMap<CompactString, ProviderKind> {
    let mut map = BTreeMap::new();

    if providers.contains_key(&ProviderKind::OpenRouter) {
        for model in OPENROUTER_MODELS {
            map.insert(CompactString::from(*model), ProviderKind::OpenRouter);
        }
    }

    for model in OPENAI_MODELS {
        if providers.contains_key(&ProviderKind::OpenAi) {
            map.insert(CompactString::from(*model), ProviderKind::OpenAi);
        } else if providers.contains_key(&ProviderKind::OpenRouter) {
            map.insert(format_compact!("openai/{model}"), ProviderKind::OpenRouter);
        }
    }

    for model in ANTHROPIC_MODELS {
        if providers.contains_key(&ProviderKind::Anthropic) {
            map.insert(CompactString::from(*model), ProviderKind::Anthropic);
        } else if providers.contains_key(&ProviderKind::OpenRouter) {
            // Drop the date suffix for the OpenRouter alias.
            let simple = model.split("-20").next().unwrap_or(model);
            map.insert(
                format_compact!("anthropic/{simple}"),
                ProviderKind::OpenRouter,
            );
        }
    }

    map
}
