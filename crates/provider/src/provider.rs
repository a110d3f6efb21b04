//! Unified `Provider` enum with dispatch over concrete backends.

use crate::config::{ProviderConfig, ProviderKind};
use crate::{Anthropic, Echo, OpenAi, OpenRouter};
use anyhow::Result;
use async_stream::try_stream;
use dugong_core::{CompletionRequest, StreamEvent, TaskHandle};
use futures_core::Stream;
use futures_util::StreamExt;
use serde_json::Value;

/// A backend adapter behind one dispatchable type.
#[derive(Clone)]
pub enum Provider {
    /// OpenRouter proxy API.
    OpenRouter(OpenRouter),
    /// OpenAI API.
    OpenAi(OpenAi),
    /// Anthropic Messages API.
    Anthropic(Anthropic),
    /// Offline echo backend.
    Echo(Echo),
}

impl Provider {
    /// The kind of this provider.
    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::OpenRouter(_) => ProviderKind::OpenRouter,
            Provider::OpenAi(_) => ProviderKind::OpenAi,
            Provider::Anthropic(_) => ProviderKind::Anthropic,
            Provider::Echo(_) => ProviderKind::Echo,
        }
    }

    /// Issue a streaming completion call against this backend.
    ///
    /// Lazy, single-pass, non-restartable; mutates the task's event
    /// log, generation reference, and (at drain end) output fields as
    /// a side effect — drain it fully.
    pub fn create_completion(
        &self,
        task: TaskHandle,
        request: CompletionRequest,
    ) -> impl Stream<Item = Result<StreamEvent>> + Send + 'static {
        let this = self.clone();
        try_stream! {
            match this {
                Provider::OpenRouter(p) => {
                    let mut stream = std::pin::pin!(p.create_completion(task, request));
                    while let Some(event) = stream.next().await {
                        yield event?;
                    }
                }
                Provider::OpenAi(p) => {
                    let mut stream = std::pin::pin!(p.create_completion(task, request));
                    while let Some(event) = stream.next().await {
                        yield event?;
                    }
                }
                Provider::Anthropic(p) => {
                    let mut stream = std::pin::pin!(p.create_completion(task, request));
                    while let Some(event) = stream.next().await {
                        yield event?;
                    }
                }
                Provider::Echo(p) => {
                    let mut stream = std::pin::pin!(p.create_completion(task, request));
                    while let Some(event) = stream.next().await {
                        yield event?;
                    }
                }
            }
        }
    }

    /// Fetch post-hoc usage statistics for a completed generation.
    ///
    /// Best-effort: backends without a stats endpoint return `None`.
    pub async fn generation_stats(&self, generation_ref: &str) -> Option<Value> {
        match self {
            Provider::OpenRouter(p) => p.generation_stats(generation_ref).await,
            Provider::OpenAi(p) => p.generation_stats(generation_ref).await,
            Provider::Anthropic(p) => p.generation_stats(generation_ref).await,
            Provider::Echo(_) => None,
        }
    }

    /// Acquire any per-provider network resources.
    ///
    /// The adapters share a `reqwest::Client`, so this is a no-op kept
    /// as the explicit lifecycle seam; calling it on a started
    /// provider is a no-op as well.
    pub async fn start(&self) {
        tracing::trace!("starting {} provider", self.kind().as_str());
    }

    /// Release any per-provider network resources. Idempotent.
    pub async fn stop(&self) {
        tracing::trace!("stopping {} provider", self.kind().as_str());
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Provider").field(&self.kind().as_str()).finish()
    }
}

/// Construct a [`Provider`] from config and a shared HTTP client.
pub fn build_provider(config: &ProviderConfig, client: reqwest::Client) -> Result<Provider> {
    config.validate()?;
    let api_key = config.api_key.as_deref().unwrap_or("");
    let base_url = config.base_url.as_deref();

    let provider = match config.kind {
        ProviderKind::OpenRouter => match base_url {
            Some(url) => Provider::OpenRouter(OpenRouter::custom(client, api_key, url)?),
            None => Provider::OpenRouter(OpenRouter::new(client, api_key)?),
        },
        ProviderKind::OpenAi => match base_url {
            Some(url) => Provider::OpenAi(OpenAi::custom(client, api_key, url)?),
            None => Provider::OpenAi(OpenAi::new(client, api_key)?),
        },
        ProviderKind::Anthropic => match base_url {
            Some(url) => Provider::Anthropic(Anthropic::custom(client, api_key, url)?),
            None => Provider::Anthropic(Anthropic::new(client, api_key)?),
        },
        ProviderKind::Echo => Provider::Echo(Echo::new()),
    };
    Ok(provider)
}
