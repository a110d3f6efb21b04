//! Backend adapters and the provider registry.
//!
//! `Provider` is an enum-dispatched capability that turns a normalized
//! [`CompletionRequest`](dugong_core::CompletionRequest) into a lazy
//! stream of [`StreamEvent`](dugong_core::StreamEvent)s. One shared SSE
//! drain engine (`stream.rs`) owns framing, cancellation checks, event
//! numbering, and output accumulation; the per-backend adapters supply
//! only wire translation and delta parsing. `ProviderRegistry` resolves
//! model names to providers and owns their lifecycle.

pub mod anthropic;
pub mod config;
pub mod echo;
pub mod http;
pub mod openai;
pub mod openrouter;
mod provider;
pub mod registry;
mod stream;

pub use {
    anthropic::Anthropic,
    config::{ProviderConfig, ProviderKind, RegistryConfig},
    echo::Echo,
    http::HttpTransport,
    openai::OpenAi,
    openrouter::OpenRouter,
    provider::{Provider, build_provider},
    registry::{ModelInfo, ProviderRegistry},
};
