//! The normalized completion request handed to provider adapters.

use crate::Message;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A normalized streaming completion request.
///
/// Adapters translate this into their wire format and may add
/// backend-specific fields (effort-level translation, stop-sequence
/// translation) without violating the base shape.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompletionRequest {
    /// The model to use.
    pub model: CompactString,

    /// The conversation so far.
    pub messages: Vec<Message>,

    /// Always true — execution drives every backend in streaming mode.
    pub stream: bool,

    /// Backend thinking configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Reasoning>,

    /// Stop sequences, translated per backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<CompactString>>,

    /// Streaming options.
    pub stream_options: StreamOptions,
}

impl CompletionRequest {
    /// Create a streaming request for the given model and messages.
    pub fn new(model: impl Into<CompactString>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
            reasoning: None,
            stop: None,
            stream_options: StreamOptions {
                include_usage: true,
            },
        }
    }

    /// Set the reasoning configuration.
    pub fn with_reasoning(mut self, reasoning: Reasoning) -> Self {
        self.reasoning = Some(reasoning);
        self
    }
}

/// Configuration for backend "thinking" behavior.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Reasoning {
    /// Effort level (`low`, `medium`, `high`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<CompactString>,

    /// Summary verbosity (`auto`, `detailed`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<CompactString>,
}

impl Reasoning {
    /// The default configuration for reasoning-capable models.
    pub fn high() -> Self {
        Self {
            effort: Some("high".into()),
            summary: Some("auto".into()),
        }
    }
}

/// Streaming knobs forwarded to the backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamOptions {
    /// Ask the backend to report usage in the final chunk.
    pub include_usage: bool,
}
