//! Anthropic adapter.
//!
//! The Messages API differs from the chat-completions shape: system
//! prompts are a top-level field, messages must alternate roles and
//! start with `user`, `max_tokens` is mandatory, and deltas arrive as
//! typed events (`message_start`, `content_block_delta`).

use crate::http::HttpTransport;
use crate::stream::{Delta, drain_completion};
use anyhow::Result;
use compact_str::CompactString;
use dugong_core::{CompletionRequest, Role, StreamEvent, TaskHandle};
use futures_core::Stream;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};

/// Default Anthropic API base URL.
pub const ANTHROPIC_API: &str = "https://api.anthropic.com/v1";

/// The API version header sent with every request.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default token budget when the caller specifies none.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic backend adapter.
#[derive(Clone)]
pub struct Anthropic {
    transport: HttpTransport,
}

impl Anthropic {
    /// Create an adapter against the public Anthropic API.
    pub fn new(client: Client, key: &str) -> Result<Self> {
        Self::custom(client, key, ANTHROPIC_API)
    }

    /// Create an adapter against a custom base URL.
    pub fn custom(client: Client, key: &str, base_url: &str) -> Result<Self> {
        let transport = HttpTransport::custom_header(client, "x-api-key", key, base_url)?
            .header("anthropic-version", ANTHROPIC_VERSION)?;
        Ok(Self { transport })
    }

    /// Issue a streaming completion call.
    pub fn create_completion(
        &self,
        task: TaskHandle,
        request: CompletionRequest,
    ) -> impl Stream<Item = Result<StreamEvent>> + Send {
        let body = MessagesRequest::from_completion(&request);
        tracing::trace!("anthropic request: {:?}", serde_json::to_string(&body));
        drain_completion(self.transport.post("/messages", &body), task, parse_delta)
    }

    /// Anthropic has no generation-stats endpoint.
    pub async fn generation_stats(&self, generation_ref: &str) -> Option<Value> {
        tracing::debug!("stats retrieval not available for anthropic generation {generation_ref}");
        None
    }
}

/// Request body for the Anthropic Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    /// The model identifier.
    pub model: CompactString,
    /// Maximum tokens to generate (mandatory on this API).
    pub max_tokens: u32,
    /// System prompt (top-level, not in the messages array).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// The messages array in content-block format.
    pub messages: Vec<Value>,
    /// Whether to stream the response.
    pub stream: bool,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<CompactString>>,
}

impl MessagesRequest {
    /// Translate the normalized request into the Messages API shape.
    ///
    /// System turns are lifted into the top-level `system` field,
    /// consecutive same-role turns are coalesced, and a leading user
    /// turn is guaranteed — the API rejects sequences violating either
    /// rule.
    pub fn from_completion(request: &CompletionRequest) -> Self {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut messages: Vec<Value> = Vec::new();
        let mut last_role: Option<Role> = None;

        for message in &request.messages {
            if message.role == Role::System {
                system_parts.push(&message.content);
                continue;
            }
            if last_role == Some(message.role)
                && let Some(previous) = messages.last_mut()
                && let Some(text) = previous
                    .pointer("/content/0/text")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            {
                previous["content"][0]["text"] =
                    Value::String(format!("{text}\n\n{}", message.content));
                continue;
            }
            messages.push(json!({
                "role": message.role.as_str(),
                "content": [{"type": "text", "text": message.content}],
            }));
            last_role = Some(message.role);
        }

        if messages
            .first()
            .and_then(|m| m.get("role"))
            .and_then(Value::as_str)
            != Some("user")
        {
            messages.insert(
                0,
                json!({
                    "role": "user",
                    "content": [{"type": "text", "text": "Please respond to the following:"}],
                }),
            );
        }

        Self {
            model: request.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
            messages,
            stream: true,
            stop_sequences: request.stop.clone(),
        }
    }
}

/// Extract content and the generation id from an Anthropic stream
/// event.
fn parse_delta(payload: &Value) -> Delta {
    let mut delta = Delta::default();
    match payload.get("type").and_then(Value::as_str) {
        Some("message_start") => {
            delta.generation_ref = payload
                .pointer("/message/id")
                .and_then(Value::as_str)
                .map(str::to_owned);
        }
        Some("content_block_delta") => {
            delta.content = payload
                .pointer("/delta/text")
                .and_then(Value::as_str)
                .map(str::to_owned);
        }
        _ => {}
    }
    delta
}
