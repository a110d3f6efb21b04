//! OpenAI adapter.

use crate::http::HttpTransport;
use crate::stream::{Delta, drain_completion};
use anyhow::Result;
use dugong_core::{CompletionRequest, StreamEvent, TaskHandle};
use futures_core::Stream;
use reqwest::Client;
use serde_json::Value;

/// Default OpenAI API base URL.
pub const OPENAI_API: &str = "https://api.openai.com/v1";

/// OpenAI backend adapter.
#[derive(Clone)]
pub struct OpenAi {
    transport: HttpTransport,
}

impl OpenAi {
    /// Create an adapter against the public OpenAI API.
    pub fn new(client: Client, key: &str) -> Result<Self> {
        Self::custom(client, key, OPENAI_API)
    }

    /// Create an adapter against a custom base URL.
    pub fn custom(client: Client, key: &str, base_url: &str) -> Result<Self> {
        let transport = HttpTransport::bearer(client, key, base_url)?;
        Ok(Self { transport })
    }

    /// Issue a streaming completion call.
    pub fn create_completion(
        &self,
        task: TaskHandle,
        request: CompletionRequest,
    ) -> impl Stream<Item = Result<StreamEvent>> + Send {
        let body = wire_body(&request);
        tracing::trace!("openai request: {body}");
        drain_completion(
            self.transport.post("/chat/completions", &body),
            task,
            parse_delta,
        )
    }

    /// OpenAI has no generation-stats endpoint.
    pub async fn generation_stats(&self, generation_ref: &str) -> Option<Value> {
        tracing::debug!("stats retrieval not available for openai generation {generation_ref}");
        None
    }
}

/// Translate the normalized request into the OpenAI wire body.
///
/// For the o1/o3 reasoning families, a valid effort level is surfaced
/// as the dedicated `reasoning_effort` parameter.
fn wire_body(request: &CompletionRequest) -> Value {
    let mut body = serde_json::to_value(request).unwrap_or_default();
    let model = request.model.to_lowercase();
    if ["o1", "o3"].iter().any(|family| model.contains(family))
        && let Some(effort) = request
            .reasoning
            .as_ref()
            .and_then(|reasoning| reasoning.effort.as_deref())
        && ["low", "medium", "high"].contains(&effort)
    {
        body["reasoning_effort"] = Value::String(effort.to_owned());
    }
    body
}

/// Extract content, reasoning, and the generation id from an OpenAI
/// chat-completion chunk.
fn parse_delta(payload: &Value) -> Delta {
    let mut delta = Delta::default();
    if let Some(id) = payload.get("id").and_then(Value::as_str) {
        delta.generation_ref = Some(id.to_owned());
    }
    if let Some(d) = payload.pointer("/choices/0/delta") {
        delta.content = d
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_owned);
        delta.reasoning = d
            .get("reasoning")
            .and_then(Value::as_str)
            .map(str::to_owned);
    }
    delta
}
