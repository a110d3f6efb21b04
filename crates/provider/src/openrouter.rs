//! OpenRouter adapter.
//!
//! The most broadly compatible backend: proxies most model namespaces
//! and is the only reference backend with a post-hoc generation-stats
//! endpoint (`GET /generation?id=`).

use crate::http::HttpTransport;
use crate::stream::{Delta, drain_completion};
use anyhow::Result;
use dugong_core::{CompletionRequest, StreamEvent, TaskHandle};
use futures_core::Stream;
use reqwest::Client;
use serde_json::Value;

/// Default OpenRouter API base URL.
pub const OPENROUTER_API: &str = "https://openrouter.ai/api/v1";

/// OpenRouter backend adapter.
#[derive(Clone)]
pub struct OpenRouter {
    transport: HttpTransport,
}

impl OpenRouter {
    /// Create an adapter against the public OpenRouter API.
    pub fn new(client: Client, key: &str) -> Result<Self> {
        Self::custom(client, key, OPENROUTER_API)
    }

    /// Create an adapter against a custom base URL.
    pub fn custom(client: Client, key: &str, base_url: &str) -> Result<Self> {
        let transport = HttpTransport::bearer(client, key, base_url)?
            .header("HTTP-Referer", "https://github.com/opendugong/dugong")?
            .header("X-Title", "Dugong Background Tasks")?;
        Ok(Self { transport })
    }

    /// Issue a streaming completion call.
    ///
    /// The normalized request already carries the OpenRouter wire shape
    /// (`reasoning` object, `stream_options.include_usage`), so it is
    /// sent as-is.
    pub fn create_completion(
        &self,
        task: TaskHandle,
        request: CompletionRequest,
    ) -> impl Stream<Item = Result<StreamEvent>> + Send {
        tracing::trace!("openrouter request: {:?}", request);
        drain_completion(
            self.transport.post("/chat/completions", &request),
            task,
            parse_delta,
        )
    }

    /// Fetch post-hoc usage statistics for a generation.
    ///
    /// Best-effort: failures are logged and reported as absent.
    pub async fn generation_stats(&self, generation_ref: &str) -> Option<Value> {
        match self
            .transport
            .get_json(&format!("/generation?id={generation_ref}"))
            .await
        {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!("failed to get generation stats: {e}");
                None
            }
        }
    }
}

/// Extract content, reasoning, and the generation id from an
/// OpenRouter chat-completion chunk.
///
/// Reasoning arrives in several shapes depending on the proxied model:
/// `delta.reasoning`, `delta.thoughts`, or a top-level `reasoning`
/// field that is either a string or an object with `content`.
fn parse_delta(payload: &Value) -> Delta {
    let mut delta = Delta::default();

    if let Some(id) = payload.get("id").and_then(Value::as_str) {
        delta.generation_ref = Some(id.to_owned());
    }

    let mut reasoning = String::new();
    if let Some(d) = payload.pointer("/choices/0/delta") {
        if let Some(text) = d.get("content").and_then(Value::as_str) {
            delta.content = Some(text.to_owned());
        }
        if let Some(text) = d.get("reasoning").and_then(Value::as_str) {
            reasoning.push_str(text);
        } else if let Some(text) = d.get("thoughts").and_then(Value::as_str) {
            reasoning.push_str(text);
        }
    }
    match payload.get("reasoning") {
        Some(Value::String(text)) => reasoning.push_str(text),
        Some(Value::Object(object)) => {
            if let Some(text) = object.get("content").and_then(Value::as_str) {
                reasoning.push_str(text);
            }
        }
        _ => {}
    }
    delta.reasoning = (!reasoning.is_empty()).then_some(reasoning);

    delta
}

#[cfg(test)]
mod tests {
    use super::parse_delta;
    use serde_json::json;

    #[test]
    fn content_and_id() {
        let delta = parse_delta(&json!({
            "id": "gen-1",
            "choices": [{"delta": {"content": "hi"}}]
        }));
        assert_eq!(delta.content.as_deref(), Some("hi"));
        assert_eq!(delta.generation_ref.as_deref(), Some("gen-1"));
    }

    #[test]
    fn reasoning_shapes() {
        let delta = parse_delta(&json!({
            "choices": [{"delta": {"reasoning": "a"}}],
            "reasoning": {"content": "b"}
        }));
        assert_eq!(delta.reasoning.as_deref(), Some("ab"));

        let delta = parse_delta(&json!({
            "choices": [{"delta": {"thoughts": "t"}}]
        }));
        assert_eq!(delta.reasoning.as_deref(), Some("t"));

        let delta = parse_delta(&json!({"reasoning": "top"}));
        assert_eq!(delta.reasoning.as_deref(), Some("top"));
    }
}
