//! The shared SSE drain engine behind every remote adapter.
//!
//! Owns the mechanics all backends have in common: line buffering
//! across network chunks, `data: ` framing, the `[DONE]` sentinel,
//! warn-and-skip on malformed lines, per-line cancellation checks,
//! event-log appends, and content/reasoning accumulation with the final
//! output write-back. Adapters plug in only a delta parser.

use anyhow::Result;
use async_stream::try_stream;
use dugong_core::{Error, StreamEvent, TaskHandle};
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::RequestBuilder;
use serde_json::Value;

/// What an adapter extracted from one streaming payload.
#[derive(Debug, Default)]
pub(crate) struct Delta {
    /// Plain content text.
    pub content: Option<String>,
    /// Reasoning ("thinking") text, where the backend surfaces it.
    pub reasoning: Option<String>,
    /// Backend-assigned generation reference.
    pub generation_ref: Option<String>,
}

/// Drain a streaming completion response into the task's event log.
///
/// Lazy, single-pass, non-restartable. Mutates the task as a side
/// effect while iterating: every parsed line is appended to `events`,
/// the first generation reference is recorded, and once the drain stops
/// (sentinel, end of stream, or observed cancellation) the accumulated
/// text is written back via `finish_output`. Callers must drain the
/// stream fully for the task's denormalized fields to be complete.
///
/// A non-success initial status fails with [`Error::BackendHttp`]
/// carrying the response body. Lines that fail to parse are logged and
/// skipped; they never fail the task.
pub(crate) fn drain_completion<P>(
    request: RequestBuilder,
    task: TaskHandle,
    parse: P,
) -> impl Stream<Item = Result<StreamEvent>> + Send
where
    P: Fn(&Value) -> Delta + Send + 'static,
{
    try_stream! {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            Err(Error::BackendHttp {
                status: status.as_u16(),
                body,
            })?;
            return;
        }

        let mut bytes_stream = response.bytes_stream();
        let mut buf = String::new();
        let mut content = String::new();
        let mut reasoning = String::new();

        'recv: while let Some(next) = bytes_stream.next().await {
            let bytes = next?;
            buf.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(pos) = buf.find('\n') {
                let line = buf[..pos].trim().to_owned();
                buf.drain(..=pos);

                // Cooperative stop: checked at each received line, the
                // partial output captured so far is kept.
                if task.is_cancelled() {
                    break 'recv;
                }

                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                if data == "[DONE]" {
                    break 'recv;
                }

                match serde_json::from_str::<Value>(data) {
                    Ok(payload) => {
                        let delta = parse(&payload);
                        if let Some(generation_ref) = delta.generation_ref {
                            task.set_generation_ref(generation_ref);
                        }
                        if let Some(text) = delta.content {
                            content.push_str(&text);
                        }
                        if let Some(text) = delta.reasoning {
                            reasoning.push_str(&text);
                        }
                        let event = task.push_event(payload);
                        yield event;
                    }
                    Err(e) => {
                        tracing::warn!("failed to parse stream line: {e}, data: {data}");
                    }
                }
            }
        }

        let reasoning_summary = (!reasoning.is_empty()).then_some(reasoning);
        task.finish_output(content, reasoning_summary);
    }
}
