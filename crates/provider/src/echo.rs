//! Offline echo adapter for `demo/*` models.
//!
//! Emits two deterministic chat-completion chunks built from the last
//! user message, then completes — no network involved. Used by the
//! end-to-end tests and as a smoke backend when no credentials are
//! configured.

use anyhow::Result;
use async_stream::try_stream;
use dugong_core::{CompletionRequest, Role, StreamEvent, TaskHandle};
use futures_core::Stream;
use serde_json::json;
use std::time::Duration;

/// Deterministic offline backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Echo {
    /// Pause before each emitted chunk. Zero by default; tests use it
    /// to open a window for cancellation mid-stream.
    delay: Duration,
}

impl Echo {
    /// Create an echo adapter that emits without delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an echo adapter that pauses before each chunk.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    /// Produce the echo stream: two content fragments for the last
    /// user message, mirroring the remote adapters' side effects on
    /// the task (event appends, final output write-back, per-chunk
    /// cancellation checks).
    pub fn create_completion(
        self,
        task: TaskHandle,
        request: CompletionRequest,
    ) -> impl Stream<Item = Result<StreamEvent>> + Send {
        let delay = self.delay;
        try_stream! {
            let text = request
                .messages
                .iter()
                .rev()
                .find(|message| message.role == Role::User)
                .map(|message| message.content.clone())
                .unwrap_or_default();

            let mut content = String::new();
            for fragment in ["Echo: ", text.as_str()] {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if task.is_cancelled() {
                    break;
                }
                let payload = json!({
                    "object": "chat.completion.chunk",
                    "model": request.model,
                    "choices": [{"index": 0, "delta": {"content": fragment}}],
                });
                content.push_str(fragment);
                let event = task.push_event(payload);
                yield event;
            }
            task.finish_output(content, None);
        }
    }
}
