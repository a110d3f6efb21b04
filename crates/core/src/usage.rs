//! Token usage accounting, normalized across heterogeneous backends.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token counts for a completed generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: u64,

    /// Tokens in the completion.
    pub completion_tokens: u64,

    /// Total tokens billed.
    pub total_tokens: u64,

    /// Tokens spent on reasoning, where the backend reports them.
    pub reasoning_tokens: u64,
}

impl Usage {
    /// Normalize a backend stats payload into a [`Usage`].
    ///
    /// Starts from all zeros, overlays any `usage` sub-object, then
    /// searches the known reasoning-token locations in order — the last
    /// match wins. The search order reflects real divergence across
    /// backends (xAI nests under `usage.completion_tokens_details`,
    /// OpenRouter under `native_tokens_details`) and must not change.
    pub fn from_stats(stats: &Value) -> Self {
        let mut usage = Self::default();

        if let Some(sub) = stats.get("usage") {
            overlay(&mut usage.prompt_tokens, sub, "prompt_tokens");
            overlay(&mut usage.completion_tokens, sub, "completion_tokens");
            overlay(&mut usage.total_tokens, sub, "total_tokens");
            overlay(&mut usage.reasoning_tokens, sub, "reasoning_tokens");
        }

        let candidates = [
            path(stats, &["usage", "completion_tokens_details", "reasoning_tokens"]),
            path(stats, &["native_tokens_details", "reasoning_tokens"]),
            path(
                stats,
                &[
                    "native_tokens_details",
                    "completion_tokens_details",
                    "reasoning_tokens",
                ],
            ),
            path(stats, &["reasoning_tokens"]),
        ];
        for candidate in candidates.into_iter().flatten() {
            usage.reasoning_tokens = candidate;
        }

        usage
    }
}

/// Overwrite `slot` with `object[key]` when present and numeric.
fn overlay(slot: &mut u64, object: &Value, key: &str) {
    if let Some(n) = object.get(key).and_then(Value::as_u64) {
        *slot = n;
    }
}

/// Walk a key path through nested objects, returning the numeric leaf.
fn path(stats: &Value, keys: &[&str]) -> Option<u64> {
    let mut cursor = stats;
    for key in keys {
        cursor = cursor.get(key)?;
    }
    cursor.as_u64()
}
