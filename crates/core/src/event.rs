//! The append-only stream event log unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One streaming delta received from a backend.
///
/// The payload is the backend-native JSON record, intentionally not
/// re-normalized, so replay consumers retain full fidelity. Sequence
/// numbers are zero-based and contiguous within a task's log.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamEvent {
    /// Position of this event in the task's log.
    pub sequence_number: u64,

    /// The raw backend delta.
    #[serde(rename = "data")]
    pub payload: Value,

    /// When the event was received.
    pub timestamp: DateTime<Utc>,
}
