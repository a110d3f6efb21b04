//! The task entity, its state machine, and the shared mutation handle.

use crate::{Message, Reasoning, Role, StreamEvent, Usage};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use ulid::Ulid;

/// Opaque task identifier (`resp_<ulid>`).
pub type TaskId = CompactString;

/// Lifecycle state of a task.
///
/// `Queued → InProgress → {Completed | Failed | Cancelled}`, with
/// `Cancelled` also reachable directly from `Queued`. There is no
/// transition out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted, waiting for the executor.
    Queued,
    /// Currently being driven through a provider call.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished with a recorded error.
    Failed,
    /// Stopped by an external cancel request.
    Cancelled,
}

impl TaskStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// One submitted completion job and its full lifecycle record.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    /// Unique identifier, immutable after creation.
    pub id: TaskId,

    /// Current lifecycle state.
    pub status: TaskStatus,

    /// The requested model name (registry key), immutable.
    pub model: CompactString,

    /// The conversation so far, immutable.
    pub input: Vec<Message>,

    /// Thinking configuration, immutable.
    pub reasoning: Option<Reasoning>,

    /// When the task was created.
    pub created_at: DateTime<Utc>,

    /// When the executor picked the task up.
    pub started_at: Option<DateTime<Utc>>,

    /// When the task reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,

    /// Accumulated final text, set once when the drain finishes.
    pub output_text: Option<String>,

    /// Structured assistant message derived from `output_text`.
    pub output: Option<OutputMessage>,

    /// Concatenated reasoning text captured during streaming.
    pub reasoning_summary: Option<String>,

    /// Human-readable cause, present iff `status` is `Failed`.
    pub error: Option<String>,

    /// Token accounting, populated opportunistically after completion.
    pub usage: Option<Usage>,

    /// Backend-assigned id used to poll for usage statistics.
    pub generation_ref: Option<CompactString>,

    /// Append-only log of streaming events, gap-free from 0.
    pub events: Vec<StreamEvent>,
}

/// The structured output record built from the accumulated text.
#[derive(Debug, Clone, Serialize)]
pub struct OutputMessage {
    /// Message identifier (`msg_<ulid>`).
    pub id: CompactString,

    /// Record type, always `message`.
    #[serde(rename = "type")]
    pub kind: CompactString,

    /// Record status, always `completed`.
    pub status: CompactString,

    /// The content blocks.
    pub content: Vec<OutputContent>,

    /// Always the assistant role.
    pub role: Role,
}

/// A single content block of an [`OutputMessage`].
#[derive(Debug, Clone, Serialize)]
pub struct OutputContent {
    /// Block type, always `output_text`.
    #[serde(rename = "type")]
    pub kind: CompactString,

    /// The text.
    pub text: String,
}

impl OutputMessage {
    /// Build the assistant message for the given output text.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: CompactString::from(format!("msg_{}", Ulid::new())),
            kind: "message".into(),
            status: "completed".into(),
            content: vec![OutputContent {
                kind: "output_text".into(),
                text: text.into(),
            }],
            role: Role::Assistant,
        }
    }
}

/// Shared handle over a [`Task`].
///
/// The only mutation surface for task state: the executor and provider
/// adapters go through these methods, readers take cloned snapshots.
/// Every terminal transition is guarded here, so exactly one
/// non-terminal→terminal transition happens per task regardless of who
/// wins the completion/cancellation race.
#[derive(Clone)]
pub struct TaskHandle {
    inner: Arc<RwLock<Task>>,
}

impl TaskHandle {
    /// Create a new `Queued` task.
    pub fn new(
        model: impl Into<CompactString>,
        input: Vec<Message>,
        reasoning: Option<Reasoning>,
    ) -> Self {
        let task = Task {
            id: CompactString::from(format!("resp_{}", Ulid::new())),
            status: TaskStatus::Queued,
            model: model.into(),
            input,
            reasoning,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            output_text: None,
            output: None,
            reasoning_summary: None,
            error: None,
            usage: None,
            generation_ref: None,
            events: Vec::new(),
        };
        Self {
            inner: Arc::new(RwLock::new(task)),
        }
    }

    /// The task id.
    pub fn id(&self) -> TaskId {
        self.read().id.clone()
    }

    /// The requested model name.
    pub fn model(&self) -> CompactString {
        self.read().model.clone()
    }

    /// The immutable input conversation.
    pub fn input(&self) -> Vec<Message> {
        self.read().input.clone()
    }

    /// The immutable reasoning configuration.
    pub fn reasoning(&self) -> Option<Reasoning> {
        self.read().reasoning.clone()
    }

    /// A point-in-time copy of the whole entity.
    pub fn snapshot(&self) -> Task {
        self.read().clone()
    }

    /// The current status.
    pub fn status(&self) -> TaskStatus {
        self.read().status
    }

    /// Whether an external cancel has landed.
    ///
    /// Provider adapters poll this at each received line.
    pub fn is_cancelled(&self) -> bool {
        self.read().status == TaskStatus::Cancelled
    }

    /// Whether the task has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.read().status.is_terminal()
    }

    /// `Queued → InProgress`, recording `started_at`.
    ///
    /// Returns false without touching the task when it is no longer
    /// queued (cancel-before-start).
    pub fn mark_in_progress(&self) -> bool {
        let mut task = self.write();
        if task.status != TaskStatus::Queued {
            return false;
        }
        task.status = TaskStatus::InProgress;
        task.started_at = Some(Utc::now());
        true
    }

    /// Append a streaming payload to the event log.
    ///
    /// Sequence numbers are assigned here from the log length, which
    /// keeps them gap-free and zero-based by construction. Returns the
    /// appended event.
    pub fn push_event(&self, payload: Value) -> StreamEvent {
        let mut task = self.write();
        let event = StreamEvent {
            sequence_number: task.events.len() as u64,
            payload,
            timestamp: Utc::now(),
        };
        task.events.push(event.clone());
        event
    }

    /// Record the backend-assigned generation reference, first one wins.
    pub fn set_generation_ref(&self, generation_ref: impl Into<CompactString>) {
        let mut task = self.write();
        if task.generation_ref.is_none() {
            task.generation_ref = Some(generation_ref.into());
        }
    }

    /// The captured generation reference, if any.
    pub fn generation_ref(&self) -> Option<CompactString> {
        self.read().generation_ref.clone()
    }

    /// Write back the accumulated output at the end of a drain.
    ///
    /// Runs for completed and cancelled drains alike, so a cancelled
    /// task keeps whatever partial text arrived before the stop was
    /// observed. Set-once; a second call is ignored.
    pub fn finish_output(&self, text: String, reasoning_summary: Option<String>) {
        let mut task = self.write();
        if task.output_text.is_none() {
            task.output = Some(OutputMessage::assistant(text.clone()));
            task.output_text = Some(text);
        }
        if task.reasoning_summary.is_none() {
            task.reasoning_summary = reasoning_summary;
        }
    }

    /// Record normalized usage, set-once.
    pub fn set_usage(&self, usage: Usage) {
        let mut task = self.write();
        if task.usage.is_none() {
            task.usage = Some(usage);
        }
    }

    /// `InProgress → Completed`, recording `completed_at`.
    ///
    /// Returns false when a concurrent cancel already made the task
    /// terminal — the loser of that race must not resurrect its status.
    pub fn complete(&self) -> bool {
        let mut task = self.write();
        if task.status != TaskStatus::InProgress {
            return false;
        }
        task.status = TaskStatus::Completed;
        task.completed_at = Some(Utc::now());
        true
    }

    /// Any non-terminal state → `Failed`, recording the cause and
    /// `completed_at`. Returns false if already terminal.
    pub fn fail(&self, error: impl Into<String>) -> bool {
        let mut task = self.write();
        if task.status.is_terminal() {
            return false;
        }
        task.status = TaskStatus::Failed;
        task.error = Some(error.into());
        task.completed_at = Some(Utc::now());
        true
    }

    /// Any non-terminal state → `Cancelled`, recording `completed_at`.
    ///
    /// Observed cooperatively: work already dispatched to a provider
    /// keeps running until its next `is_cancelled` check. Returns false
    /// if already terminal.
    pub fn cancel(&self) -> bool {
        let mut task = self.write();
        if task.status.is_terminal() {
            return false;
        }
        task.status = TaskStatus::Cancelled;
        task.completed_at = Some(Utc::now());
        true
    }

    /// Events from index `start` onward, cloned.
    pub fn events_from(&self, start: usize) -> Vec<StreamEvent> {
        let task = self.read();
        task.events.get(start..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Current length of the event log.
    pub fn event_count(&self) -> usize {
        self.read().events.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Task> {
        self.inner.read().expect("task lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Task> {
        self.inner.write().expect("task lock poisoned")
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let task = self.read();
        f.debug_struct("TaskHandle")
            .field("id", &task.id)
            .field("status", &task.status)
            .field("model", &task.model)
            .field("events", &task.events.len())
            .finish()
    }
}
