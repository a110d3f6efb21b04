//! Observer callbacks for task lifecycle milestones.

use dugong_core::{StreamEvent, Task, TaskId};

/// Callbacks the executor invokes as a task moves through its
/// lifecycle.
///
/// Keeps notification fan-out (UI relays, metrics, persistence) out of
/// the execution loop itself. Every method defaults to a no-op, so
/// implementations override only what they care about. Callbacks run
/// inline on the executor; keep them cheap.
pub trait TaskHook: Send + Sync {
    /// The executor picked the task up and marked it in progress.
    fn on_start(&self, _task: &Task) {}

    /// A streaming event was appended to the task's log.
    fn on_event(&self, _task_id: &TaskId, _event: &StreamEvent) {}

    /// The task completed successfully.
    fn on_complete(&self, _task: &Task) {}

    /// The task failed; `error` is the recorded cause.
    fn on_error(&self, _task: &Task, _error: &str) {}
}
