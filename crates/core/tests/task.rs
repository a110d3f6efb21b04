//! Tests for the task state machine and event log.

use dugong_core::{Message, TaskHandle, TaskStatus};
use serde_json::json;

fn queued_task() -> TaskHandle {
    TaskHandle::new("openai/gpt-4o", vec![Message::user("hi")], None)
}

#[test]
fn new_task_is_queued() {
    let task = queued_task();
    let snapshot = task.snapshot();
    assert_eq!(snapshot.status, TaskStatus::Queued);
    assert!(snapshot.id.starts_with("resp_"));
    assert!(snapshot.started_at.is_none());
    assert!(snapshot.completed_at.is_none());
    assert!(snapshot.events.is_empty());
}

#[test]
fn happy_path_transitions() {
    let task = queued_task();
    assert!(task.mark_in_progress());
    assert_eq!(task.status(), TaskStatus::InProgress);
    assert!(task.snapshot().started_at.is_some());

    assert!(task.complete());
    let snapshot = task.snapshot();
    assert_eq!(snapshot.status, TaskStatus::Completed);
    assert!(snapshot.completed_at.is_some());
    assert!(snapshot.completed_at >= snapshot.started_at);
}

#[test]
fn cancel_queued_goes_straight_to_cancelled() {
    let task = queued_task();
    assert!(task.cancel());
    let snapshot = task.snapshot();
    assert_eq!(snapshot.status, TaskStatus::Cancelled);
    assert!(snapshot.completed_at.is_some());
    // The executor must now refuse to start it.
    assert!(!task.mark_in_progress());
    assert!(snapshot.started_at.is_none());
}

#[test]
fn terminal_status_is_never_overwritten() {
    let task = queued_task();
    task.mark_in_progress();
    assert!(task.cancel());
    // Whichever of completion or cancellation lands second is a no-op.
    assert!(!task.complete());
    assert!(!task.fail("late failure"));
    assert!(!task.cancel());
    assert_eq!(task.status(), TaskStatus::Cancelled);
    assert!(task.snapshot().error.is_none());
}

#[test]
fn fail_records_error_and_completed_at() {
    let task = queued_task();
    task.mark_in_progress();
    assert!(task.fail("boom"));
    let snapshot = task.snapshot();
    assert_eq!(snapshot.status, TaskStatus::Failed);
    assert_eq!(snapshot.error.as_deref(), Some("boom"));
    assert!(snapshot.completed_at.is_some());
    assert!(snapshot.output.is_none());
}

#[test]
fn event_log_is_gap_free_and_zero_based() {
    let task = queued_task();
    for i in 0..5 {
        let event = task.push_event(json!({"chunk": i}));
        assert_eq!(event.sequence_number, i as u64);
    }
    let events = task.events_from(0);
    assert_eq!(events.len(), 5);
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.sequence_number, i as u64);
    }
    assert_eq!(task.events_from(3).len(), 2);
    assert_eq!(task.events_from(9).len(), 0);
}

#[test]
fn finish_output_is_set_once() {
    let task = queued_task();
    task.finish_output("hello".into(), Some("thought".into()));
    task.finish_output("overwrite".into(), None);
    let snapshot = task.snapshot();
    assert_eq!(snapshot.output_text.as_deref(), Some("hello"));
    assert_eq!(snapshot.reasoning_summary.as_deref(), Some("thought"));
    let output = snapshot.output.expect("output record");
    assert!(output.id.starts_with("msg_"));
    assert_eq!(output.content[0].text, "hello");
}

#[test]
fn generation_ref_first_one_wins() {
    let task = queued_task();
    task.set_generation_ref("gen-1");
    task.set_generation_ref("gen-2");
    assert_eq!(task.generation_ref().as_deref(), Some("gen-1"));
}

#[test]
fn cancelled_task_keeps_partial_output() {
    let task = queued_task();
    task.mark_in_progress();
    task.push_event(json!({"delta": "par"}));
    task.cancel();
    task.finish_output("partial".into(), None);
    let snapshot = task.snapshot();
    assert_eq!(snapshot.status, TaskStatus::Cancelled);
    assert_eq!(snapshot.output_text.as_deref(), Some("partial"));
    assert_eq!(snapshot.events.len(), 1);
}
