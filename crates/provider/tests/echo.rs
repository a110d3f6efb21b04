//! Tests for the offline echo adapter.

use dugong_core::{CompletionRequest, Message, TaskHandle};
use dugong_provider::Echo;
use futures_util::StreamExt;
use std::time::Duration;

fn task() -> TaskHandle {
    TaskHandle::new("demo/echo", vec![Message::user("hi")], None)
}

#[tokio::test]
async fn emits_two_events_and_echoes_the_user_message() {
    let task = task();
    let request = CompletionRequest::new("demo/echo", task.input());
    let provider = Echo::new();

    let mut stream = std::pin::pin!(provider.create_completion(task.clone(), request));
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event.unwrap());
    }

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].sequence_number, 0);
    assert_eq!(events[1].sequence_number, 1);
    assert_eq!(events[0].payload["choices"][0]["delta"]["content"], "Echo: ");
    assert_eq!(events[1].payload["choices"][0]["delta"]["content"], "hi");

    let snapshot = task.snapshot();
    assert_eq!(snapshot.output_text.as_deref(), Some("Echo: hi"));
    assert!(snapshot.generation_ref.is_none());
}

#[tokio::test]
async fn empty_conversation_still_completes() {
    let task = TaskHandle::new("demo/echo", Vec::new(), None);
    let request = CompletionRequest::new("demo/echo", Vec::new());
    let mut stream = std::pin::pin!(Echo::new().create_completion(task.clone(), request));
    while let Some(event) = stream.next().await {
        event.unwrap();
    }
    assert_eq!(task.snapshot().output_text.as_deref(), Some("Echo: "));
}

#[tokio::test]
async fn cancellation_between_chunks_keeps_partial_output() {
    let task = task();
    task.mark_in_progress();
    let request = CompletionRequest::new("demo/echo", task.input());
    let provider = Echo::with_delay(Duration::from_millis(20));

    let mut stream = std::pin::pin!(provider.create_completion(task.clone(), request));
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.sequence_number, 0);

    task.cancel();
    while let Some(event) = stream.next().await {
        event.unwrap();
    }

    let snapshot = task.snapshot();
    assert_eq!(snapshot.events.len(), 1);
    assert_eq!(snapshot.output_text.as_deref(), Some("Echo: "));
}
