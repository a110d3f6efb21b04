//! End-to-end lifecycle tests over the offline demo backend.

use dugong_core::{Message, Task, TaskStatus};
use dugong_provider::{ProviderRegistry, RegistryConfig};
use dugong_runtime::{SubmitRequest, TaskHook, TaskManager};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn registry() -> ProviderRegistry {
    ProviderRegistry::new(&RegistryConfig::default()).unwrap()
}

fn slow_registry(delay_ms: u64) -> ProviderRegistry {
    let mut config = RegistryConfig::default();
    config.demo_delay_ms = delay_ms;
    ProviderRegistry::new(&config).unwrap()
}

async fn wait_terminal(manager: &TaskManager, id: &str) -> Task {
    for _ in 0..500 {
        let task = manager.retrieve(id).unwrap();
        if task.status.is_terminal() {
            return task;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {id} never reached a terminal status");
}

#[tokio::test]
async fn background_task_runs_to_completion() {
    let manager = TaskManager::new(slow_registry(50));
    manager.start().await;

    let accepted = manager
        .submit(SubmitRequest::new("demo/echo", vec![Message::user("hi")]))
        .await
        .unwrap();
    assert!(accepted.id.starts_with("resp_"));
    assert!(!accepted.status.is_terminal());
    assert!(accepted.events.is_empty());

    let task = wait_terminal(&manager, &accepted.id).await;
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.output_text.as_deref(), Some("Echo: hi"));
    assert_eq!(task.events.len(), 2);
    assert_eq!(task.events[0].sequence_number, 0);
    assert_eq!(task.events[1].sequence_number, 1);
    assert!(task.started_at.is_some());
    assert!(task.completed_at.is_some());
    assert!(task.usage.is_none());

    manager.stop().await;
}

#[tokio::test]
async fn failed_task_does_not_stop_the_consumer() {
    // Demo-only registry with no fallback: unknown models fail.
    let manager = TaskManager::new(registry());
    manager.start().await;

    let failed = manager
        .submit(SubmitRequest::new(
            "no/such-model",
            vec![Message::user("hi")],
        ))
        .await
        .unwrap();
    let failed = wait_terminal(&manager, &failed.id).await;
    assert_eq!(failed.status, TaskStatus::Failed);
    let error = failed.error.unwrap();
    assert!(error.contains("NoProviderAvailable"), "error: {error}");
    assert!(failed.output_text.is_none());

    // The consumer is still alive for the next task.
    let ok = manager
        .submit(SubmitRequest::new("demo/echo", vec![Message::user("next")]))
        .await
        .unwrap();
    let ok = wait_terminal(&manager, &ok.id).await;
    assert_eq!(ok.status, TaskStatus::Completed);
    assert_eq!(ok.output_text.as_deref(), Some("Echo: next"));

    manager.stop().await;
}

#[tokio::test]
async fn foreground_submission_executes_inline() {
    // No consumer running: the foreground path executes on the caller.
    let manager = TaskManager::new(registry());
    let task = manager
        .submit(SubmitRequest::new("demo/echo", vec![Message::user("hi")]).foreground())
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.output_text.as_deref(), Some("Echo: hi"));
    assert_eq!(task.events.len(), 2);
}

#[tokio::test]
async fn retrieve_unknown_task_is_none() {
    let manager = TaskManager::new(registry());
    assert!(manager.retrieve("resp_nope").is_none());
}

#[tokio::test]
async fn submit_after_stop_is_an_error() {
    let manager = TaskManager::new(registry());
    manager.start().await;
    manager.stop().await;

    let result = manager
        .submit(SubmitRequest::new("demo/echo", vec![Message::user("hi")]))
        .await;
    assert!(result.unwrap_err().to_string().contains("queue closed"));
}

#[derive(Default)]
struct Recorder {
    starts: AtomicUsize,
    events: AtomicUsize,
    completes: AtomicUsize,
    errors: AtomicUsize,
}

impl TaskHook for Recorder {
    fn on_start(&self, _task: &Task) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }
    fn on_event(&self, _task_id: &dugong_core::TaskId, _event: &dugong_core::StreamEvent) {
        self.events.fetch_add(1, Ordering::SeqCst);
    }
    fn on_complete(&self, _task: &Task) {
        self.completes.fetch_add(1, Ordering::SeqCst);
    }
    fn on_error(&self, _task: &Task, _error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn hooks_observe_the_lifecycle() {
    let recorder = Arc::new(Recorder::default());
    let manager = TaskManager::with_hooks(registry(), vec![recorder.clone() as Arc<dyn TaskHook>]);

    let task = manager
        .submit(SubmitRequest::new("demo/echo", vec![Message::user("hi")]).foreground())
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(recorder.starts.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.events.load(Ordering::SeqCst), 2);
    assert_eq!(recorder.completes.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.errors.load(Ordering::SeqCst), 0);

    manager
        .submit(SubmitRequest::new("no/such-model", vec![Message::user("hi")]).foreground())
        .await
        .unwrap();
    assert_eq!(recorder.errors.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.completes.load(Ordering::SeqCst), 1);
}

#[test]
fn model_catalog_passthrough() {
    let manager = TaskManager::new(registry());
    // Demo-only registry: the resolution table is empty but the demo
    // namespace still resolves.
    assert!(manager.models().is_empty());
    assert!(manager.model_info("demo/echo").is_some());
    assert!(manager.search_models("gpt").is_empty());
    assert!(manager.reasoning_models().is_empty());
    assert_eq!(manager.provider_kinds().len(), 1);
}
