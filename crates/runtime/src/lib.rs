//! Task lifecycle engine over the provider layer.
//!
//! `TaskManager` is the facade: it accepts completion jobs, records
//! them in a shared [`TaskStore`], and feeds background jobs through an
//! unbounded FIFO queue into a single-consumer executor. Callers get a
//! task id back immediately and observe progress through snapshot
//! retrieval or [`TaskManager::open_stream`] replay; cancellation is a
//! status flag the provider drain observes cooperatively.

mod executor;
pub mod hook;
mod replay;
pub mod store;

pub use {hook::TaskHook, store::TaskStore};

use crate::executor::Executor;
use anyhow::{Context, Result};
use compact_str::CompactString;
use dugong_core::{Error, Message, Reasoning, StreamEvent, Task, TaskHandle, TaskId};
use dugong_provider::{ModelInfo, ProviderKind, ProviderRegistry};
use futures_core::Stream;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A completion job as submitted by a caller.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    /// Model name, resolved through the registry at execution time.
    pub model: CompactString,

    /// The conversation so far.
    pub input: Vec<Message>,

    /// Thinking configuration. When absent, reasoning-capable models
    /// get a high-effort default at execution time.
    #[serde(default)]
    pub reasoning: Option<Reasoning>,

    /// Queue the job (`true`) or execute it inline before returning
    /// (`false`).
    #[serde(default = "default_true")]
    pub background: bool,

    /// Accepted for API compatibility; execution always streams from
    /// the backend regardless.
    #[serde(default)]
    pub stream: bool,
}

impl SubmitRequest {
    /// Create a background submission.
    pub fn new(model: impl Into<CompactString>, input: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            input,
            reasoning: None,
            background: true,
            stream: false,
        }
    }

    /// Set the reasoning configuration.
    pub fn with_reasoning(mut self, reasoning: Reasoning) -> Self {
        self.reasoning = Some(reasoning);
        self
    }

    /// Execute inline instead of queueing.
    pub fn foreground(mut self) -> Self {
        self.background = false;
        self
    }
}

fn default_true() -> bool {
    true
}

/// Facade over the task store, execution queue, and provider registry.
///
/// One instance per process. `submit`/`retrieve`/`cancel`/`open_stream`
/// are safe to call from any number of tasks concurrently; execution
/// itself is serialized through the single queue consumer.
pub struct TaskManager {
    store: TaskStore,
    registry: Arc<ProviderRegistry>,
    executor: Executor,
    queue: mpsc::UnboundedSender<TaskId>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<TaskId>>>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl TaskManager {
    /// Create a manager over the given registry, with no hooks.
    pub fn new(registry: ProviderRegistry) -> Self {
        Self::with_hooks(registry, Vec::new())
    }

    /// Create a manager with lifecycle hooks.
    pub fn with_hooks(registry: ProviderRegistry, hooks: Vec<Arc<dyn TaskHook>>) -> Self {
        let store = TaskStore::new();
        let registry = Arc::new(registry);
        let executor = Executor::new(store.clone(), registry.clone(), Arc::new(hooks));
        let (queue, receiver) = mpsc::unbounded_channel();
        Self {
            store,
            registry,
            executor,
            queue,
            receiver: Mutex::new(Some(receiver)),
            consumer: Mutex::new(None),
        }
    }

    /// Start the providers and spawn the queue consumer.
    ///
    /// Tasks submitted before `start` stay queued and are picked up
    /// once the consumer is running. Calling `start` twice is a no-op.
    pub async fn start(&self) {
        let Some(receiver) = self.receiver.lock().expect("manager lock poisoned").take() else {
            tracing::warn!("task manager already started");
            return;
        };
        self.registry.start_all().await;
        let handle = tokio::spawn(self.executor.clone().run(receiver));
        *self.consumer.lock().expect("manager lock poisoned") = Some(handle);
        tracing::info!("task manager started");
    }

    /// Stop the queue consumer and the providers.
    ///
    /// The task currently executing is abandoned mid-flight; its
    /// status is whatever it last reached.
    pub async fn stop(&self) {
        let handle = self.consumer.lock().expect("manager lock poisoned").take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
        self.registry.stop_all().await;
        tracing::info!("task manager stopped");
    }

    /// Accept a completion job.
    ///
    /// Background jobs return a `Queued` snapshot immediately;
    /// foreground jobs execute inline and return the terminal snapshot.
    pub async fn submit(&self, request: SubmitRequest) -> Result<Task> {
        let task = TaskHandle::new(request.model, request.input, request.reasoning);
        self.store.insert(task.clone());
        tracing::info!(
            "accepted task {} for model {} (background: {})",
            task.id(),
            task.model(),
            request.background
        );

        if request.background {
            self.queue
                .send(task.id())
                .context("execution queue closed")?;
        } else {
            self.executor.execute(task.clone()).await;
        }
        Ok(task.snapshot())
    }

    /// A point-in-time snapshot of a task, or `None` if unknown.
    pub fn retrieve(&self, id: &str) -> Option<Task> {
        self.store.get(id).map(|task| task.snapshot())
    }

    /// Request cancellation of a task.
    ///
    /// Queued tasks are cancelled outright; in-progress tasks stop at
    /// the drain's next cancellation check. Already-terminal tasks are
    /// left untouched. Returns the post-request snapshot, or `None` if
    /// the id is unknown.
    pub fn cancel(&self, id: &str) -> Option<Task> {
        let task = self.store.get(id)?;
        if task.cancel() {
            tracing::info!("cancelled task {id}");
        }
        Some(task.snapshot())
    }

    /// Stream a task's events: replay the log from `after` (exclusive;
    /// `None` for the start), then tail live events until the task is
    /// terminal.
    pub fn open_stream(
        &self,
        id: &str,
        after: Option<u64>,
    ) -> Result<impl Stream<Item = StreamEvent> + Send + 'static, Error> {
        let task = self
            .store
            .get(id)
            .ok_or_else(|| Error::TaskNotFound(id.into()))?;
        Ok(replay::open_stream(task, after))
    }

    /// The underlying store.
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// All model names in the registry's resolution table.
    pub fn models(&self) -> Vec<CompactString> {
        self.registry.models()
    }

    /// Model names containing the query, case-insensitively.
    pub fn search_models(&self, query: &str) -> Vec<CompactString> {
        self.registry.search_models(query)
    }

    /// Table models matching the reasoning heuristic.
    pub fn reasoning_models(&self) -> Vec<CompactString> {
        self.registry.reasoning_models()
    }

    /// Basic information about a model, or `None` when no provider
    /// would serve it.
    pub fn model_info(&self, model: &str) -> Option<ModelInfo> {
        self.registry.model_info(model)
    }

    /// The configured provider kinds.
    pub fn provider_kinds(&self) -> Vec<ProviderKind> {
        self.registry.kinds()
    }
}

impl std::fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManager")
            .field("tasks", &self.store.len())
            .field("registry", &self.registry)
            .finish()
    }
}
