//! The execution queue consumer.

use crate::hook::TaskHook;
use crate::store::TaskStore;
use anyhow::Result;
use dugong_core::{CompletionRequest, Reasoning, TaskHandle, TaskId, Usage};
use dugong_provider::ProviderRegistry;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Pause before polling generation stats, giving the backend time to
/// index the finished generation.
pub(crate) const STATS_DELAY: Duration = Duration::from_secs(1);

/// Drives queued tasks through provider calls, one at a time.
#[derive(Clone)]
pub(crate) struct Executor {
    store: TaskStore,
    registry: Arc<ProviderRegistry>,
    hooks: Arc<Vec<Arc<dyn TaskHook>>>,
}

impl Executor {
    pub(crate) fn new(
        store: TaskStore,
        registry: Arc<ProviderRegistry>,
        hooks: Arc<Vec<Arc<dyn TaskHook>>>,
    ) -> Self {
        Self {
            store,
            registry,
            hooks,
        }
    }

    /// Consume the queue until it closes.
    ///
    /// Single consumer, strict FIFO: one task finishes (or fails)
    /// before the next is picked up. A task's failure is recorded on
    /// the task, never propagated to the loop.
    pub(crate) async fn run(self, mut queue: mpsc::UnboundedReceiver<TaskId>) {
        tracing::info!("executor started");
        while let Some(task_id) = queue.recv().await {
            let Some(task) = self.store.get(&task_id) else {
                tracing::warn!("queued task {task_id} missing from store, skipping");
                continue;
            };
            self.execute(task).await;
        }
        tracing::info!("executor stopped");
    }

    /// Drive one task from `Queued` to a terminal status.
    pub(crate) async fn execute(&self, task: TaskHandle) {
        if !task.mark_in_progress() {
            // Cancel landed before the executor picked the task up.
            tracing::debug!("task {} no longer queued, skipping", task.id());
            return;
        }
        let snapshot = task.snapshot();
        for hook in self.hooks.iter() {
            hook.on_start(&snapshot);
        }

        match self.run_completion(&task).await {
            Ok(()) => {
                // False means a cancel won the race mid-drain; the
                // cancelled status stands.
                if task.complete() {
                    tracing::info!("task {} completed", task.id());
                    let snapshot = task.snapshot();
                    for hook in self.hooks.iter() {
                        hook.on_complete(&snapshot);
                    }
                }
            }
            Err(error) => {
                let message = error.to_string();
                tracing::error!("task {} failed: {message}", task.id());
                if task.fail(&message) {
                    let snapshot = task.snapshot();
                    for hook in self.hooks.iter() {
                        hook.on_error(&snapshot, &message);
                    }
                }
            }
        }
    }

    /// Resolve the provider, drain the completion stream, then make
    /// one attempt at post-hoc usage stats.
    async fn run_completion(&self, task: &TaskHandle) -> Result<()> {
        let model = task.model();
        let provider = self.registry.resolve(&model)?;
        tracing::info!(
            "task {} using {} provider for model {model}",
            task.id(),
            provider.kind().as_str()
        );

        let mut request = CompletionRequest::new(model, task.input());
        request.reasoning = match task.reasoning() {
            Some(reasoning) => Some(reasoning),
            None if self.registry.supports_reasoning(&request.model) => Some(Reasoning::high()),
            None => None,
        };

        let task_id = task.id();
        let mut stream = std::pin::pin!(provider.create_completion(task.clone(), request));
        while let Some(event) = stream.next().await {
            let event = event?;
            for hook in self.hooks.iter() {
                hook.on_event(&task_id, &event);
            }
        }

        // One bounded stats attempt; a cancelled task skips it.
        if !task.is_terminal()
            && let Some(generation_ref) = task.generation_ref()
        {
            tokio::time::sleep(STATS_DELAY).await;
            if let Some(stats) = provider.generation_stats(&generation_ref).await {
                tracing::debug!("task {task_id} generation stats: {stats}");
                task.set_usage(Usage::from_stats(&stats));
            }
        }
        Ok(())
    }
}
