//! In-memory task store.

use dugong_core::{TaskHandle, TaskId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared map of every task the manager has accepted.
///
/// Tasks are kept for their whole lifetime so terminal results stay
/// retrievable; nothing evicts them.
#[derive(Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<TaskId, TaskHandle>>>,
}

impl TaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under its id.
    pub fn insert(&self, task: TaskHandle) {
        self.write().insert(task.id(), task);
    }

    /// Look up a task by id.
    pub fn get(&self, id: &str) -> Option<TaskHandle> {
        self.read().get(id).cloned()
    }

    /// Number of stored tasks.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Ids of all stored tasks, in no particular order.
    pub fn ids(&self) -> Vec<TaskId> {
        self.read().keys().cloned().collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TaskId, TaskHandle>> {
        self.tasks.read().expect("task store lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<TaskId, TaskHandle>> {
        self.tasks.write().expect("task store lock poisoned")
    }
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore").field("tasks", &self.len()).finish()
    }
}
