//! Task storage: queue plus result store, keyed by task id.

use std::collections::HashMap;
use std::sync::RwLock;

use roster_core::User;

use super::types::{TaskId, TaskState, UpdateTask};

/// Task store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskStoreError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// Task store abstraction: the single source of truth for task status.
///
/// `claim_next` is the delivery gate — it atomically flips the claimed task
/// to `Running`, so two workers never process the identical queued job twice.
pub trait TaskStore: Send + Sync {
    /// Enqueue a new pending task.
    fn enqueue(&self, task: UpdateTask) -> TaskId;

    /// Look up a task by id (any state, terminal included).
    fn get(&self, id: TaskId) -> Option<UpdateTask>;

    /// Claim the oldest pending task, marking it running. `None` when the
    /// queue is empty.
    fn claim_next(&self) -> Option<UpdateTask>;

    /// Resolve a task to success with the final record snapshot.
    fn complete(&self, id: TaskId, user: User) -> Result<(), TaskStoreError>;

    /// Resolve a task to failure with an error detail.
    fn fail(&self, id: TaskId, error: String) -> Result<(), TaskStoreError>;
}

/// In-memory task store.
///
/// Resolved tasks are retained for the process lifetime so they stay
/// queryable by id after completion; expiry is this store's own policy.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, UpdateTask>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn enqueue(&self, task: UpdateTask) -> TaskId {
        let id = task.id;
        self.tasks.write().unwrap().insert(id, task);
        id
    }

    fn get(&self, id: TaskId) -> Option<UpdateTask> {
        self.tasks.read().unwrap().get(&id).cloned()
    }

    fn claim_next(&self) -> Option<UpdateTask> {
        let mut tasks = self.tasks.write().unwrap();

        // FIFO: task ids are v7 (time-ordered), but sort on created_at to
        // keep the contract independent of the id scheme.
        let next = tasks
            .values()
            .filter(|t| t.state == TaskState::Pending)
            .min_by_key(|t| (t.created_at, t.id.0))
            .map(|t| t.id)?;

        let task = tasks.get_mut(&next)?;
        task.mark_running();
        Some(task.clone())
    }

    fn complete(&self, id: TaskId, user: User) -> Result<(), TaskStoreError> {
        let mut tasks = self.tasks.write().unwrap();
        let task = tasks.get_mut(&id).ok_or(TaskStoreError::NotFound(id))?;
        task.mark_succeeded(user);
        Ok(())
    }

    fn fail(&self, id: TaskId, error: String) -> Result<(), TaskStoreError> {
        let mut tasks = self.tasks.write().unwrap();
        let task = tasks.get_mut(&id).ok_or(TaskStoreError::NotFound(id))?;
        task.mark_failed(error);
        Ok(())
    }
}
