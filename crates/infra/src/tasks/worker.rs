//! Background worker that applies queued partial updates.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::user_store::{UserStore, UserStoreError};

use super::store::TaskStore;
use super::types::UpdateTask;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often to poll for new tasks when the queue is empty.
    pub poll_interval: Duration,
    /// Name for logging.
    pub name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            name: "update-worker".to_string(),
        }
    }
}

/// Handle to control a running worker.
#[derive(Debug)]
pub struct UpdateWorkerHandle {
    shutdown: watch::Sender<bool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl UpdateWorkerHandle {
    /// Request graceful shutdown and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

/// Spawn the update worker on the current tokio runtime.
///
/// Multiple workers over the same task store are safe: `claim_next` hands
/// each queued job to exactly one of them, and the applied merge is
/// idempotent per job, so at-least-once delivery cannot corrupt a record.
pub fn spawn_worker(
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserStore>,
    config: WorkerConfig,
) -> UpdateWorkerHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let join = tokio::spawn(worker_loop(tasks, users, config, shutdown_rx));

    UpdateWorkerHandle {
        shutdown: shutdown_tx,
        join: Some(join),
    }
}

async fn worker_loop(
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserStore>,
    config: WorkerConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(worker = %config.name, "update worker started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        match tasks.claim_next() {
            Some(task) => {
                debug!(worker = %config.name, task_id = %task.id, user_id = %task.user_id, "claimed task");
                run_task(tasks.as_ref(), users.as_ref(), task).await;
            }
            None => {
                tokio::select! {
                    _ = shutdown_rx.changed() => {}
                    _ = tokio::time::sleep(config.poll_interval) => {}
                }
            }
        }
    }

    info!(worker = %config.name, "update worker stopped");
}

/// Execute one claimed task to its terminal state.
///
/// Failures resolve the task; they are never raised further — the enqueue
/// call has long since returned, so polling the task is the only way callers
/// learn the outcome.
pub async fn run_task(tasks: &dyn TaskStore, users: &dyn UserStore, task: UpdateTask) {
    let outcome = users.apply_patch(task.user_id, &task.patch).await;

    let result = match outcome {
        Ok(user) => {
            debug!(task_id = %task.id, user_id = %task.user_id, "update applied");
            tasks.complete(task.id, user)
        }
        Err(UserStoreError::NotFound) => {
            debug!(task_id = %task.id, user_id = %task.user_id, "target not live");
            tasks.fail(task.id, "user not found".to_string())
        }
        Err(UserStoreError::Storage(err)) => {
            warn!(task_id = %task.id, error = %err, "update failed on storage");
            tasks.fail(task.id, err)
        }
    };

    if let Err(err) = result {
        // The task vanished from the store between claim and resolve.
        warn!(task_id = %task.id, error = %err, "failed to record task outcome");
    }
}
