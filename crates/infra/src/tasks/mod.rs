//! Asynchronous update-task subsystem.
//!
//! The PATCH endpoint enqueues an [`UpdateTask`] and returns its id without
//! waiting; the [`worker`] applies the partial update later and records the
//! outcome in the task store, which callers poll by id.
//!
//! State machine per task: **pending → running → {success, failure}**.
//! Terminal states are final; failures are reported as-is, never retried.

pub mod store;
pub mod types;
pub mod worker;

pub use store::{InMemoryTaskStore, TaskStore, TaskStoreError};
pub use types::{TaskId, TaskState, UpdateTask};
pub use worker::{spawn_worker, UpdateWorkerHandle, WorkerConfig};
