//! `roster-infra` — storage and background-task infrastructure.
//!
//! Two subsystems:
//! - [`user_store`]: the record store (in-memory and Postgres), sole owner of
//!   user rows with soft-delete semantics.
//! - [`tasks`]: the update-task queue, its result store, and the worker that
//!   applies partial updates asynchronously.

pub mod tasks;
pub mod user_store;

pub use tasks::{
    InMemoryTaskStore, TaskId, TaskState, TaskStore, UpdateTask, UpdateWorkerHandle, WorkerConfig,
};
pub use user_store::{InMemoryUserStore, PostgresUserStore, UserStore, UserStoreError};
