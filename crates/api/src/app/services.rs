//! Infrastructure wiring: record store selection and update-worker spawn.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use roster_infra::tasks::{self, InMemoryTaskStore, TaskStore, UpdateWorkerHandle, WorkerConfig};
use roster_infra::user_store::{InMemoryUserStore, PostgresUserStore, UserStore};

/// Shared handles passed to every handler via `Extension`.
///
/// Handlers never touch a global session: each store call checks out its own
/// scoped connection (or lock scope) and releases it on completion.
pub struct AppServices {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    // Keeps the worker alive for the lifetime of the services.
    _worker: UpdateWorkerHandle,
}

/// Build services from the environment.
///
/// `DATABASE_URL` selects the Postgres-backed record store (its schema is
/// ensured before any traffic is served); without it the in-memory store is
/// used, which suits dev and tests.
pub async fn build_services() -> AppServices {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(8)
                .connect(&url)
                .await
                .expect("failed to connect to DATABASE_URL");
            PostgresUserStore::ensure_schema(&pool)
                .await
                .expect("failed to ensure users schema");
            tracing::info!("using postgres record store");
            wire(Arc::new(PostgresUserStore::new(pool)))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory record store");
            build_in_memory_services()
        }
    }
}

/// In-memory wiring (dev/test): no external collaborators required.
pub fn build_in_memory_services() -> AppServices {
    wire(Arc::new(InMemoryUserStore::new()))
}

fn wire(users: Arc<dyn UserStore>) -> AppServices {
    let tasks: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
    let worker = tasks::spawn_worker(tasks.clone(), users.clone(), WorkerConfig::default());

    AppServices {
        users,
        tasks,
        _worker: worker,
    }
}
