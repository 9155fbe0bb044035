use axum::Router;

pub mod system;
pub mod tasks;
pub mod users;

/// Router for all record-management endpoints.
pub fn router() -> Router {
    Router::new()
        .merge(users::router())
        .merge(tasks::router())
}
