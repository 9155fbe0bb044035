use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use roster_infra::tasks::TaskId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/tasks/:id", get(get_task_status))
}

/// `GET /tasks/{id}` — status of an enqueued update.
///
/// Unknown (or expired, once the store evicts) task ids are a 404 rather
/// than a fourth status value.
pub async fn get_task_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let task_id: TaskId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::NOT_FOUND, "task_not_found", "task not found")
        }
    };

    match services.tasks.get(task_id) {
        Some(task) => (StatusCode::OK, Json(dto::TaskStatusResponse::from(task))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "task_not_found", "task not found"),
    }
}
