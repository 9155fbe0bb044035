use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use roster_core::{NewUser, UserId, UserPatch};
use roster_infra::tasks::UpdateTask;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/users/", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(enqueue_update).delete(delete_user),
        )
}

/// `POST /users/` — validate (closed enums, required fields; enforced by
/// deserialization, so invalid payloads never reach the store) and insert.
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewUser>,
) -> axum::response::Response {
    match services.users.insert(body).await {
        Ok(user) => (StatusCode::OK, Json(dto::UserResponse::from(user))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// `GET /users/?offset&limit` — live records only, insertion order.
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let (offset, limit) = match query.resolve() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.users.list(offset, limit).await {
        Ok(users) => {
            let items: Vec<dto::UserResponse> =
                users.into_iter().map(dto::UserResponse::from).collect();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// `GET /users/{id}` — 404 for absent or soft-deleted records.
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.users.get(UserId(id)).await {
        Ok(Some(user)) => (StatusCode::OK, Json(dto::UserResponse::from(user))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// `PATCH /users/{id}` — enqueue the partial update and return a task id
/// immediately; the record store is not touched here. Poll `GET /tasks/{id}`
/// for the outcome.
pub async fn enqueue_update(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> axum::response::Response {
    let task = UpdateTask::new(UserId(id), patch);
    let task_id = services.tasks.enqueue(task);

    tracing::debug!(user_id = id, task_id = %task_id, "update task enqueued");

    (
        StatusCode::OK,
        Json(dto::EnqueueUpdateResponse {
            task_id: task_id.to_string(),
        }),
    )
        .into_response()
}

/// `DELETE /users/{id}` — tombstone a live record. Deleting an absent or
/// already-deleted id fails 404, never succeeds silently.
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.users.soft_delete(UserId(id)).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
