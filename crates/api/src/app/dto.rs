use serde::{Deserialize, Serialize};

use roster_core::{BloodStatus, DomainError, Gender, House, User, UserId};
use roster_infra::tasks::{TaskState, UpdateTask};

// -------------------------
// Request DTOs
// -------------------------

/// Pagination query for `GET /users/`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

/// Maximum (and default) page size for listing users.
pub const MAX_LIMIT: u32 = 100;

impl ListQuery {
    /// Resolve defaults and enforce bounds: offset >= 0 (by type), limit in
    /// 1..=100. Out-of-range limits are rejected, not clamped.
    pub fn resolve(&self) -> Result<(u32, u32), DomainError> {
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(MAX_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(DomainError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok((offset, limit))
    }
}

// -------------------------
// Response DTOs
// -------------------------

/// Public shape of a user record: profile fields plus id, no lifecycle
/// timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub gender: Gender,
    pub house: House,
    pub blood_status: BloodStatus,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            age: user.age,
            gender: user.gender,
            house: user.house,
            blood_status: user.blood_status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnqueueUpdateResponse {
    pub task_id: String,
}

/// `GET /tasks/{id}` body: `result` is null while pending, the updated
/// record on success, and an error detail on failure.
#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub id: String,
    pub status: &'static str,
    pub result: serde_json::Value,
}

impl From<UpdateTask> for TaskStatusResponse {
    fn from(task: UpdateTask) -> Self {
        let status = task.state.public_status();
        let result = match task.state {
            TaskState::Pending | TaskState::Running => serde_json::Value::Null,
            TaskState::Succeeded { user } => {
                serde_json::to_value(UserResponse::from(user)).unwrap_or_default()
            }
            TaskState::Failed { error } => serde_json::json!({ "error": error }),
        };
        Self {
            id: task.id.to_string(),
            status,
            result,
        }
    }
}
