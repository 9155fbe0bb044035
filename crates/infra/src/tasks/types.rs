//! Update-task types and state transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use roster_core::{User, UserId, UserPatch};

/// Opaque task identifier handed back by the enqueue endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// UUIDv7, time-ordered so FIFO claiming can sort on it cheaply.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Task execution state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Queued, waiting to be picked up.
    Pending,
    /// Claimed by a worker.
    Running,
    /// Update applied; carries the final record snapshot.
    Succeeded { user: User },
    /// Update could not be applied; carries the error detail.
    Failed { error: String },
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded { .. } | TaskState::Failed { .. })
    }

    /// The three-value vocabulary exposed on the status endpoint.
    ///
    /// `Running` reports as `pending`: to a polling caller the task is simply
    /// not done yet.
    pub fn public_status(&self) -> &'static str {
        match self {
            TaskState::Pending | TaskState::Running => "pending",
            TaskState::Succeeded { .. } => "success",
            TaskState::Failed { .. } => "failure",
        }
    }
}

/// A queued partial-update job against one user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    pub id: TaskId,
    pub user_id: UserId,
    /// Only the fields explicitly provided in the request.
    pub patch: UserPatch,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UpdateTask {
    pub fn new(user_id: UserId, patch: UserPatch) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            user_id,
            patch,
            state: TaskState::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = TaskState::Running;
        self.updated_at = Utc::now();
    }

    pub fn mark_succeeded(&mut self, user: User) {
        self.state = TaskState::Succeeded { user };
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.state = TaskState::Failed {
            error: error.into(),
        };
        self.updated_at = Utc::now();
    }
}
