use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptrError {
    #[error("no worktree tracked for task: {0}")]
    NotFound(String),

    #[error("task '{0}' already has a worktree assignment")]
    AlreadyAssigned(String),

    #[error("git {op} failed: {detail}")]
    Git { op: &'static str, detail: String },

    #[error("{op} timed out after {secs}s")]
    Timeout { op: &'static str, secs: u64 },

    #[error("git executable not found on PATH")]
    GitMissing,

    #[error("state file {path} is corrupt: {detail}")]
    StateCorrupt { path: String, detail: String },

    #[error("invalid task id '{0}': must be alphanumeric with '-', '_' or '.'")]
    InvalidTaskId(String),

    #[error("plan file not found: {0}")]
    PlanNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, OptrError>;
