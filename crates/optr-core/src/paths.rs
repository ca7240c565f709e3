use crate::error::{OptrError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Naming constants
// ---------------------------------------------------------------------------

/// Default state document, relative to the repository root.
pub const STATE_FILE: &str = ".optr-worktrees.json";

/// Prefix for task branches; the full name is `optr/task-<task_id>`.
pub const BRANCH_PREFIX: &str = "optr/task-";

/// Prefix for worktree directory names under the repository root.
pub const WORKTREE_PREFIX: &str = ".optr-worktree-";

// ---------------------------------------------------------------------------
// Derivation helpers
// ---------------------------------------------------------------------------

/// Branch name for a task, derived deterministically from its id.
pub fn task_branch(task_id: &str) -> String {
    format!("{BRANCH_PREFIX}{task_id}")
}

/// Directory name (not path) of a task's worktree.
pub fn worktree_name(task_id: &str) -> String {
    format!("{WORKTREE_PREFIX}{task_id}")
}

/// Absolute location of a task's worktree under the repository root.
pub fn worktree_dir(repo_root: &Path, task_id: &str) -> PathBuf {
    repo_root.join(worktree_name(task_id))
}

// ---------------------------------------------------------------------------
// Task id validation
// ---------------------------------------------------------------------------

static TASK_ID_RE: OnceLock<Regex> = OnceLock::new();

fn task_id_re() -> &'static Regex {
    TASK_ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-]*$").unwrap())
}

/// Task ids become branch names and directory names, so they must stay
/// filesystem- and refname-safe.
pub fn validate_task_id(task_id: &str) -> Result<()> {
    if task_id.is_empty() || task_id.len() > 64 || !task_id_re().is_match(task_id) {
        return Err(OptrError::InvalidTaskId(task_id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_and_dir_are_deterministic() {
        assert_eq!(task_branch("T1"), "optr/task-T1");
        assert_eq!(worktree_name("T1"), ".optr-worktree-T1");
        assert_eq!(
            worktree_dir(Path::new("/repo"), "T1"),
            PathBuf::from("/repo/.optr-worktree-T1")
        );
    }

    #[test]
    fn valid_task_ids() {
        for id in ["task-1", "T1", "a", "build_backend", "v1.2"] {
            validate_task_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_task_ids() {
        for id in ["", "-leading-dash", "has space", "a/b", "..", &"x".repeat(65)] {
            assert!(validate_task_id(id).is_err(), "expected invalid: {id}");
        }
    }
}
