//! Worktree registry: tracks which task owns which isolated worktree.
//!
//! The registry persists a single state document in the repository root and
//! reconciles it against git, which remains ground truth for what exists on
//! disk. A record is created only after git has materialized the worktree,
//! and deleted only after git has removed it — on any external failure the
//! state is left untouched, so an on-disk worktree is never orphaned from
//! the document.
//!
//! One process per repository is assumed; concurrent writers of the state
//! file are not coordinated.

use crate::config::RegistryConfig;
use crate::error::{OptrError, Result};
use crate::git::{GitRunner, WorktreeListing};
use crate::isolation::{self, IsolationDecision, TaskDescriptor};
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// WorktreeAssignment
// ---------------------------------------------------------------------------

/// The single logical record for a task under isolation. Kept as one type
/// so the workspace fields and the assignment fields can never diverge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorktreeAssignment {
    pub task_id: String,
    pub task_name: String,
    /// Filesystem location of the isolated working directory.
    pub path: String,
    /// Branch bound to the worktree, `optr/task-<task_id>`.
    pub branch: String,
    /// Whether the workspace exists on disk.
    pub created: bool,
    /// Paths this task touches; consulted for conflict detection. Written
    /// by external planners, not by the registry itself.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

// ---------------------------------------------------------------------------
// On-disk document
// ---------------------------------------------------------------------------

// The document keeps the historical two-map layout so other consumers of
// the state file keep working; the maps are split from / joined into the
// single in-memory record at the save/load boundary.

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateDoc {
    #[serde(default)]
    worktrees: BTreeMap<String, WorktreeRecord>,
    #[serde(default)]
    task_assignments: BTreeMap<String, TaskRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WorktreeRecord {
    task_id: String,
    task_name: String,
    path: String,
    branch: String,
    created: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct TaskRecord {
    task_name: String,
    worktree: String,
    branch: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    files: Vec<String>,
}

// ---------------------------------------------------------------------------
// WorktreeRegistry
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct WorktreeRegistry {
    config: RegistryConfig,
    git: GitRunner,
    assignments: BTreeMap<String, WorktreeAssignment>,
}

impl WorktreeRegistry {
    /// Open the registry for a repository, loading persisted state.
    ///
    /// An absent state file is the empty state; a present but unparsable
    /// file fails fast rather than silently resetting.
    pub fn open(config: RegistryConfig) -> Result<Self> {
        let git = GitRunner::new(&config.repo_root, config.git_timeout)?;
        let assignments = load_state(&config.state_path())?;
        Ok(Self {
            config,
            git,
            assignments,
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// All tracked assignments, keyed by task id.
    pub fn assignments(&self) -> &BTreeMap<String, WorktreeAssignment> {
        &self.assignments
    }

    /// Pure lookup; no side effects.
    pub fn get_assignment(&self, task_id: &str) -> Option<&WorktreeAssignment> {
        self.assignments.get(task_id)
    }

    /// Evaluate the isolation rules for `task` against tracked assignments.
    pub fn should_use_worktree(&self, task: &TaskDescriptor) -> IsolationDecision {
        isolation::decide(task, &self.assignments)
    }

    /// Create an isolated worktree for a task and record the assignment.
    ///
    /// Reuses the task branch when it already exists, otherwise creates it
    /// from `base_branch`. State is mutated and persisted only after git has
    /// succeeded; any failure aborts with the state untouched.
    pub fn create_worktree(
        &mut self,
        task_id: &str,
        task_name: &str,
        base_branch: &str,
    ) -> Result<WorktreeAssignment> {
        paths::validate_task_id(task_id)?;
        if self.assignments.contains_key(task_id) {
            return Err(OptrError::AlreadyAssigned(task_id.to_string()));
        }

        let branch = paths::task_branch(task_id);
        if !self.git.branch_exists(&branch)? {
            self.git.create_branch(&branch, base_branch)?;
        }

        let worktree_path = paths::worktree_dir(&self.config.repo_root, task_id);
        self.git.worktree_add(&worktree_path, &branch)?;

        let assignment = WorktreeAssignment {
            task_id: task_id.to_string(),
            task_name: task_name.to_string(),
            path: worktree_path.to_string_lossy().into_owned(),
            branch,
            created: true,
            files: Vec::new(),
        };
        self.assignments
            .insert(task_id.to_string(), assignment.clone());
        self.save()?;

        Ok(assignment)
    }

    /// Remove a task's worktree and drop the assignment.
    ///
    /// Fails with `NotFound` for untracked ids. The record is deleted only
    /// after git has removed the workspace — if removal fails the record
    /// stays, since the directory is still on disk.
    pub fn remove_worktree(&mut self, task_id: &str, force: bool) -> Result<()> {
        let assignment = self
            .assignments
            .get(task_id)
            .ok_or_else(|| OptrError::NotFound(task_id.to_string()))?;

        self.git
            .worktree_remove(Path::new(&assignment.path), force)?;

        self.assignments.remove(task_id);
        self.save()?;
        Ok(())
    }

    /// Remove every tracked worktree. Returns the number successfully
    /// removed; failed removals stay tracked.
    pub fn cleanup_all(&mut self, force: bool) -> usize {
        // Snapshot the ids so removal cannot skip entries mid-iteration.
        let task_ids: Vec<String> = self.assignments.keys().cloned().collect();
        let mut removed = 0;
        for task_id in task_ids {
            if self.remove_worktree(&task_id, force).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// All worktrees known to git, tracked or not. Empty on command failure.
    pub fn list_worktrees(&self) -> Vec<WorktreeListing> {
        self.git.worktree_list()
    }

    fn save(&self) -> Result<()> {
        let mut doc = StateDoc::default();
        for (task_id, a) in &self.assignments {
            doc.worktrees.insert(
                task_id.clone(),
                WorktreeRecord {
                    task_id: a.task_id.clone(),
                    task_name: a.task_name.clone(),
                    path: a.path.clone(),
                    branch: a.branch.clone(),
                    created: a.created,
                },
            );
            doc.task_assignments.insert(
                task_id.clone(),
                TaskRecord {
                    task_name: a.task_name.clone(),
                    worktree: worktree_name_of(a),
                    branch: a.branch.clone(),
                    files: a.files.clone(),
                },
            );
        }

        let mut data = serde_json::to_vec_pretty(&doc)?;
        data.push(b'\n');
        io::atomic_write(&self.config.state_path(), &data)
    }
}

/// Directory name recorded in the lightweight assignment: taken from the
/// stored path so externally-written records keep their own naming.
fn worktree_name_of(a: &WorktreeAssignment) -> String {
    Path::new(&a.path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| paths::worktree_name(&a.task_id))
}

fn load_state(path: &Path) -> Result<BTreeMap<String, WorktreeAssignment>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let data = std::fs::read_to_string(path)?;
    let doc: StateDoc = serde_json::from_str(&data).map_err(|e| OptrError::StateCorrupt {
        path: path.to_string_lossy().into_owned(),
        detail: e.to_string(),
    })?;

    // The worktrees map is authoritative; the lightweight records only
    // contribute the planner-written file lists.
    let mut assignments = BTreeMap::new();
    for (task_id, record) in doc.worktrees {
        let files = doc
            .task_assignments
            .get(&task_id)
            .map(|t| t.files.clone())
            .unwrap_or_default();
        assignments.insert(
            task_id,
            WorktreeAssignment {
                task_id: record.task_id,
                task_name: record.task_name,
                path: record.path,
                branch: record.branch,
                created: record.created,
                files,
            },
        );
    }
    Ok(assignments)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo(dir: &Path) {
        for args in [
            vec!["init", "-b", "main"],
            vec!["config", "user.email", "test@test.com"],
            vec!["config", "user.name", "Test"],
            vec!["commit", "--allow-empty", "-m", "initial"],
        ] {
            let out = std::process::Command::new("git")
                .args(&args)
                .current_dir(dir)
                .output()
                .unwrap();
            assert!(out.status.success(), "git {args:?} failed");
        }
    }

    fn open_registry(dir: &TempDir) -> WorktreeRegistry {
        WorktreeRegistry::open(RegistryConfig::new(dir.path())).unwrap()
    }

    #[test]
    fn create_then_get_returns_deterministic_names() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        let mut registry = open_registry(&dir);

        let created = registry.create_worktree("T", "Build backend", "main").unwrap();
        assert_eq!(created.branch, "optr/task-T");
        assert!(created.path.ends_with(".optr-worktree-T"));
        assert!(created.created);

        let fetched = registry.get_assignment("T").unwrap();
        assert_eq!(fetched, &created);
        assert!(Path::new(&fetched.path).exists());
    }

    #[test]
    fn create_twice_is_already_assigned() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        let mut registry = open_registry(&dir);

        registry.create_worktree("t1", "one", "main").unwrap();
        let err = registry.create_worktree("t1", "one again", "main").unwrap_err();
        assert!(matches!(err, OptrError::AlreadyAssigned(_)));
    }

    #[test]
    fn create_from_missing_base_leaves_state_untouched() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        let mut registry = open_registry(&dir);

        let err = registry
            .create_worktree("t1", "one", "no-such-branch")
            .unwrap_err();
        assert!(matches!(err, OptrError::Git { op: "branch create", .. }));
        assert!(registry.get_assignment("t1").is_none());
        assert!(!RegistryConfig::new(dir.path()).state_path().exists());
    }

    #[test]
    fn create_reuses_existing_branch() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        let out = std::process::Command::new("git")
            .args(["branch", "optr/task-t1", "main"])
            .current_dir(dir.path())
            .output()
            .unwrap();
        assert!(out.status.success());

        let mut registry = open_registry(&dir);
        let created = registry.create_worktree("t1", "one", "main").unwrap();
        assert_eq!(created.branch, "optr/task-t1");
    }

    #[test]
    fn remove_unknown_task_is_not_found_and_state_is_untouched() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        let mut registry = open_registry(&dir);
        registry.create_worktree("t1", "one", "main").unwrap();

        let state_path = RegistryConfig::new(dir.path()).state_path();
        let before = std::fs::read(&state_path).unwrap();

        let err = registry.remove_worktree("ghost", false).unwrap_err();
        assert!(matches!(err, OptrError::NotFound(_)));
        assert_eq!(std::fs::read(&state_path).unwrap(), before);
    }

    #[test]
    fn remove_deletes_workspace_and_record() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        let mut registry = open_registry(&dir);

        let created = registry.create_worktree("t1", "one", "main").unwrap();
        registry.remove_worktree("t1", false).unwrap();
        assert!(registry.get_assignment("t1").is_none());
        assert!(!Path::new(&created.path).exists());

        // Second removal: NotFound, no panic, state unchanged.
        let state_path = RegistryConfig::new(dir.path()).state_path();
        let before = std::fs::read(&state_path).unwrap();
        let err = registry.remove_worktree("t1", false).unwrap_err();
        assert!(matches!(err, OptrError::NotFound(_)));
        assert_eq!(std::fs::read(&state_path).unwrap(), before);
    }

    #[test]
    fn failed_removal_keeps_record() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        let mut registry = open_registry(&dir);

        let created = registry.create_worktree("t1", "one", "main").unwrap();
        // An untracked file makes the worktree dirty; plain removal fails.
        std::fs::write(Path::new(&created.path).join("scratch.txt"), "wip").unwrap();

        let err = registry.remove_worktree("t1", false).unwrap_err();
        assert!(matches!(err, OptrError::Git { op: "worktree remove", .. }));
        assert!(registry.get_assignment("t1").is_some());

        // Forced removal passes the flag through and succeeds.
        registry.remove_worktree("t1", true).unwrap();
        assert!(registry.get_assignment("t1").is_none());
    }

    #[test]
    fn cleanup_all_empties_registry_and_counts() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        let mut registry = open_registry(&dir);

        registry.create_worktree("t1", "one", "main").unwrap();
        registry.create_worktree("t2", "two", "main").unwrap();
        registry.create_worktree("t3", "three", "main").unwrap();

        let removed = registry.cleanup_all(false);
        assert_eq!(removed, 3);
        assert!(registry.assignments().is_empty());
    }

    #[test]
    fn state_round_trips_across_instances() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());

        let mut registry = open_registry(&dir);
        let a1 = registry.create_worktree("t1", "one", "main").unwrap();
        let a2 = registry.create_worktree("t2", "two", "main").unwrap();
        drop(registry);

        let reloaded = open_registry(&dir);
        assert_eq!(reloaded.get_assignment("t1"), Some(&a1));
        assert_eq!(reloaded.get_assignment("t2"), Some(&a2));
    }

    #[test]
    fn state_document_keeps_both_maps() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        let mut registry = open_registry(&dir);
        registry.create_worktree("t1", "one", "main").unwrap();

        let raw = std::fs::read_to_string(RegistryConfig::new(dir.path()).state_path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(doc["worktrees"]["t1"]["branch"] == "optr/task-t1");
        assert!(doc["task_assignments"]["t1"]["worktree"] == ".optr-worktree-t1");
    }

    #[test]
    fn corrupt_state_file_fails_fast() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        let state_path = RegistryConfig::new(dir.path()).state_path();
        std::fs::write(&state_path, "not json {").unwrap();

        let err = WorktreeRegistry::open(RegistryConfig::new(dir.path())).unwrap_err();
        assert!(matches!(err, OptrError::StateCorrupt { .. }));
    }

    #[test]
    fn planner_written_files_participate_in_conflicts() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());

        let doc = serde_json::json!({
            "worktrees": {
                "other": {
                    "task_id": "other",
                    "task_name": "Other task",
                    "path": dir.path().join(".optr-worktree-other").to_string_lossy(),
                    "branch": "optr/task-other",
                    "created": true
                }
            },
            "task_assignments": {
                "other": {
                    "task_name": "Other task",
                    "worktree": ".optr-worktree-other",
                    "branch": "optr/task-other",
                    "files": ["src/lib.rs"]
                }
            }
        });
        let state_path = RegistryConfig::new(dir.path()).state_path();
        std::fs::write(&state_path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

        let registry = open_registry(&dir);
        let task = TaskDescriptor {
            id: "t1".to_string(),
            files: vec!["src/lib.rs".to_string()],
            ..Default::default()
        };
        let decision = registry.should_use_worktree(&task);
        assert!(decision.isolate);
        assert_eq!(decision.rule, Some("file-conflict"));
    }

    #[test]
    fn invalid_task_id_rejected_before_git_runs() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        let mut registry = open_registry(&dir);
        let err = registry.create_worktree("bad id", "name", "main").unwrap_err();
        assert!(matches!(err, OptrError::InvalidTaskId(_)));
    }
}
