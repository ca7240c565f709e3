//! Thin wrapper over the `git` command line.
//!
//! The registry treats git as ground truth for what exists on disk; this
//! module only shapes argv, enforces the timeout, and parses output. All
//! commands run with the working directory set to the repository root.

use crate::error::{OptrError, Result};
use crate::subprocess::{run_with_timeout, CmdOutput};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// GitRunner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GitRunner {
    repo_root: PathBuf,
    timeout: Duration,
}

impl GitRunner {
    /// Create a runner for `repo_root`. Fails early if no git binary is on
    /// the PATH, so later operations can attribute failures to git itself.
    pub fn new(repo_root: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        which::which("git").map_err(|_| OptrError::GitMissing)?;
        Ok(Self {
            repo_root: repo_root.into(),
            timeout,
        })
    }

    fn run(&self, op: &'static str, args: &[&str]) -> Result<CmdOutput> {
        run_with_timeout(op, "git", args, Some(&self.repo_root), self.timeout)
    }

    /// Whether `branch` already exists. `git branch --list` prints the name
    /// when it does and nothing when it doesn't.
    pub fn branch_exists(&self, branch: &str) -> Result<bool> {
        let out = self.run("branch list", &["branch", "--list", branch])?;
        if !out.success {
            return Err(git_err("branch list", &out));
        }
        Ok(!out.stdout.trim().is_empty())
    }

    /// Create `branch` pointing at `base`.
    pub fn create_branch(&self, branch: &str, base: &str) -> Result<()> {
        let out = self.run("branch create", &["branch", branch, base])?;
        if !out.success {
            return Err(git_err("branch create", &out));
        }
        Ok(())
    }

    /// Materialize a worktree at `path` checked out on `branch`.
    pub fn worktree_add(&self, path: &Path, branch: &str) -> Result<()> {
        let path = path.to_string_lossy();
        let out = self.run("worktree add", &["worktree", "add", &*path, branch])?;
        if !out.success {
            return Err(git_err("worktree add", &out));
        }
        Ok(())
    }

    /// Remove the worktree at `path`, passing `--force` through verbatim.
    pub fn worktree_remove(&self, path: &Path, force: bool) -> Result<()> {
        let path = path.to_string_lossy();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&*path);
        let out = self.run("worktree remove", &args)?;
        if !out.success {
            return Err(git_err("worktree remove", &out));
        }
        Ok(())
    }

    /// Enumerate every worktree git knows about, not just tracked ones.
    /// Degrades to an empty list when the command fails.
    pub fn worktree_list(&self) -> Vec<WorktreeListing> {
        match self.run("worktree list", &["worktree", "list", "--porcelain"]) {
            Ok(out) if out.success => parse_worktree_list(&out.stdout),
            _ => Vec::new(),
        }
    }
}

fn git_err(op: &'static str, out: &CmdOutput) -> OptrError {
    let detail = if out.stderr.trim().is_empty() {
        out.stdout.trim().to_string()
    } else {
        out.stderr.trim().to_string()
    };
    OptrError::Git { op, detail }
}

// ---------------------------------------------------------------------------
// Porcelain parsing
// ---------------------------------------------------------------------------

/// One record from `git worktree list --porcelain`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorktreeListing {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
}

/// Parse the block-structured porcelain format: one record per block,
/// `worktree `/`branch `/`HEAD ` line prefixes, blank line between blocks.
/// Missing fields are tolerated.
pub fn parse_worktree_list(porcelain: &str) -> Vec<WorktreeListing> {
    let mut listings = Vec::new();
    let mut current = WorktreeListing::default();

    for line in porcelain.lines() {
        if line.is_empty() {
            if !current.path.is_empty() {
                listings.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("worktree ") {
            current.path = rest.to_string();
        } else if let Some(rest) = line.strip_prefix("branch ") {
            current.branch = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("HEAD ") {
            current.head = Some(rest.to_string());
        }
    }
    if !current.path.is_empty() {
        listings.push(current);
    }

    listings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
