pub mod analyze;
pub mod cleanup;
pub mod create;
pub mod discover;
pub mod list;
pub mod match_plugins;
pub mod optimize;
pub mod remove;
pub mod should_use;
pub mod sync_docs;

use anyhow::Context;
use optr_core::config::RegistryConfig;
use optr_core::registry::WorktreeRegistry;
use std::path::Path;

pub(crate) fn open_registry(root: &Path, state_file: &str) -> anyhow::Result<WorktreeRegistry> {
    let config = RegistryConfig::new(root).with_state_file(state_file);
    WorktreeRegistry::open(config).context("failed to open worktree registry")
}

/// Read the plan file, defaulting to `PLAN.md` in the repository root.
pub(crate) fn read_plan(root: &Path, plan_file: Option<&Path>) -> anyhow::Result<String> {
    let path = match plan_file {
        Some(p) => p.to_path_buf(),
        None => root.join("PLAN.md"),
    };
    std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read plan file {}", path.display()))
}
