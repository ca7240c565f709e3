use crate::cmd::open_registry;
use crate::output::print_json;
use anyhow::Context;
use std::path::Path;

pub fn run(
    root: &Path,
    state_file: &str,
    task_id: &str,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut registry = open_registry(root, state_file)?;
    registry
        .remove_worktree(task_id, force)
        .with_context(|| format!("failed to remove worktree for task '{task_id}'"))?;

    if json {
        return print_json(&serde_json::json!({ "removed": task_id }));
    }
    println!("Removed worktree for task {task_id}");
    Ok(())
}
