use crate::cmd::open_registry;
use crate::output::print_json;
use anyhow::Context;
use std::path::Path;

pub fn run(
    root: &Path,
    state_file: &str,
    task_id: &str,
    task_name: &str,
    base_branch: &str,
    json: bool,
) -> anyhow::Result<()> {
    let mut registry = open_registry(root, state_file)?;
    let assignment = registry
        .create_worktree(task_id, task_name, base_branch)
        .with_context(|| format!("failed to create worktree for task '{task_id}'"))?;

    if json {
        return print_json(&assignment);
    }

    println!("Created worktree for task '{task_name}':");
    println!("  Path: {}", assignment.path);
    println!("  Branch: {}", assignment.branch);
    println!();
    println!("Use this path when assigning the task:");
    println!("  cd {}", assignment.path);
    Ok(())
}
