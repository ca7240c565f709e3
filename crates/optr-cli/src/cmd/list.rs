use crate::cmd::open_registry;
use crate::output::print_json;
use std::path::Path;

pub fn run(root: &Path, state_file: &str, json: bool) -> anyhow::Result<()> {
    let registry = open_registry(root, state_file)?;
    let worktrees = registry.list_worktrees();

    if json {
        return print_json(&worktrees);
    }

    println!("Found {} worktree(s):", worktrees.len());
    for wt in &worktrees {
        let marker = if Path::new(&wt.path) == root {
            " (main)"
        } else {
            ""
        };
        let branch = wt.branch.as_deref().unwrap_or("detached");
        println!("  - {}{} [{}]", wt.path, marker, branch);
    }
    Ok(())
}
