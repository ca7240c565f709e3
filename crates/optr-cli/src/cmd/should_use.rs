use crate::cmd::open_registry;
use crate::output::print_json;
use anyhow::Context;
use optr_core::isolation::TaskDescriptor;
use std::path::Path;

pub fn run(root: &Path, state_file: &str, task_json: &str, json: bool) -> anyhow::Result<()> {
    let task: TaskDescriptor =
        serde_json::from_str(task_json).context("invalid task descriptor JSON")?;

    let registry = open_registry(root, state_file)?;
    let decision = registry.should_use_worktree(&task);

    if json {
        return print_json(&decision);
    }

    // Bare true/false on stdout keeps the output script-friendly.
    println!("{}", decision.isolate);
    if decision.isolate {
        eprintln!("reason: {}", decision.reason);
    }
    Ok(())
}
