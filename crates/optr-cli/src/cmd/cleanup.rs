use crate::cmd::open_registry;
use crate::output::print_json;
use std::path::Path;
use tracing::warn;

pub fn run(root: &Path, state_file: &str, force: bool, json: bool) -> anyhow::Result<()> {
    let mut registry = open_registry(root, state_file)?;
    let removed = registry.cleanup_all(force);
    let remaining = registry.assignments().len();

    if remaining > 0 {
        warn!("{remaining} worktree(s) could not be removed and remain tracked");
    }

    if json {
        return print_json(&serde_json::json!({
            "removed": removed,
            "remaining": remaining,
        }));
    }
    println!("Cleaned up {removed} worktree(s)");
    Ok(())
}
