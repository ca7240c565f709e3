use crate::output::print_json;
use anyhow::Context;
use optr_core::plan::analyze_plan_complexity;
use std::path::Path;

/// Returns whether isolation was recommended so the caller can map it to
/// the process exit code.
pub fn run(plan_file: &Path, json: bool) -> anyhow::Result<bool> {
    let content = std::fs::read_to_string(plan_file)
        .with_context(|| format!("failed to read plan file {}", plan_file.display()))?;
    let result = analyze_plan_complexity(&content);

    if json {
        print_json(&result)?;
        return Ok(result.recommend_worktree);
    }

    println!("Worktree analysis for {}", plan_file.display());
    println!("Task count: {}", result.task_count);
    println!("Has modules: {}", result.has_modules);
    println!("Has parallel work: {}", result.has_parallel_work);
    if result.recommend_worktree {
        println!("Recommendation: ENABLE worktree support");
        println!("Reason: {}", result.reason);
    } else {
        println!("Recommendation: single worktree is sufficient");
    }

    Ok(result.recommend_worktree)
}
