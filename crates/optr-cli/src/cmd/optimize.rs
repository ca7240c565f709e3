use crate::cmd::read_plan;
use crate::output::print_json;
use optr_core::plan::review_plan;
use std::path::Path;

pub fn run(root: &Path, plan_file: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let plan = read_plan(root, plan_file)?;
    let review = review_plan(&plan);

    if json {
        return print_json(&review);
    }

    println!("Total tasks found: {}", review.total_tasks);
    println!("Optimization suggestions: {}", review.suggestions.len());
    println!();

    if review.suggestions.is_empty() {
        println!("No issues found. The plan looks well-structured.");
        return Ok(());
    }

    for suggestion in &review.suggestions {
        println!("Line {}: {}", suggestion.line, suggestion.message);
        println!("  Task: \"{}\"", suggestion.task);
    }
    Ok(())
}
