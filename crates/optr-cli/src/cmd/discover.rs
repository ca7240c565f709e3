use crate::cmd::read_plan;
use crate::output::{print_json, print_table};
use optr_core::discover;
use std::path::Path;

pub fn run(root: &Path, plan_file: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let plan = read_plan(root, plan_file)?;
    let report = discover::discover(root, &plan);

    if json {
        return print_json(&report);
    }

    println!("Project tools:");
    println!("  Skills: {}", report.project.skills);
    println!("  Agents: {}", report.project.agents);
    println!("  Commands: {}", report.project.commands);
    println!("Global tools:");
    println!("  Skills: {}", report.global.skills);
    println!("  Agents: {}", report.global.agents);
    println!("  Commands: {}", report.global.commands);
    println!("Plan keywords: {}", report.keywords.join(", "));
    println!();

    if report.matches.is_empty() {
        println!("No matching tools found.");
        return Ok(());
    }

    println!("Recommended tools:");
    let rows: Vec<Vec<String>> = report
        .matches
        .iter()
        .take(10)
        .map(|t| {
            let description = if t.description.len() > 60 {
                format!("{}...", &t.description[..57])
            } else {
                t.description.clone()
            };
            vec![
                t.kind.to_string(),
                t.name.clone(),
                t.source.to_string(),
                t.score.to_string(),
                description,
            ]
        })
        .collect();
    print_table(&["KIND", "NAME", "SOURCE", "SCORE", "DESCRIPTION"], rows);
    Ok(())
}
