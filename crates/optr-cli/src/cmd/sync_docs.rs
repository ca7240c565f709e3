use crate::output::print_json;
use anyhow::Context;
use optr_core::docs::{self, SyncStatus};
use std::path::Path;

pub fn run(root: &Path, changes: &[String], json: bool) -> anyhow::Result<()> {
    let report = docs::sync_docs(root, changes, chrono::Utc::now())
        .context("documentation sync failed")?;

    if json {
        return print_json(&report);
    }

    for file in &report.files {
        match file.status {
            SyncStatus::Updated => println!("Updated {}", file.file),
            SyncStatus::Unchanged => println!("{} already up to date", file.file),
            SyncStatus::Missing => println!("{} not found, skipped", file.file),
        }
    }
    Ok(())
}
