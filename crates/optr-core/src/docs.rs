//! Documentation sync: keeps PLAN.md, README.md, and the plugin manifest
//! in step after task completion.
//!
//! Each updater rewrites an existing file in place (atomically) and reports
//! whether it changed anything; files that do not exist are skipped rather
//! than treated as errors.

use crate::error::Result;
use crate::io::atomic_write;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

pub const PLAN_MD: &str = "PLAN.md";
pub const README_MD: &str = "README.md";
pub const PLUGIN_MANIFEST: &str = ".claude-plugin/plugin.json";

const DONE_MARK: &str = "✅";

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Updated,
    Unchanged,
    Missing,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSync {
    pub file: String,
    pub status: SyncStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub files: Vec<FileSync>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run every updater against `root`. `changes` feeds the README changelog;
/// an empty list leaves the README alone.
pub fn sync_docs(root: &Path, changes: &[String], now: DateTime<Utc>) -> Result<SyncReport> {
    let files = vec![
        FileSync {
            file: PLAN_MD.to_string(),
            status: update_plan(&root.join(PLAN_MD), now)?,
        },
        FileSync {
            file: README_MD.to_string(),
            status: update_readme(&root.join(README_MD), changes, now)?,
        },
        FileSync {
            file: PLUGIN_MANIFEST.to_string(),
            status: bump_plugin_version(&root.join(PLUGIN_MANIFEST))?,
        },
    ];
    Ok(SyncReport { files })
}

// ---------------------------------------------------------------------------
// PLAN.md
// ---------------------------------------------------------------------------

static DONE_LINE_RE: OnceLock<Regex> = OnceLock::new();
static LAST_UPDATED_RE: OnceLock<Regex> = OnceLock::new();
static TITLE_RE: OnceLock<Regex> = OnceLock::new();

fn done_line_re() -> &'static Regex {
    DONE_LINE_RE.get_or_init(|| Regex::new(r"(?m)^(\s*- \[x\].*)$").unwrap())
}

fn last_updated_re() -> &'static Regex {
    LAST_UPDATED_RE.get_or_init(|| Regex::new(r"(?m)^(_?)Last Updated:.*$").unwrap())
}

fn title_re() -> &'static Regex {
    TITLE_RE.get_or_init(|| Regex::new(r"(?m)^# .+$").unwrap())
}

/// Mark completed tasks and refresh the `Last Updated:` line (inserted
/// after the title when absent).
fn update_plan(path: &Path, now: DateTime<Utc>) -> Result<SyncStatus> {
    if !path.exists() {
        return Ok(SyncStatus::Missing);
    }
    let original = std::fs::read_to_string(path)?;

    let mut content = done_line_re()
        .replace_all(&original, |caps: &regex::Captures| {
            let line = &caps[1];
            if line.contains(DONE_MARK) {
                line.to_string()
            } else {
                format!("{line} {DONE_MARK}")
            }
        })
        .into_owned();

    let stamp = now.format("%Y-%m-%d %H:%M").to_string();
    if last_updated_re().is_match(&content) {
        content = last_updated_re()
            .replace(&content, format!("${{1}}Last Updated: {stamp}"))
            .into_owned();
    } else if let Some(title) = title_re().find(&content) {
        let insert_at = title.end();
        content.insert_str(insert_at, &format!("\n\n_Last Updated: {stamp}_"));
    }

    write_if_changed(path, &original, &content)
}

// ---------------------------------------------------------------------------
// README.md
// ---------------------------------------------------------------------------

/// Insert a dated changelog entry; creates the `## Changelog` section at
/// the end of the file when it does not exist yet.
fn update_readme(path: &Path, changes: &[String], now: DateTime<Utc>) -> Result<SyncStatus> {
    if !path.exists() {
        return Ok(SyncStatus::Missing);
    }
    if changes.is_empty() {
        return Ok(SyncStatus::Unchanged);
    }
    let original = std::fs::read_to_string(path)?;

    let mut entry = format!("### {}\n\n", now.format("%Y-%m-%d"));
    for change in changes {
        entry.push_str(&format!("- {change}\n"));
    }

    let content = if let Some(pos) = original.find("## Changelog") {
        // Insert right after the heading line.
        let after_heading = original[pos..]
            .find('\n')
            .map(|i| pos + i + 1)
            .unwrap_or(original.len());
        let mut updated = String::with_capacity(original.len() + entry.len() + 2);
        updated.push_str(&original[..after_heading]);
        updated.push('\n');
        updated.push_str(&entry);
        updated.push_str(&original[after_heading..]);
        updated
    } else {
        let sep = if original.ends_with('\n') { "\n" } else { "\n\n" };
        format!("{original}{sep}## Changelog\n\n{entry}")
    };

    write_if_changed(path, &original, &content)
}

// ---------------------------------------------------------------------------
// Plugin manifest
// ---------------------------------------------------------------------------

/// Bump the patch component of the manifest's `version`. Versions that are
/// not `major.minor.patch` are left alone.
fn bump_plugin_version(path: &Path) -> Result<SyncStatus> {
    if !path.exists() {
        return Ok(SyncStatus::Missing);
    }
    let original = std::fs::read_to_string(path)?;
    let mut manifest: serde_json::Value = serde_json::from_str(&original)?;

    let Some(version) = manifest.get("version").and_then(|v| v.as_str()) else {
        return Ok(SyncStatus::Unchanged);
    };
    let parts: Vec<&str> = version.split('.').collect();
    let [major, minor, patch] = parts.as_slice() else {
        return Ok(SyncStatus::Unchanged);
    };
    let Ok(patch) = patch.parse::<u64>() else {
        return Ok(SyncStatus::Unchanged);
    };

    let bumped = format!("{major}.{minor}.{}", patch + 1);
    manifest["version"] = serde_json::Value::String(bumped);

    let mut data = serde_json::to_vec_pretty(&manifest)?;
    data.push(b'\n');
    atomic_write(path, &data)?;
    Ok(SyncStatus::Updated)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_if_changed(path: &Path, original: &str, updated: &str) -> Result<SyncStatus> {
    if updated == original {
        return Ok(SyncStatus::Unchanged);
    }
    atomic_write(path, updated.as_bytes())?;
    Ok(SyncStatus::Updated)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
