//! Marketplace matching glue.
//!
//! The marketplace is reached only through the `claude` CLI as an opaque
//! subprocess; its protocol is not this crate's concern. Enumeration
//! degrades to an empty list on any failure, and matching is a local
//! keyword-overlap score against the plan.

use crate::discover::extract_keywords;
use crate::subprocess::run_with_timeout;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on the marketplace listing subprocess.
pub const LIST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    #[serde(default, alias = "summary")]
    pub description: Option<String>,
    #[serde(default, alias = "repo")]
    pub repository: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginMatch {
    #[serde(flatten)]
    pub plugin: PluginInfo,
    pub relevance_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_cmd: Option<String>,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Available marketplace plugins, via `claude plugin list --available
/// --json`. Missing binary, nonzero exit, timeout, or unparsable output all
/// degrade to an empty list.
pub fn available_plugins() -> Vec<PluginInfo> {
    list_via("claude")
}

fn list_via(program: &str) -> Vec<PluginInfo> {
    let out = match run_with_timeout(
        "plugin list",
        program,
        &["plugin", "list", "--available", "--json"],
        None,
        LIST_TIMEOUT,
    ) {
        Ok(out) if out.success => out,
        _ => return Vec::new(),
    };
    parse_plugin_list(&out.stdout)
}

fn parse_plugin_list(stdout: &str) -> Vec<PluginInfo> {
    serde_json::from_str(stdout).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Score plugins against the plan's keyword set by overlap fraction
/// (matched keywords / total keywords), filter by `threshold`, and sort by
/// score descending. Plugins with a repository get an install command.
pub fn match_plugins(plan: &str, plugins: Vec<PluginInfo>, threshold: f64) -> Vec<PluginMatch> {
    let keywords = extract_keywords(plan);
    let mut matches: Vec<PluginMatch> = plugins
        .into_iter()
        .filter_map(|plugin| {
            let score = relevance(&plugin, &keywords);
            if score < threshold {
                return None;
            }
            let install_cmd = plugin
                .repository
                .as_ref()
                .map(|repo| format!("claude plugin add {repo}"));
            Some(PluginMatch {
                plugin,
                relevance_score: score,
                install_cmd,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.plugin.name.cmp(&b.plugin.name))
    });
    matches
}

fn relevance(plugin: &PluginInfo, keywords: &[String]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let haystack = format!(
        "{} {}",
        plugin.name,
        plugin.description.as_deref().unwrap_or_default()
    )
    .to_lowercase();
    let matched = keywords.iter().filter(|kw| haystack.contains(*kw)).count();
    matched as f64 / keywords.len() as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
