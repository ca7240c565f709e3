//! Discovery of locally installed automation tools (skills, agents,
//! commands) and ranking against a plan's keyword profile.
//!
//! Two sources are scanned: the project tree itself and the user's global
//! plugin directory. Remote marketplace lookup lives in `marketplace`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Skill,
    Agent,
    Command,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolKind::Skill => write!(f, "skill"),
            ToolKind::Agent => write!(f, "agent"),
            ToolKind::Command => write!(f, "command"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolSource {
    Project,
    Global,
}

impl ToolSource {
    /// Base relevance weight: project-local tools outrank global ones.
    fn weight(self) -> u32 {
        match self {
            ToolSource::Project => 10,
            ToolSource::Global => 5,
        }
    }
}

impl fmt::Display for ToolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolSource::Project => write!(f, "project"),
            ToolSource::Global => write!(f, "global"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub kind: ToolKind,
    pub name: String,
    pub description: String,
    pub path: String,
    pub source: ToolSource,
    pub score: u32,
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

const PROJECT_SKILL_DIRS: [&str; 2] = [".claude/skills", "skills"];
const PROJECT_AGENT_DIRS: [&str; 2] = [".claude/agents", "agents"];
const PROJECT_COMMAND_DIRS: [&str; 2] = [".claude/commands", "commands"];

/// Scan the project tree for tool definition files.
pub fn scan_project_tools(root: &Path) -> Vec<ToolInfo> {
    let mut tools = Vec::new();

    for dir in PROJECT_SKILL_DIRS {
        for path in markdown_files(&root.join(dir)) {
            if path.file_name().is_some_and(|n| n == "SKILL.md") {
                tools.extend(parse_skill_file(&path, ToolSource::Project));
            }
        }
    }
    for dir in PROJECT_AGENT_DIRS {
        for path in markdown_files(&root.join(dir)) {
            if path.file_name().is_some_and(|n| n == "SKILL.md") {
                continue;
            }
            tools.extend(parse_description_tool(&path, ToolKind::Agent, ToolSource::Project));
        }
    }
    for dir in PROJECT_COMMAND_DIRS {
        for path in markdown_files(&root.join(dir)) {
            if path.file_name().is_some_and(|n| n == "SKILL.md") {
                continue;
            }
            tools.extend(parse_description_tool(&path, ToolKind::Command, ToolSource::Project));
        }
    }

    tools
}

/// Scan the user's global plugin directory (`~/.claude/plugins`).
pub fn scan_global_tools() -> Vec<ToolInfo> {
    match home::home_dir() {
        Some(home) => scan_plugins_dir(&home.join(".claude").join("plugins")),
        None => Vec::new(),
    }
}

/// Scan a plugins directory: `SKILL.md` files are skills, `*-agent.md`
/// agents, `*-command.md` commands.
pub fn scan_plugins_dir(dir: &Path) -> Vec<ToolInfo> {
    let mut tools = Vec::new();
    for path in markdown_files(dir) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name == "SKILL.md" {
            tools.extend(parse_skill_file(&path, ToolSource::Global));
        } else if name.ends_with("-agent.md") {
            tools.extend(parse_description_tool(&path, ToolKind::Agent, ToolSource::Global));
        } else if name.ends_with("-command.md") {
            tools.extend(parse_description_tool(&path, ToolKind::Command, ToolSource::Global));
        }
    }
    tools
}

fn markdown_files(dir: &Path) -> Vec<std::path::PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
        .collect()
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SkillMeta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Extract the YAML content between the first pair of `---` delimiters.
fn extract_frontmatter(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---")?;
    let rest = rest
        .strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))?;
    let end = rest.find("\n---")?;
    Some(&rest[..end])
}

/// A skill is described by its SKILL.md frontmatter; no description means
/// the file is not a usable tool definition.
fn parse_skill_file(path: &Path, source: ToolSource) -> Option<ToolInfo> {
    let content = std::fs::read_to_string(path).ok()?;
    let meta: SkillMeta = serde_yaml::from_str(extract_frontmatter(&content)?).ok()?;
    let description = meta.description.filter(|d| !d.is_empty())?;
    Some(ToolInfo {
        kind: ToolKind::Skill,
        name: meta.name.unwrap_or_else(|| "unknown".to_string()),
        description,
        path: path.to_string_lossy().into_owned(),
        source,
        score: 0,
    })
}

/// Agents and commands are plain markdown: the file stem is the name, the
/// first non-empty non-heading line the description.
fn parse_description_tool(path: &Path, kind: ToolKind, source: ToolSource) -> Option<ToolInfo> {
    let content = std::fs::read_to_string(path).ok()?;
    let description = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))?
        .to_string();
    Some(ToolInfo {
        kind,
        name: path.file_stem()?.to_string_lossy().into_owned(),
        description,
        path: path.to_string_lossy().into_owned(),
        source,
        score: 0,
    })
}

// ---------------------------------------------------------------------------
// Keywords and ranking
// ---------------------------------------------------------------------------

const KEYWORD_TERMS: [&str; 16] = [
    "skill",
    "plugin",
    "agent",
    "command",
    "hook",
    "frontend",
    "backend",
    "ui",
    "interface",
    "api",
    "database",
    "test",
    "review",
    "claude.md",
    "documentation",
    "deploy",
];
const KEYWORD_VERBS: [&str; 6] = ["create", "build", "implement", "design", "add", "update"];

/// Extract the fixed-vocabulary keywords present in a plan, lowercased.
pub fn extract_keywords(plan: &str) -> Vec<String> {
    let lower = plan.to_lowercase();
    KEYWORD_TERMS
        .iter()
        .chain(KEYWORD_VERBS.iter())
        .filter(|kw| lower.contains(*kw))
        .map(|kw| kw.to_string())
        .collect()
}

/// Score, dedupe, and order tools: source weight plus one point per plan
/// keyword found in the tool's name or description. Duplicates (same kind
/// and name) keep the highest-scored occurrence.
pub fn rank_tools(tools: Vec<ToolInfo>, keywords: &[String]) -> Vec<ToolInfo> {
    let mut scored: Vec<ToolInfo> = tools
        .into_iter()
        .map(|mut tool| {
            let haystack = format!("{} {}", tool.name, tool.description).to_lowercase();
            let overlap = keywords.iter().filter(|kw| haystack.contains(*kw)).count() as u32;
            tool.score = tool.source.weight() + overlap;
            tool
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut seen = std::collections::HashSet::new();
    scored.retain(|t| seen.insert((t.kind, t.name.to_lowercase())));
    scored
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize)]
pub struct SourceCounts {
    pub skills: usize,
    pub agents: usize,
    pub commands: usize,
}

fn count_by_kind(tools: &[ToolInfo], source: ToolSource) -> SourceCounts {
    let mut counts = SourceCounts::default();
    for tool in tools.iter().filter(|t| t.source == source) {
        match tool.kind {
            ToolKind::Skill => counts.skills += 1,
            ToolKind::Agent => counts.agents += 1,
            ToolKind::Command => counts.commands += 1,
        }
    }
    counts
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub project: SourceCounts,
    pub global: SourceCounts,
    pub keywords: Vec<String>,
    pub matches: Vec<ToolInfo>,
}

/// Full discovery pass: scan both sources and rank against the plan.
pub fn discover(root: &Path, plan: &str) -> DiscoveryReport {
    let mut tools = scan_project_tools(root);
    tools.extend(scan_global_tools());
    report_for(tools, plan)
}

fn report_for(tools: Vec<ToolInfo>, plan: &str) -> DiscoveryReport {
    let keywords = extract_keywords(plan);
    let project = count_by_kind(&tools, ToolSource::Project);
    let global = count_by_kind(&tools, ToolSource::Global);
    let matches = rank_tools(tools, &keywords);
    DiscoveryReport {
        project,
        global,
        keywords,
        matches,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
