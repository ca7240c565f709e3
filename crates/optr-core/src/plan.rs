//! Plan-document heuristics: complexity analysis and structural critique.
//!
//! Everything here is pure text processing — no state, no failures.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Complexity analysis
// ---------------------------------------------------------------------------

const MODULE_KEYWORDS: [&str; 5] = ["module", "component", "service", "frontend", "backend"];
const PARALLEL_KEYWORDS: [&str; 3] = ["parallel", "concurrent", "simultaneous"];

#[derive(Debug, Clone, Serialize)]
pub struct PlanComplexity {
    pub task_count: usize,
    pub has_modules: bool,
    pub has_parallel_work: bool,
    pub recommend_worktree: bool,
    pub reason: String,
}

struct PlanSignals {
    task_count: usize,
    has_modules: bool,
    has_parallel_work: bool,
}

/// Ordered recommendation rules; the first applicable rule supplies the
/// reported reason, so parallel-work wins the explanation even when a count
/// threshold also holds.
struct RecommendationRule {
    applies: fn(&PlanSignals) -> bool,
    reason: fn(&PlanSignals) -> String,
}

fn recommendation_rules() -> Vec<RecommendationRule> {
    vec![
        RecommendationRule {
            applies: |s| s.has_parallel_work,
            reason: |_| "plan contains parallel/concurrent work indicators".to_string(),
        },
        RecommendationRule {
            applies: |s| s.task_count >= 8,
            reason: |s| format!("high task count ({} tasks)", s.task_count),
        },
        RecommendationRule {
            applies: |s| s.task_count >= 5 && s.has_modules,
            reason: |s| {
                format!(
                    "moderate task count ({}) with multiple modules",
                    s.task_count
                )
            },
        },
    ]
}

/// Analyze a plan document to determine whether worktree isolation is
/// worth recommending. Never fails.
pub fn analyze_plan_complexity(plan: &str) -> PlanComplexity {
    let task_count = plan
        .lines()
        .filter(|line| line.trim_start().starts_with("- [ ]"))
        .count();

    let lower = plan.to_lowercase();
    let has_modules = MODULE_KEYWORDS.iter().any(|kw| lower.contains(kw));
    let has_parallel_work = PARALLEL_KEYWORDS.iter().any(|kw| lower.contains(kw));

    let signals = PlanSignals {
        task_count,
        has_modules,
        has_parallel_work,
    };

    for rule in recommendation_rules() {
        if (rule.applies)(&signals) {
            return PlanComplexity {
                task_count,
                has_modules,
                has_parallel_work,
                recommend_worktree: true,
                reason: (rule.reason)(&signals),
            };
        }
    }

    PlanComplexity {
        task_count,
        has_modules,
        has_parallel_work,
        recommend_worktree: false,
        reason: "single worktree is sufficient".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Structural critique
// ---------------------------------------------------------------------------

const VAGUE_WORDS: [&str; 6] = ["fix", "add", "update", "stuff", "things", "etc"];
const CRITERIA_WORDS: [&str; 4] = ["acceptance", "criteria", "verify", "test"];
const LARGE_TASK_WORDS: usize = 20;
const CRITERIA_CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct PlanTask {
    /// 1-based line number in the plan document.
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionKind {
    Vague,
    TooLarge,
    MissingCriteria,
}

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub line: usize,
    pub task: String,
    pub kind: SuggestionKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanReview {
    pub total_tasks: usize,
    pub suggestions: Vec<Suggestion>,
}

/// Pull task bullets (`- [ ]`, `- [x]`, or plain `- `) with line numbers.
pub fn extract_tasks(plan: &str) -> Vec<PlanTask> {
    let mut tasks = Vec::new();
    for (i, line) in plan.lines().enumerate() {
        let stripped = line.trim();
        let text = if let Some(rest) = stripped.strip_prefix("- [ ]") {
            rest.trim()
        } else if let Some(rest) = stripped.strip_prefix("- [x]") {
            rest.trim()
        } else if let Some(rest) = stripped.strip_prefix("- ") {
            rest.trim()
        } else {
            continue;
        };
        if !text.is_empty() {
            tasks.push(PlanTask {
                line: i + 1,
                text: text.to_string(),
            });
        }
    }
    tasks
}

/// Critique a plan's tasks for actionability. Never fails.
pub fn review_plan(plan: &str) -> PlanReview {
    let lines: Vec<&str> = plan.lines().collect();
    let tasks = extract_tasks(plan);
    let mut suggestions = Vec::new();

    for task in &tasks {
        if task
            .text
            .to_lowercase()
            .split_whitespace()
            .any(|w| VAGUE_WORDS.contains(&w))
        {
            suggestions.push(Suggestion {
                line: task.line,
                task: task.text.clone(),
                kind: SuggestionKind::Vague,
                message: "task description is vague; be more specific about what needs to be done"
                    .to_string(),
            });
        }

        if task.text.split_whitespace().count() > LARGE_TASK_WORDS {
            suggestions.push(Suggestion {
                line: task.line,
                task: task.text.clone(),
                kind: SuggestionKind::TooLarge,
                message: "task might be too large; consider breaking it into smaller subtasks"
                    .to_string(),
            });
        }

        if !has_nearby_criteria(&lines, task.line) {
            suggestions.push(Suggestion {
                line: task.line,
                task: task.text.clone(),
                kind: SuggestionKind::MissingCriteria,
                message: "task lacks acceptance criteria; add what \"done\" looks like"
                    .to_string(),
            });
        }
    }

    PlanReview {
        total_tasks: tasks.len(),
        suggestions,
    }
}

/// Whether any acceptance-criteria keyword appears within a few lines of
/// the task (1-based `line`).
fn has_nearby_criteria(lines: &[&str], line: usize) -> bool {
    let start = line.saturating_sub(CRITERIA_CONTEXT_LINES + 1);
    let end = (line + CRITERIA_CONTEXT_LINES).min(lines.len());
    lines[start..end].iter().any(|l| {
        let lower = l.to_lowercase();
        CRITERIA_WORDS.iter().any(|w| lower.contains(w))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
