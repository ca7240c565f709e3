//! Decides whether a task warrants an isolated worktree.
//!
//! The decision is an ordered rule list evaluated top to bottom; the first
//! rule whose predicate holds wins and supplies the reported reason. Rules
//! are pure — no side effects, no state mutation.

use crate::registry::WorktreeAssignment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// TaskDescriptor
// ---------------------------------------------------------------------------

/// Task as described by a planning document. Absent fields mean "no signal".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDescriptor {
    pub id: String,
    pub name: String,
    pub requires_isolation: bool,
    pub estimated_hours: f64,
    pub files: Vec<String>,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

pub struct DecisionContext<'a> {
    pub task: &'a TaskDescriptor,
    pub tracked: &'a BTreeMap<String, WorktreeAssignment>,
}

/// A fn-pointer rule — zero-cost, no heap allocation.
pub struct IsolationRule {
    pub id: &'static str,
    pub applies: fn(&DecisionContext) -> bool,
    pub reason: fn(&DecisionContext) -> String,
}

pub fn isolation_rules() -> Vec<IsolationRule> {
    vec![
        IsolationRule {
            id: "explicit-isolation",
            applies: |ctx| ctx.task.requires_isolation,
            reason: |_| "task explicitly requests isolation".to_string(),
        },
        IsolationRule {
            id: "long-running",
            applies: |ctx| ctx.task.estimated_hours > 1.0,
            reason: |ctx| {
                format!(
                    "estimated at {}h, above the 1h threshold",
                    ctx.task.estimated_hours
                )
            },
        },
        // Only assignments already in the registry are consulted; tasks
        // evaluated in the same batch but not yet created are invisible here.
        IsolationRule {
            id: "file-conflict",
            applies: |ctx| conflicting_task(ctx).is_some(),
            reason: |ctx| {
                let other = conflicting_task(ctx).unwrap_or_default();
                format!("files overlap with task '{other}'")
            },
        },
    ]
}

fn conflicting_task(ctx: &DecisionContext) -> Option<String> {
    if ctx.task.files.is_empty() {
        return None;
    }
    ctx.tracked
        .values()
        .filter(|a| a.task_id != ctx.task.id)
        .find(|a| a.files.iter().any(|f| ctx.task.files.contains(f)))
        .map(|a| a.task_id.clone())
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct IsolationDecision {
    pub isolate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<&'static str>,
    pub reason: String,
}

pub fn decide(
    task: &TaskDescriptor,
    tracked: &BTreeMap<String, WorktreeAssignment>,
) -> IsolationDecision {
    let ctx = DecisionContext { task, tracked };
    for rule in isolation_rules() {
        if (rule.applies)(&ctx) {
            return IsolationDecision {
                isolate: true,
                rule: Some(rule.id),
                reason: (rule.reason)(&ctx),
            };
        }
    }
    IsolationDecision {
        isolate: false,
        rule: None,
        reason: "no isolation signal".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
