#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn optr(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("optr").unwrap();
    cmd.current_dir(dir.path()).env("OPTR_ROOT", dir.path());
    cmd
}

fn init_repo(dir: &TempDir) {
    for args in [
        vec!["init", "-b", "main"],
        vec!["config", "user.email", "test@test.com"],
        vec!["config", "user.name", "Test"],
        vec!["commit", "--allow-empty", "-m", "initial"],
    ] {
        let out = std::process::Command::new("git")
            .args(&args)
            .current_dir(dir.path())
            .output()
            .unwrap();
        assert!(out.status.success(), "git {args:?} failed");
    }
}

// ---------------------------------------------------------------------------
// optr create / list / remove / cleanup
// ---------------------------------------------------------------------------

#[test]
fn create_tracks_worktree_and_writes_state() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    optr(&dir)
        .args(["create", "t1", "Build backend"])
        .assert()
        .success()
        .stdout(predicate::str::contains("optr/task-t1"));

    let state = std::fs::read_to_string(dir.path().join(".optr-worktrees.json")).unwrap();
    assert!(state.contains("optr/task-t1"));
    assert!(state.contains(".optr-worktree-t1"));
    assert!(dir.path().join(".optr-worktree-t1").is_dir());
}

#[test]
fn create_duplicate_task_fails() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    optr(&dir).args(["create", "t1", "one"]).assert().success();
    optr(&dir)
        .args(["create", "t1", "one again"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already has a worktree"));
}

#[test]
fn create_json_output_is_the_assignment() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    let output = optr(&dir)
        .args(["--json", "create", "t1", "one"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let assignment: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(assignment["branch"], "optr/task-t1");
    assert_eq!(assignment["created"], true);
}

#[test]
fn list_shows_main_and_task_worktrees() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    optr(&dir).args(["create", "t1", "one"]).assert().success();
    optr(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(".optr-worktree-t1"))
        .stdout(predicate::str::contains("(main)"));
}

#[test]
fn remove_untracks_and_second_remove_fails() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    optr(&dir).args(["create", "t1", "one"]).assert().success();
    optr(&dir)
        .args(["remove", "t1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed worktree for task t1"));
    assert!(!dir.path().join(".optr-worktree-t1").exists());

    optr(&dir)
        .args(["remove", "t1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no worktree tracked"));
}

#[test]
fn remove_unknown_task_fails() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    optr(&dir)
        .args(["remove", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn cleanup_reports_removed_count() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    optr(&dir).args(["create", "t1", "one"]).assert().success();
    optr(&dir).args(["create", "t2", "two"]).assert().success();

    optr(&dir)
        .arg("cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned up 2 worktree(s)"));
    assert!(!dir.path().join(".optr-worktree-t1").exists());
    assert!(!dir.path().join(".optr-worktree-t2").exists());
}

#[test]
fn custom_state_file_is_honored() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    optr(&dir)
        .args(["--state", "custom-state.json", "create", "t1", "one"])
        .assert()
        .success();
    assert!(dir.path().join("custom-state.json").exists());
    assert!(!dir.path().join(".optr-worktrees.json").exists());
}

#[test]
fn corrupt_state_file_fails_fast() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);
    std::fs::write(dir.path().join(".optr-worktrees.json"), "not json {").unwrap();

    optr(&dir)
        .args(["create", "t1", "one"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt"));
}

// ---------------------------------------------------------------------------
// optr analyze
// ---------------------------------------------------------------------------

#[test]
fn analyze_small_plan_exits_zero() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);
    std::fs::write(dir.path().join("PLAN.md"), "- [ ] a\n- [ ] b\n").unwrap();

    optr(&dir)
        .args(["analyze", "PLAN.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("single worktree is sufficient"));
}

#[test]
fn analyze_busy_plan_exits_one() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);
    let plan: String = (0..9).map(|i| format!("- [ ] item {i}\n")).collect();
    std::fs::write(dir.path().join("PLAN.md"), plan).unwrap();

    optr(&dir)
        .args(["analyze", "PLAN.md"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("high task count (9 tasks)"));
}

#[test]
fn analyze_missing_plan_fails() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    optr(&dir)
        .args(["analyze", "missing.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read plan file"));
}

// ---------------------------------------------------------------------------
// optr should-use
// ---------------------------------------------------------------------------

#[test]
fn should_use_honors_explicit_isolation() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    optr(&dir)
        .args(["should-use", "--task", r#"{"id": "t1", "requires_isolation": true}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("true"));
}

#[test]
fn should_use_low_signal_task_is_false() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    optr(&dir)
        .args(["should-use", "--task", r#"{"id": "t1", "estimated_hours": 0.5}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("false"));
}

#[test]
fn should_use_json_output_carries_reason() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    let output = optr(&dir)
        .args([
            "--json",
            "should-use",
            "--task",
            r#"{"id": "t1", "estimated_hours": 3}"#,
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let decision: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(decision["isolate"], true);
    assert_eq!(decision["rule"], "long-running");
}

#[test]
fn should_use_rejects_bad_json() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);

    optr(&dir)
        .args(["should-use", "--task", "not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid task descriptor"));
}

// ---------------------------------------------------------------------------
// optr optimize / discover / sync-docs
// ---------------------------------------------------------------------------

#[test]
fn optimize_flags_vague_tasks() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);
    std::fs::write(dir.path().join("PLAN.md"), "- [ ] fix stuff\n").unwrap();

    optr(&dir)
        .arg("optimize")
        .assert()
        .success()
        .stdout(predicate::str::contains("vague"));
}

#[test]
fn discover_reports_project_tools() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);
    std::fs::write(dir.path().join("PLAN.md"), "Deploy the frontend\n").unwrap();
    let skill_dir = dir.path().join(".claude/skills/deploy");
    std::fs::create_dir_all(&skill_dir).unwrap();
    std::fs::write(
        skill_dir.join("SKILL.md"),
        "---\nname: deploy-helper\ndescription: Deploy the app\n---\n",
    )
    .unwrap();

    optr(&dir)
        .arg("discover")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy-helper"));
}

#[test]
fn sync_docs_stamps_plan() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir);
    std::fs::write(dir.path().join("PLAN.md"), "# Plan\n\n- [x] shipped\n").unwrap();

    optr(&dir)
        .arg("sync-docs")
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated PLAN.md"));

    let content = std::fs::read_to_string(dir.path().join("PLAN.md")).unwrap();
    assert!(content.contains("Last Updated:"));
}
