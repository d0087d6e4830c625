//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify its JSON output.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, token: Option<&str>, args: &[&str]) -> (String, String, i32) {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_wellness-cli"));
    cmd.env("WELLNESS_DATA_DIR", data_dir)
        .env_remove("WELLNESS_TOKEN")
        .env_remove("RUST_LOG");
    if let Some(token) = token {
        cmd.env("WELLNESS_TOKEN", token);
    }
    let output = cmd.args(args).output().expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, token: Option<&str>, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(data_dir, token, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn issue_token(data_dir: &Path, uid: &str, name: &str) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, None, &["auth", "issue", uid, "--name", name]);
    assert_eq!(code, 0, "token issue failed: {stderr}");
    stdout.trim().to_string()
}

#[test]
fn test_auth_verify_and_me() {
    let dir = tempfile::tempdir().unwrap();
    let token = issue_token(dir.path(), "student-1", "Ada");

    let user = run_json(dir.path(), Some(&token), &["auth", "verify"]);
    assert_eq!(user["uid"], "student-1");
    assert_eq!(user["display_name"], "Ada");
    assert!(user["created_at"].is_string());

    let me = run_json(dir.path(), Some(&token), &["auth", "me"]);
    assert_eq!(me["uid"], "student-1");
}

#[test]
fn test_missing_token_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), None, &["habit", "streak", "water"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Bearer token required"), "stderr: {stderr}");
}

#[test]
fn test_tampered_token_fails() {
    let dir = tempfile::tempdir().unwrap();
    let token = issue_token(dir.path(), "student-1", "Ada");
    let tampered = format!("{token}00");
    let (_, stderr, code) = run_cli(dir.path(), Some(&tampered), &["auth", "me"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid token"), "stderr: {stderr}");
}

#[test]
fn test_habit_log_and_streak() {
    let dir = tempfile::tempdir().unwrap();
    let token = issue_token(dir.path(), "student-1", "Ada");

    let log = run_json(dir.path(), Some(&token), &["habit", "log", "water", "3"]);
    assert_eq!(log["habit_type"], "water");
    assert_eq!(log["unit"], "glasses");

    let streak = run_json(dir.path(), Some(&token), &["habit", "streak", "water"]);
    assert_eq!(streak["current_streak"], 1);
    assert_eq!(streak["best_streak"], 1);

    let logs = run_json(dir.path(), Some(&token), &["habit", "logs", "--habit", "water"]);
    assert_eq!(logs["total_count"], 1);
    assert_eq!(logs["days_requested"], 7);

    let summary = run_json(dir.path(), Some(&token), &["habit", "summary"]);
    assert_eq!(summary["summary"]["water"]["total_entries"], 1);
    assert_eq!(summary["summary"]["sleep"]["total_entries"], 0);
}

#[test]
fn test_habit_log_rejects_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let token = issue_token(dir.path(), "student-1", "Ada");

    let (_, _, code) = run_cli(dir.path(), Some(&token), &["habit", "log", "water", "--", "-1"]);
    assert_eq!(code, 1);

    let (_, _, code) = run_cli(dir.path(), Some(&token), &["habit", "log", "meditation", "1"]);
    assert_ne!(code, 0);

    let (_, _, code) = run_cli(dir.path(), Some(&token), &["habit", "logs", "--days", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_group_flow() {
    let dir = tempfile::tempdir().unwrap();
    let owner = issue_token(dir.path(), "owner", "Olive");
    let member = issue_token(dir.path(), "member", "Max");
    run_json(dir.path(), Some(&owner), &["auth", "verify"]);
    run_json(dir.path(), Some(&member), &["auth", "verify"]);

    let group = run_json(dir.path(), Some(&owner), &["group", "create", "Night Owls"]);
    let group_id = group["id"].as_str().unwrap().to_string();
    let code = group["join_code"].as_str().unwrap().to_lowercase();
    assert_eq!(group["member_count"], 1);

    let joined = run_json(dir.path(), Some(&member), &["group", "join", &code]);
    assert_eq!(joined["id"], group_id.as_str());

    run_json(dir.path(), Some(&member), &["habit", "log", "study", "2"]);

    let board = run_json(dir.path(), Some(&owner), &["group", "leaderboard", &group_id]);
    assert_eq!(board["total_members"], 2);
    assert_eq!(board["entries"][0]["user_id"], "member");
    assert_eq!(board["entries"][0]["consistency_score"], 14.3);
    assert_eq!(board["entries"][1]["consistency_score"], 0.0);

    let mine = run_json(dir.path(), Some(&member), &["group", "list"]);
    assert_eq!(mine["total_count"], 1);
    assert_eq!(mine["groups"][0]["my_role"], "member");
}

#[test]
fn test_leaderboard_requires_membership() {
    let dir = tempfile::tempdir().unwrap();
    let owner = issue_token(dir.path(), "owner", "Olive");
    let outsider = issue_token(dir.path(), "outsider", "Oscar");

    let group = run_json(dir.path(), Some(&owner), &["group", "create", "Closed"]);
    let group_id = group["id"].as_str().unwrap();

    let (_, stderr, code) = run_cli(dir.path(), Some(&outsider), &["group", "leaderboard", group_id]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not a member"), "stderr: {stderr}");
}

#[test]
fn test_summary_days_default_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let token = issue_token(dir.path(), "student-1", "Ada");

    let summary = run_json(dir.path(), Some(&token), &["habit", "summary"]);
    assert_eq!(summary["days_covered"], 7);

    let (_, _, code) = run_cli(dir.path(), None, &["config", "set", "logs.default_days", "3"]);
    assert_eq!(code, 0);
    let summary = run_json(dir.path(), Some(&token), &["habit", "summary"]);
    assert_eq!(summary["days_covered"], 3);

    let summary = run_json(dir.path(), Some(&token), &["habit", "summary", "--days", "14"]);
    assert_eq!(summary["days_covered"], 14);
}

#[test]
fn test_database_closed_after_command() {
    let dir = tempfile::tempdir().unwrap();
    let token = issue_token(dir.path(), "student-1", "Ada");
    run_json(dir.path(), Some(&token), &["habit", "log", "sleep", "8"]);

    assert!(dir.path().join("wellness.db").exists());
    assert!(!dir.path().join("wellness.db-journal").exists());
    assert!(!dir.path().join("wellness.db-wal").exists());

    let logs = run_json(dir.path(), Some(&token), &["habit", "logs"]);
    assert_eq!(logs["total_count"], 1);
}

#[test]
fn test_config_set_rejects_huge_window() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) =
        run_cli(dir.path(), None, &["config", "set", "streak.lookback_days", "4000000000"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("streak.lookback_days"), "stderr: {stderr}");

    let (stdout, _, _) = run_cli(dir.path(), None, &["config", "get", "streak.lookback_days"]);
    assert_eq!(stdout.trim(), "60");
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(dir.path(), None, &["config", "get", "logs.max_days"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "365");

    let (_, _, code) = run_cli(dir.path(), None, &["config", "set", "logs.max_days", "30"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), None, &["config", "get", "logs.max_days"]);
    assert_eq!(stdout.trim(), "30");

    let (_, _, code) = run_cli(dir.path(), None, &["config", "get", "nope"]);
    assert_eq!(code, 1);

    let (_, _, code) = run_cli(dir.path(), None, &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), None, &["config", "get", "logs.max_days"]);
    assert_eq!(stdout.trim(), "365");
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), None, &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("wellness-cli"));
}
