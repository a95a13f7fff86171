//! Runs the built `duedraft` binary against a throwaway data directory.

use std::process::{Command, Output};

use tempfile::TempDir;

fn duedraft(data_dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_duedraft"))
        .args(args)
        .env("DUEDRAFT_DATA_DIR", data_dir.path())
        .env_remove("DUEDRAFT_LOG")
        .output()
        .expect("failed to run duedraft")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_deadline_preview_uses_rule_table() {
    let dir = TempDir::new().unwrap();
    let output = duedraft(
        &dir,
        &[
            "deadline",
            "preview",
            "--work-category",
            "메인 디자인",
            "--due-text",
            "2주 전",
            "--event-date",
            "2024-03-10",
            "--json",
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let preview: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(preview["matched_keyword"], "메인");
    assert_eq!(preview["offset_days"], -21);
    assert_eq!(preview["due_date"], "2024-02-18");
    assert_eq!(preview["advisory_offset_days"], -14);
    assert_eq!(preview["advisory_due_date"], "2024-02-25");
}

#[test]
fn test_deadline_preview_without_event_date() {
    let dir = TempDir::new().unwrap();
    let output = duedraft(
        &dir,
        &["deadline", "preview", "--work-category", "기타 작업", "--json"],
    );
    assert!(output.status.success());

    let preview: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(preview["matched_keyword"], serde_json::Value::Null);
    assert_eq!(preview["offset_days"], -7);
    assert_eq!(preview["due_date"], serde_json::Value::Null);
    assert_eq!(preview["advisory_offset_days"], serde_json::Value::Null);
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let set = duedraft(&dir, &["config", "set", "sync.interval_minutes", "15"]);
    assert!(set.status.success());

    let get = duedraft(&dir, &["config", "get", "sync.interval_minutes"]);
    assert_eq!(stdout(&get).trim(), "15");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_rejects_bad_value() {
    let dir = TempDir::new().unwrap();
    let output = duedraft(&dir, &["config", "set", "notion.page_size", "500"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error:"));
}

#[test]
fn test_empty_proposal_list() {
    let dir = TempDir::new().unwrap();
    let output = duedraft(&dir, &["proposal", "list"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "no pending proposals");
}
