//! `keel agent` end to end: preview, interactive review and auto-confirm.

use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

use crate::common::TestWorkspace;

const AUTH: &str = "function login(user) {\n  return check(user);\n}\n";

fn indexed() -> TestWorkspace {
    let ws = TestWorkspace::with_files(&[
        ("auth.js", AUTH),
        ("util.py", "def noop():\n    pass\n"),
    ]);
    ws.index();
    ws
}

#[test]
fn preview_lists_candidates_and_writes_nothing() {
    let ws = indexed();
    ws.keel()
        .args(["agent", "ajustar", "auth"])
        .assert()
        .success()
        .stdout(contains("  1. auth.js (score: 4)"))
        .stdout(contains("--apply"));

    assert_eq!(ws.read("auth.js"), AUTH);
    assert!(ws.backups().is_empty());
    let log = ws.action_log();
    assert!(log.contains("] AGENT_START: ajustar auth"));
    assert!(log.contains("] AGENT_END: no modifications"));
}

#[test]
fn auto_confirm_applies_and_backs_up() {
    let ws = indexed();
    ws.write(
        "mods.json",
        r#"[{"path":"auth.js","content":"function login(user) {\n  return verify(user);\n}\n"}]"#,
    );
    ws.keel()
        .args(["agent", "auth", "--apply", "mods.json", "--yes"])
        .assert()
        .success()
        .stdout(contains("Applied: auth.js"))
        .stdout(contains("Modifications applied: 1"));

    assert!(ws.read("auth.js").contains("verify(user)"));
    let backups = ws.backups();
    assert_eq!(backups.len(), 1);
    assert_eq!(std::fs::read_to_string(&backups[0]).unwrap(), AUTH);
    let log = ws.action_log();
    assert!(log.contains("] AGENT_APPLY: auth.js"));
    assert!(log.contains("] AGENT_END: applied=1"));
}

#[test]
fn payload_path_is_relative_to_the_root() {
    let ws = indexed();
    ws.write("mods.json", r#"[{"path":"auth.js","content":"// moved\n"}]"#);
    let root = ws.path().to_str().unwrap().to_string();
    ws.keel()
        .current_dir(ws.home())
        .args(["--root", &root, "agent", "auth", "--apply", "mods.json", "-y"])
        .assert()
        .success()
        .stdout(contains("Applied: auth.js"));
    assert_eq!(ws.read("auth.js"), "// moved\n");
}

#[test]
fn declining_the_prompt_keeps_the_file() {
    let ws = indexed();
    ws.write("mods.json", r#"{"path":"auth.js","content":"// gone\n"}"#);
    ws.keel()
        .args(["agent", "auth", "--apply", "mods.json"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(contains("File: auth.js"))
        .stdout(contains("Apply this modification? (y/n)"))
        .stdout(contains("Skipped: auth.js"));

    assert_eq!(ws.read("auth.js"), AUTH);
    assert!(ws.action_log().contains("] AGENT_SKIP: auth.js"));
}

#[test]
fn accepting_the_prompt_writes() {
    let ws = indexed();
    ws.write("mods.json", r#"{"modifications":[{"file":"auth.js","content":"// new\n"}]}"#);
    ws.keel()
        .args(["agent", "auth", "--apply", "mods.json"])
        .write_stdin("sim\n")
        .assert()
        .success()
        .stdout(contains("Applied: auth.js"));
    assert_eq!(ws.read("auth.js"), "// new\n");
}

#[test]
fn denied_only_batch_exits_nonzero() {
    let ws = indexed();
    ws.write(
        "mods.json",
        r#"[{"path":"node_modules/evil.js","content":"x"},{"path":"../escape.js","content":"x"}]"#,
    );
    ws.keel()
        .args(["agent", "auth", "--apply", "mods.json", "-y"])
        .assert()
        .failure()
        .stdout(contains("Access denied: node_modules/evil.js"))
        .stdout(contains("Modifications applied: 0"));
    assert!(!ws.file("node_modules/evil.js").exists());
    assert!(ws.action_log().contains("] AGENT_DENIED: ../escape.js"));
}

#[test]
fn invalid_payloads_exit_nonzero() {
    let ws = indexed();
    ws.write("empty.json", "[]");
    ws.keel()
        .args(["agent", "auth", "--apply", "empty.json"])
        .assert()
        .failure()
        .stdout(contains("invalid or empty"));

    ws.keel()
        .args(["agent", "auth", "--apply", "missing.json"])
        .assert()
        .failure()
        .stderr(contains("modifications file not found"));
}

#[test]
fn unchanged_content_is_not_written() {
    let ws = indexed();
    let payload = serde_json::json!([{ "path": "auth.js", "content": AUTH }]);
    ws.write("mods.json", &payload.to_string());
    ws.keel()
        .args(["agent", "auth", "--apply", "mods.json", "--yes"])
        .assert()
        .success()
        .stdout(contains("No changes in: auth.js").and(contains("Applied").not()));
    assert!(ws.backups().is_empty());
}

#[test]
fn blank_instruction_prints_usage() {
    let ws = indexed();
    ws.keel()
        .args(["agent", "  "])
        .assert()
        .failure()
        .stdout(contains("Usage: keel agent"));
}
