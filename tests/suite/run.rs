//! `keel run` guarded command execution.

use predicates::str::contains;

use crate::common::TestWorkspace;

#[cfg(unix)]
#[test]
fn runs_in_workspace_root_and_logs() {
    let ws = TestWorkspace::with_files(&[("marker.txt", "")]);
    ws.keel()
        .args(["run", "ls"])
        .assert()
        .success()
        .stdout(contains("marker.txt"));
    assert!(ws.action_log().contains("] COMMAND: ls"));
}

#[test]
fn blacklisted_command_is_refused_and_not_logged() {
    let ws = TestWorkspace::new();
    ws.keel()
        .args(["run", "del", "/f", "/q", "notes.txt"])
        .assert()
        .failure()
        .stderr(contains("Command blocked"));
    assert!(!ws.action_log().contains("COMMAND"));
}

#[cfg(unix)]
#[test]
fn failing_command_reports_exit_code() {
    let ws = TestWorkspace::new();
    ws.keel()
        .args(["run", "sh", "-c", "'exit 4'"])
        .assert()
        .failure()
        .stderr(contains("exit 4"));
}
