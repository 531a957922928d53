//! `keel diff` on files given relative to the current directory.

use predicates::str::contains;

use crate::common::TestWorkspace;

#[test]
fn numbered_diff_shows_change_record() {
    let ws = TestWorkspace::with_files(&[("old.txt", "a\nb\nc\n"), ("new.txt", "a\nx\nc\n")]);
    ws.keel()
        .args(["diff", "old.txt", "new.txt"])
        .assert()
        .success()
        .stdout(contains("--- old.txt -> new.txt\n\n"))
        .stdout(contains("  1 | a\n- 2 | b\n+ 2 | x\n  3 | c\n"))
        .stdout(contains("Summary: +0 -0 ~1"));
}

#[test]
fn missing_file_counts_as_empty() {
    let ws = TestWorkspace::with_files(&[("new.txt", "hello\n")]);
    ws.keel()
        .args(["diff", "missing.txt", "new.txt"])
        .assert()
        .success()
        .stdout(contains("+ 1 | hello"))
        .stdout(contains("Summary: +1 -0 ~0"));
}

#[test]
fn unified_output_has_hunks() {
    let ws = TestWorkspace::with_files(&[("old.txt", "a\nb\nc\n"), ("new.txt", "a\nx\nc\n")]);
    ws.keel()
        .args(["diff", "old.txt", "new.txt", "--unified"])
        .assert()
        .success()
        .stdout(contains("--- old.txt\n+++ new.txt\n"))
        .stdout(contains("@@ -1,3 +1,3 @@"))
        .stdout(contains("-b\n+x\n"));
}
