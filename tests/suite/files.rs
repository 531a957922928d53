//! `keel files list` and `keel files read` through the sandbox.

use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;

use crate::common::TestWorkspace;

fn listing(ws: &TestWorkspace, args: &[&str]) -> Vec<String> {
    let output = ws.keel().args(args).output().unwrap();
    assert!(output.status.success(), "{output:?}");
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn list_walks_recursively_and_hides_forbidden_directories() {
    let ws = TestWorkspace::with_files(&[
        ("src/app.js", ""),
        ("src/lib/util.py", ""),
        ("README.md", ""),
        ("node_modules/x/index.js", ""),
        (".git/HEAD", ""),
    ]);
    assert_eq!(
        listing(&ws, &["files", "list"]),
        vec!["README.md", "src/app.js", "src/lib/util.py"]
    );
    assert_eq!(
        listing(&ws, &["files", "list", "src"]),
        vec!["src/app.js", "src/lib/util.py"]
    );
}

#[test]
fn shallow_list_shows_entry_names() {
    let ws = TestWorkspace::with_files(&[
        ("src/app.js", ""),
        ("README.md", ""),
        ("node_modules/x/index.js", ""),
    ]);
    assert_eq!(
        listing(&ws, &["files", "list", "--shallow"]),
        vec!["README.md", "src"]
    );
}

#[test]
fn list_filters_by_extension() {
    let ws = TestWorkspace::with_files(&[
        ("src/app.js", ""),
        ("src/lib/util.py", ""),
        ("src/readme.txt", ""),
        ("dist/bundle.js", ""),
    ]);
    assert_eq!(
        listing(&ws, &["files", "list", "src", "--ext", ".py", "js"]),
        vec!["src/app.js", "src/lib/util.py"]
    );
    assert_eq!(
        listing(&ws, &["files", "list", "--ext", "js"]),
        vec!["src/app.js"]
    );
}

#[test]
fn list_skips_backups_and_the_action_log() {
    let ws = TestWorkspace::with_files(&[
        ("a.js", ""),
        (".keel-backups/a.js.2026-01-01T00-00-00-000Z.bak", ""),
        (".keel-log.txt", ""),
    ]);
    assert_eq!(listing(&ws, &["files", "list"]), vec!["a.js"]);
    assert!(listing(&ws, &["files", "list", ".keel-backups"]).is_empty());
}

#[test]
fn read_prints_content() {
    let ws = TestWorkspace::with_files(&[("src/app.js", "console.log(1);\n")]);
    ws.keel()
        .args(["files", "read", "src/app.js"])
        .assert()
        .success()
        .stdout("console.log(1);\n");
}

#[test]
fn bounded_read_truncates() {
    let long: Vec<String> = (1..=2100).map(|n| format!("row {n}")).collect();
    let ws = TestWorkspace::with_files(&[("big.js", &long.join("\n"))]);
    ws.keel()
        .args(["files", "read", "big.js", "--bounded"])
        .assert()
        .success()
        .stdout(
            contains("row 2000\n// ... (truncated at 2000 lines)")
                .and(contains("row 2001").not()),
        );
}

#[test]
fn read_refuses_paths_outside_the_sandbox() {
    let ws = TestWorkspace::with_files(&[(".git/config", "[core]\n")]);
    ws.keel()
        .args(["files", "read", "../../etc/passwd"])
        .assert()
        .failure()
        .stderr(contains("outside workspace"));
    ws.keel()
        .args(["files", "read", ".git/config"])
        .assert()
        .failure()
        .stderr(contains("forbidden directory"));
}

#[test]
fn secret_files_are_readable_unless_denied() {
    let ws = TestWorkspace::with_files(&[(".env", "TOKEN=1\n"), ("certs/x.pem", "PEM\n")]);
    ws.keel()
        .args(["files", "read", ".env"])
        .assert()
        .success()
        .stdout("TOKEN=1\n");

    ws.write(".keel.toml", "[workspace]\ndeny_secrets = true\n");
    ws.keel()
        .args(["files", "read", ".env"])
        .assert()
        .failure()
        .stderr(contains("denied pattern"));
    ws.keel()
        .args(["files", "read", "certs/x.pem"])
        .assert()
        .failure()
        .stderr(contains("denied pattern"));
}

#[test]
fn read_missing_file_fails() {
    let ws = TestWorkspace::new();
    ws.keel()
        .args(["files", "read", "nope.js"])
        .assert()
        .failure()
        .stderr(contains("Not found: nope.js"));
}
