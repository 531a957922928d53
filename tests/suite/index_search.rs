//! `keel index` and `keel search`.

use predicates::str::contains;
use serde_json::Value;

use crate::common::TestWorkspace;

fn seeded() -> TestWorkspace {
    TestWorkspace::with_files(&[
        ("a.js", "function login(){}\n"),
        ("b.py", "def logout(): pass\n"),
        ("notes.md", "login notes\n"),
        ("node_modules/lib/login.js", "module.exports = login;\n"),
    ])
}

#[test]
fn index_reports_file_count() {
    let ws = seeded();
    ws.keel()
        .arg("index")
        .assert()
        .success()
        .stdout(contains("Files indexed: 2"))
        .stdout(contains(".keel-index.json"));
    assert!(ws.file(".keel-index.json").is_file());
}

#[test]
fn search_ranks_indexed_files() {
    let ws = seeded();
    ws.index();

    let output = ws.keel().args(["search", "login"]).output().unwrap();
    assert!(output.status.success());
    let hits: Value = serde_json::from_slice(&output.stdout).unwrap();
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["path"], "a.js");
    assert_eq!(hits[0]["score"], 1);
    assert_eq!(hits[0]["preview"], "function login(){}");
}

#[test]
fn search_without_index_asks_for_one() {
    let ws = seeded();
    ws.keel()
        .args(["search", "login"])
        .assert()
        .failure()
        .stderr(contains("keel index"));
}

#[test]
fn empty_search_prints_usage() {
    let ws = seeded();
    ws.index();
    ws.keel()
        .arg("search")
        .assert()
        .failure()
        .stdout(contains("Usage: keel search"));
}

#[test]
fn workspace_config_changes_extensions() {
    let ws = seeded();
    ws.write(".keel.toml", "[index]\nextensions = [\"md\"]\n");
    ws.keel()
        .arg("index")
        .assert()
        .success()
        .stdout(contains("Files indexed: 1"));

    let output = ws.keel().args(["search", "notes"]).output().unwrap();
    let hits: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(hits[0]["path"], "notes.md");
}

#[test]
fn broken_config_is_reported() {
    let ws = seeded();
    ws.write(".keel.toml", "[index\n");
    ws.keel()
        .arg("index")
        .assert()
        .failure()
        .stderr(contains(".keel.toml"));
}
