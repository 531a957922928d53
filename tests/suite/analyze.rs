//! `keel analyze` from arguments and from stdin.

use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;

use crate::common::TestWorkspace;

fn indexed() -> TestWorkspace {
    let ws = TestWorkspace::with_files(&[
        ("src/auth.js", "// TODO: hash\nconst password = 'secret';\n"),
        ("src/report.py", "for (;;) {}\n"),
    ]);
    ws.index();
    ws
}

fn report(output: &std::process::Output) -> Value {
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn question_from_arguments() {
    let ws = indexed();
    let output = ws
        .keel()
        .args(["analyze", "onde", "está", "auth?"])
        .output()
        .unwrap();
    let report = report(&output);
    assert_eq!(report["pergunta"], "onde está auth?");
    assert_eq!(report["arquivos_analisados"][0], "src/auth.js");
    assert_eq!(report["resumo"][0]["tipo"], "organização");
    assert_eq!(report["resumo"][1]["tipo"], "segurança");
    assert_eq!(report["resumo"][1]["arquivo"], "src/auth.js");
}

#[test]
fn question_from_stdin() {
    let ws = indexed();
    let output = ws
        .keel()
        .arg("analyze")
        .write_stdin("report quality\n")
        .output()
        .unwrap();
    let report = report(&output);
    assert_eq!(report["pergunta"], "report quality");
    assert_eq!(report["arquivos_analisados"][0], "src/report.py");
    assert_eq!(report["resumo"][0]["tipo"], "info");
}

#[test]
fn empty_stdin_question_fails() {
    let ws = indexed();
    ws.keel()
        .arg("analyze")
        .write_stdin("  \n")
        .assert()
        .failure()
        .stderr(contains("Empty question"));
}

#[test]
fn missing_index_fails_and_suggests_reindexing() {
    let ws = TestWorkspace::with_files(&[("src/auth.js", "x")]);
    ws.keel()
        .args(["analyze", "auth"])
        .assert()
        .failure()
        .stdout("")
        .stderr(contains("Index not found").and(contains("keel index")));
    ws.keel()
        .args(["analyze", "--context", "auth"])
        .assert()
        .failure()
        .stderr(contains("Index not found"));
}

#[test]
fn context_flag_prints_previews() {
    let ws = indexed();
    ws.keel()
        .args(["analyze", "--context", "auth"])
        .assert()
        .success()
        .stdout(contains("--- src/auth.js ("))
        .stdout(contains("// TODO: hash"));
}
