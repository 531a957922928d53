//! Shared test utilities and fixtures
//!
//! Every test gets its own workspace directory and its own `HOME`, so neither
//! the user config nor the diagnostics log of the machine running the tests
//! leaks into the results.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub struct TestWorkspace {
    root: TempDir,
    home: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("workspace tempdir"),
            home: TempDir::new().expect("home tempdir"),
        }
    }

    /// Workspace seeded with `(relative path, content)` pairs.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let workspace = Self::new();
        for (rel, content) in files {
            workspace.write(rel, content);
        }
        workspace
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// The isolated home directory, outside the workspace.
    pub fn home(&self) -> &Path {
        self.home.path()
    }

    pub fn file(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.file(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, content).expect("write fixture file");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.file(rel)).expect("read workspace file")
    }

    /// The action log, empty when nothing has been logged yet.
    pub fn action_log(&self) -> String {
        fs::read_to_string(self.file(".keel-log.txt")).unwrap_or_default()
    }

    pub fn backups(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.file(".keel-backups")) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        paths.sort();
        paths
    }

    /// `keel` running inside the workspace with an isolated home directory.
    pub fn keel(&self) -> Command {
        let mut cmd = Command::cargo_bin("keel").expect("keel binary");
        cmd.current_dir(self.root.path())
            .env("HOME", self.home.path())
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run `keel index` and fail the test if it does not succeed.
    pub fn index(&self) {
        self.keel().arg("index").assert().success();
    }
}
