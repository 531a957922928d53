//! Guarded synchronous shell execution.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use tracing::{debug, warn};

use crate::ToolError;
use crate::command_blacklist::{CommandBlacklist, truncate_command};

#[cfg(windows)]
const SHELL: (&str, &str) = ("cmd", "/C");
#[cfg(not(windows))]
const SHELL: (&str, &str) = ("sh", "-c");

/// Runs blacklist-checked commands through the platform shell in the
/// workspace root. There is no timeout; output is bounded instead.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    root: PathBuf,
    blacklist: CommandBlacklist,
    max_output_bytes: usize,
}

impl CommandRunner {
    #[must_use]
    pub fn new(
        root: impl Into<PathBuf>,
        blacklist: CommandBlacklist,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            root: root.into(),
            blacklist,
            max_output_bytes,
        }
    }

    /// Reject empty or blacklisted commands without running anything.
    pub fn check(&self, command: &str) -> Result<(), ToolError> {
        if command.trim().is_empty() {
            return Err(ToolError::BadArgs {
                message: "command is empty".to_string(),
            });
        }
        self.blacklist.validate(command)
    }

    /// Run `command` and return its stdout.
    ///
    /// A non-zero exit still returns stdout when there is any; otherwise the
    /// failure carries the exit code and stderr.
    pub fn run(&self, command: &str) -> Result<String, ToolError> {
        self.check(command)?;
        let command = command.trim();
        let (shell, flag) = SHELL;

        let mut child = Command::new(shell)
            .arg(flag)
            .arg(command)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ToolError::io(shell, e))?;
        debug!(command = %truncate_command(command, 100), pid = child.id(), "Command spawned");

        let limit = self.max_output_bytes;
        let stderr_reader = child.stderr.take().map(|stderr| {
            thread::spawn(move || read_limited(stderr, limit))
        });

        let stdout = match child.stdout.take() {
            Some(stdout) => read_limited(stdout, limit).map_err(|e| ToolError::io(shell, e))?,
            None => Some(Vec::new()),
        };
        let Some(stdout) = stdout else {
            warn!(limit, "Command output limit exceeded; killing child");
            let _ = child.kill();
            let _ = child.wait();
            let _ = stderr_reader.map(thread::JoinHandle::join);
            return Err(ToolError::OutputLimitExceeded { limit });
        };

        let status = child.wait().map_err(|e| ToolError::io(shell, e))?;
        let stderr = match stderr_reader {
            Some(handle) => handle
                .join()
                .map_err(|_| ToolError::io(shell, io::Error::other("stderr reader panicked")))?
                .map_err(|e| ToolError::io(shell, e))?,
            None => Some(Vec::new()),
        };
        let Some(stderr) = stderr else {
            return Err(ToolError::OutputLimitExceeded { limit });
        };

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        if status.success() || !stdout.is_empty() {
            return Ok(stdout);
        }
        Err(ToolError::CommandFailed {
            command: truncate_command(command, 100),
            code: status.code(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        })
    }
}

/// Read to EOF, or `None` once more than `limit` bytes arrive.
fn read_limited(reader: impl Read, limit: usize) -> io::Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut buf)?;
    if buf.len() > limit {
        Ok(None)
    } else {
        Ok(Some(buf))
    }
}
