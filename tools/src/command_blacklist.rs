//! Command blacklist for blocking destructive shell commands.
//!
//! This is a blocklist, not a sandbox. It catches the obvious spellings of
//! recursive deletes, disk formatting and the like, but indirection (`$(...)`,
//! aliases, encoded payloads, scripts already on disk) walks right past it.
//! Do not treat a passing command as safe.

use regex::RegexSet;

use super::{DenialReason, ToolError};

/// Default command blacklist patterns.
///
/// Each tuple: `(regex_pattern, human_readable_reason)`
pub const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    // rm with any short-flag group containing r, or --recursive
    (
        r"(?i)\brm\s+(?:[^\s;&|]+\s+)*?(?:-[a-z]*r[a-z]*|--recursive)(?:\s|$|[;&|])",
        "Recursive delete",
    ),
    (r"\brm\s+[^;&|]*\*", "Delete with wildcard"),
    // Windows: del / erase, rd /s, Remove-Item -Recurse
    (r"(?i)\b(?:del|erase)\s+", "Delete via del"),
    (
        r"(?i)\b(?:rd|rmdir)\s+(?:/[a-z]\s+)*/s\b",
        "Recursive directory delete via rd",
    ),
    (
        r"(?i)\b(?:Remove-Item|ri)\b[^;&|]*-Recurse\b",
        "Recursive delete via Remove-Item",
    ),
    (r"(?i)\bformat\s+[a-z]:", "Attempting to format a drive"),
    (
        r"(?i)(?:^|[;&|(]\s*|\bsudo\s+)(?:shutdown|reboot|poweroff|halt)\b",
        "System shutdown or reboot",
    ),
    (r"(?i)\bmkfs\b", "Filesystem creation"),
    (r"(?i)\bdd\s+[^;&|]*\b(?:if|of)=", "Raw disk copy via dd"),
    (
        r"(?i)>\s*/dev/(?:sd|hd|nvme|vd|xvd|disk)\w*",
        "Redirection into a disk device",
    ),
    (
        r"(?i)\bchmod\s+(?:-[a-z]*R[a-z]*\s+)+\S+\s+/(?:\s|$|[;&|])",
        "Recursive permission change on root filesystem",
    ),
    // Fork bomb (bash)
    (
        r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
        "Fork bomb detected",
    ),
];

/// Command blacklist validator.
///
/// Uses a `RegexSet` for multi-pattern matching in a single pass.
#[derive(Debug, Clone)]
pub struct CommandBlacklist {
    regex_set: RegexSet,
    /// Human-readable reasons for each pattern (parallel to regex_set patterns).
    reasons: Vec<String>,
}

impl CommandBlacklist {
    /// Create a new blacklist from pattern-reason pairs.
    pub fn new(patterns: &[(&str, &str)]) -> Result<Self, ToolError> {
        let regex_set = RegexSet::new(patterns.iter().map(|(pattern, _)| *pattern)).map_err(|e| {
            ToolError::BadArgs {
                message: format!("Failed to compile blacklist patterns: {e}"),
            }
        })?;
        let reasons = patterns
            .iter()
            .map(|(_, reason)| (*reason).to_string())
            .collect();

        Ok(Self { regex_set, reasons })
    }

    /// Create a blacklist with default patterns.
    pub fn with_defaults() -> Result<Self, ToolError> {
        Self::new(DEFAULT_PATTERNS)
    }

    /// Validate a command against the blacklist.
    ///
    /// Returns `Ok(())` if allowed, or `Err(ToolError::SandboxViolation)` if blocked.
    pub fn validate(&self, command: &str) -> Result<(), ToolError> {
        let command = command.trim();
        if let Some(idx) = self.regex_set.matches(command).iter().next() {
            return Err(ToolError::SandboxViolation(
                DenialReason::CommandBlacklisted {
                    command: truncate_command(command, 100),
                    reason: self.reasons[idx].clone(),
                },
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_command_safe(&self, command: &str) -> bool {
        self.validate(command).is_ok()
    }
}

/// Truncate command for error messages (avoid giant output).
pub(crate) fn truncate_command(cmd: &str, max_len: usize) -> String {
    if cmd.len() <= max_len {
        cmd.to_string()
    } else {
        let mut end = max_len;
        while end > 0 && !cmd.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &cmd[..end])
    }
}
