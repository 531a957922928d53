use std::path::{Component, Path, PathBuf};

use super::{DenialReason, ToolError};

/// Directories the command-server surface never touches.
pub const SERVER_FORBIDDEN_DIRS: &[&str] = &["node_modules", ".git"];

/// Directories the file store never lists, reads or writes.
pub const STORE_FORBIDDEN_DIRS: &[&str] =
    &["node_modules", ".git", "dist", "build", ".next", "coverage"];

/// Secret-material globs enabled by `[workspace] deny_secrets = true`.
///
/// Off by default: a plain workspace sandbox only enforces the root and the
/// forbidden directories.
pub const DEFAULT_DENY_PATTERNS: &[&str] = &[
    "**/.ssh/**",
    "**/.gnupg/**",
    "**/.aws/**",
    "**/.git-credentials",
    "**/.npmrc",
    "**/.pypirc",
    "**/.netrc",
    "**/.env",
    "**/.env.*",
    "**/*.env",
    "**/id_rsa*",
    "**/id_ed25519*",
    "**/id_ecdsa*",
    "**/*.pem",
    "**/*.key",
    "**/*.p12",
    "**/*.pfx",
];

#[must_use]
pub fn default_deny_patterns() -> Vec<String> {
    DEFAULT_DENY_PATTERNS
        .iter()
        .map(std::string::ToString::to_string)
        .collect()
}

#[derive(Debug, Clone)]
struct DenyPattern {
    pattern: String,
    matcher: globset::GlobMatcher,
}

/// Path validation for a single workspace root.
///
/// The root is fixed at construction; every path handed to the file store or
/// the agent is resolved against it and must stay inside it.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    canonical_root: PathBuf,
    forbidden_dirs: Vec<String>,
    deny_patterns: Vec<DenyPattern>,
}

impl Sandbox {
    pub fn new(
        root: impl AsRef<Path>,
        forbidden_dirs: Vec<String>,
        denied_patterns: Vec<String>,
    ) -> Result<Self, ToolError> {
        let given = root.as_ref();
        let absolute = std::path::absolute(given).map_err(|e| ToolError::io(given, e))?;
        let root = normalize_lexically(&absolute);
        let canonical_root = std::fs::canonicalize(&root).map_err(|e| ToolError::io(&root, e))?;

        let mut deny_patterns = Vec::new();
        for pat in denied_patterns {
            let mut builder = globset::GlobBuilder::new(&pat);
            // Case-insensitive so "Secret.PEM" cannot slip past "*.pem".
            builder.case_insensitive(true);
            let glob = builder.build().map_err(|e| ToolError::BadArgs {
                message: format!("Invalid denied pattern '{pat}': {e}"),
            })?;
            deny_patterns.push(DenyPattern {
                pattern: pat,
                matcher: glob.compile_matcher(),
            });
        }

        Ok(Self {
            root,
            canonical_root,
            forbidden_dirs: forbidden_dirs
                .into_iter()
                .map(|d| d.to_lowercase())
                .collect(),
            deny_patterns,
        })
    }

    /// Sandbox with the store's forbidden directories and no deny patterns.
    pub fn with_defaults(root: impl AsRef<Path>) -> Result<Self, ToolError> {
        Self::new(
            root,
            STORE_FORBIDDEN_DIRS.iter().map(|d| (*d).to_string()).collect(),
            Vec::new(),
        )
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `raw` against the root and check it against every rule.
    ///
    /// Returns the lexically normalized absolute path under [`Sandbox::root`].
    pub fn validate(&self, raw: &str) -> Result<PathBuf, ToolError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ToolError::BadArgs {
                message: "path is empty".to_string(),
            });
        }
        if contains_unsafe_path_chars(raw) {
            return Err(ToolError::BadArgs {
                message: "path contains invalid control characters".to_string(),
            });
        }

        let input = Path::new(trimmed);
        let normalized = if input.is_absolute() {
            normalize_lexically(input)
        } else {
            normalize_lexically(&self.root.join(input))
        };

        let Some(rel) = self.strip_root(&normalized) else {
            return Err(outside(trimmed));
        };

        if let Some(segment) = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy()),
                _ => None,
            })
            .find(|s| self.is_forbidden_dir_name(s))
        {
            return Err(ToolError::SandboxViolation(DenialReason::ForbiddenPath {
                attempted: trimmed.to_string(),
                segment: segment.into_owned(),
            }));
        }

        let rel_display = to_forward_slashes(&rel);
        if let Some(pattern) = self.matches_denied_pattern(&rel_display) {
            return Err(ToolError::SandboxViolation(
                DenialReason::DeniedPatternMatched {
                    attempted: trimmed.to_string(),
                    pattern,
                },
            ));
        }

        let resolved = self.root.join(&rel);
        self.check_symlink_escape(&resolved, trimmed)?;
        Ok(resolved)
    }

    /// Workspace-relative display form of `path`, with forward slashes.
    ///
    /// The root itself is `.`; paths outside the root are shown as given.
    #[must_use]
    pub fn relative(&self, path: &Path) -> String {
        match self.strip_root(path) {
            Some(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Some(rel) => to_forward_slashes(&rel),
            None => to_forward_slashes(path),
        }
    }

    /// Case-insensitive membership in the forbidden directory set.
    #[must_use]
    pub fn is_forbidden_dir_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.forbidden_dirs.iter().any(|d| *d == lower)
    }

    /// Check a workspace-relative path against the deny patterns only.
    #[must_use]
    pub fn is_path_denied(&self, rel: &str) -> bool {
        self.matches_denied_pattern(rel).is_some()
    }

    fn strip_root(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.root)
            .or_else(|_| path.strip_prefix(&self.canonical_root))
            .ok()
            .map(Path::to_path_buf)
    }

    fn matches_denied_pattern(&self, rel: &str) -> Option<String> {
        self.deny_patterns
            .iter()
            .find(|pat| pat.matcher.is_match(rel))
            .map(|pat| pat.pattern.clone())
    }

    /// A symlinked ancestor must not lead out of the workspace.
    fn check_symlink_escape(&self, resolved: &Path, attempted: &str) -> Result<(), ToolError> {
        let mut existing = resolved;
        while !existing.exists() {
            match existing.parent() {
                Some(parent) => existing = parent,
                None => return Err(outside(attempted)),
            }
        }
        let canonical = std::fs::canonicalize(existing).map_err(|_| outside(attempted))?;
        if canonical.starts_with(&self.canonical_root) {
            Ok(())
        } else {
            Err(outside(attempted))
        }
    }
}

fn outside(attempted: &str) -> ToolError {
    ToolError::SandboxViolation(DenialReason::OutsideWorkspace {
        attempted: attempted.to_string(),
    })
}

/// Resolve `.` and `..` without touching the filesystem.
///
/// `..` at the root stays at the root.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn contains_unsafe_path_chars(input: &str) -> bool {
    input.chars().any(is_unsafe_path_char)
}

/// C0/C1 control characters, DEL, and invisible formatting characters.
fn is_unsafe_path_char(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001f}' | '\u{007f}' | '\u{0080}'..='\u{009f}')
        || keel_types::is_invisible_char(c)
}
