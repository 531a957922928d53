//! Shared infrastructure utilities for Keel.
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename)
//! - **`diff`**: Greedy line diff, its text rendering, and unified diffs

pub mod atomic_write;
pub mod diff;

pub use atomic_write::{
    AtomicWriteOptions, FileSyncPolicy, ParentDirSyncPolicy, PersistMode, atomic_write,
    atomic_write_with_options,
};
pub use diff::{diff_lines, render_diff, render_unified};
