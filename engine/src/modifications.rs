//! Loading the agent's modification payload from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModificationsError {
    #[error("modifications file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read modifications file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in modifications file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw entries from a modifications file.
///
/// Accepts a JSON array, an object with a `modifications` array, or a single
/// object taken as a one-entry batch. Entries are validated later, one by one.
pub fn load_modifications(path: &Path) -> Result<Vec<Value>, ModificationsError> {
    let raw = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ModificationsError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ModificationsError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|source| ModificationsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(into_entries(value))
}

fn into_entries(value: Value) -> Vec<Value> {
    match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("modifications") {
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                map.insert("modifications".to_string(), other);
                vec![Value::Object(map)]
            }
            None => vec![Value::Object(map)],
        },
        other => vec![other],
    }
}
