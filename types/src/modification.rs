//! Modification requests consumed by the agent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A full-content replacement for one workspace file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub path: String,
    pub content: String,
}

/// Why a raw modification entry could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedModification {
    #[error("entry is not an object")]
    NotAnObject,
    #[error("entry has no `path` (or `file`)")]
    MissingPath,
    #[error("entry has no string `content`")]
    MissingContent,
}

impl TryFrom<&Value> for Modification {
    type Error = MalformedModification;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        if !value.is_object() {
            return Err(MalformedModification::NotAnObject);
        }
        let path = ["path", "file"]
            .iter()
            .filter_map(|key| value.get(*key).and_then(Value::as_str))
            .find(|p| !p.is_empty())
            .ok_or(MalformedModification::MissingPath)?;
        let content = value
            .get("content")
            .and_then(Value::as_str)
            .ok_or(MalformedModification::MissingContent)?;
        Ok(Self {
            path: path.to_string(),
            content: content.to_string(),
        })
    }
}
