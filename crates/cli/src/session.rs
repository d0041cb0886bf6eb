//! Loading session files.
//!
//! A session is a list of store actions in their wire form. Files ending in
//! `.yaml` or `.yml` are read as YAML, everything else as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use inkvar_core::variables::Action;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read session file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse JSON session {0}: {1}")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("failed to parse YAML session {0}: {1}")]
    Yaml(PathBuf, #[source] serde_yaml::Error),
}

pub fn load(path: &Path) -> Result<Vec<Action>, SessionError> {
    let text = fs::read_to_string(path).map_err(|e| SessionError::Read(path.to_path_buf(), e))?;
    parse(path, &text)
}

fn parse(path: &Path, text: &str) -> Result<Vec<Action>, SessionError> {
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(text).map_err(|e| SessionError::Yaml(path.to_path_buf(), e))
    } else {
        serde_json::from_str(text).map_err(|e| SessionError::Json(path.to_path_buf(), e))
    }
}
