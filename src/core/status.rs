//! Run status record
//!
//! The durable summary of one run: which products were built, and the
//! first failure, if any. Written once at the end of a run as
//! `status.yaml` inside the build directory, for out-of-band inspection.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StatusError;

use super::product::Product;

/// Persisted status of one orchestrator run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatus {
    /// Products built (or found already installed), in build order
    #[serde(default)]
    pub built: Vec<Product>,

    /// First failing product; absent when the run succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<Product>,
}

impl BuildStatus {
    /// Whether the recorded run completed without failure.
    pub fn succeeded(&self) -> bool {
        self.failed_at.is_none()
    }

    /// Write the record to `path` as YAML.
    pub fn save(&self, path: &Path) -> Result<(), StatusError> {
        let text = serde_yaml::to_string(self).map_err(|e| StatusError::Serialize {
            error: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|e| StatusError::IoError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Read a record back from `path`.
    pub fn load(path: &Path) -> Result<Self, StatusError> {
        if !path.is_file() {
            return Err(StatusError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|e| StatusError::IoError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        serde_yaml::from_str(&text).map_err(|e| StatusError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Delete a stale record if one exists; a fresh run never resumes.
    pub fn clear(path: &Path) -> Result<(), StatusError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StatusError::IoError {
                path: path.to_path_buf(),
                error: e.to_string(),
            }),
        }
    }
}
