//! Configuration for a build run
//!
//! All environment access happens here, eagerly, before any unit is
//! attempted. The rest of the crate receives plain structs.

pub mod defaults;

use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Validated configuration for one orchestrator run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Root directory of the build; one subdirectory per product
    pub build_dir: PathBuf,
    /// EUPS search path root (the `EUPS_PATH` value, possibly colon-separated)
    pub eups_path: String,
    /// Install directory of EUPS itself, for sourcing `bin/setups.sh`
    pub eups_dir: PathBuf,
}

impl BuildConfig {
    /// Build a validated configuration from the process environment.
    ///
    /// Fails fast when the build directory is missing or read-only, or
    /// when `EUPS_PATH`/`EUPS_DIR` are unset.
    pub fn from_env(build_dir: PathBuf) -> Result<Self, ConfigError> {
        Self::from_vars(
            build_dir,
            env::var("EUPS_PATH").ok(),
            env::var("EUPS_DIR").ok(),
        )
    }

    fn from_vars(
        build_dir: PathBuf,
        eups_path: Option<String>,
        eups_dir: Option<String>,
    ) -> Result<Self, ConfigError> {
        if !build_dir.is_dir() {
            return Err(ConfigError::BuildDirMissing { path: build_dir });
        }
        let build_dir = build_dir
            .canonicalize()
            .map_err(|e| ConfigError::IoError {
                path: build_dir.clone(),
                error: e.to_string(),
            })?;
        let readonly = build_dir
            .metadata()
            .map_err(|e| ConfigError::IoError {
                path: build_dir.clone(),
                error: e.to_string(),
            })?
            .permissions()
            .readonly();
        if readonly {
            return Err(ConfigError::BuildDirNotWritable { path: build_dir });
        }

        let eups_path = eups_path.ok_or_else(|| ConfigError::MissingEnv {
            var: "EUPS_PATH".to_string(),
        })?;
        let eups_dir = eups_dir.ok_or_else(|| ConfigError::MissingEnv {
            var: "EUPS_DIR".to_string(),
        })?;

        Ok(Self {
            build_dir,
            eups_path,
            eups_dir: PathBuf::from(eups_dir),
        })
    }
}

/// Configuration for the optional status notifier.
///
/// Absent when `GITHUB_TOKEN` is not set; notification is then disabled.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Bearer credential for the status endpoint
    pub token: String,
    /// Link attached to posted statuses, if the CI exposes one
    pub build_url: Option<String>,
    /// Label of the machine running the build
    pub agent: String,
    /// API root, overridable for tests
    pub api_root: String,
}

impl NotifyConfig {
    /// Read notifier settings from the process environment.
    pub fn from_env() -> Option<Self> {
        let token = env::var("GITHUB_TOKEN").ok()?;
        Some(Self {
            token,
            build_url: env::var("BUILD_URL").ok(),
            agent: env::var("NODE_NAME").unwrap_or_else(|_| "unknown".to_string()),
            api_root: defaults::GITHUB_API_ROOT.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_requires_existing_build_dir() {
        let result = BuildConfig::from_vars(
            PathBuf::from("/nonexistent/build/dir"),
            Some("/stack".to_string()),
            Some("/stack/eups".to_string()),
        );
        assert!(matches!(result, Err(ConfigError::BuildDirMissing { .. })));
    }

    #[test]
    fn test_config_requires_eups_path() {
        let temp = TempDir::new().unwrap();
        let result = BuildConfig::from_vars(
            temp.path().to_path_buf(),
            None,
            Some("/stack/eups".to_string()),
        );
        match result {
            Err(ConfigError::MissingEnv { var }) => assert_eq!(var, "EUPS_PATH"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_config_requires_eups_dir() {
        let temp = TempDir::new().unwrap();
        let result =
            BuildConfig::from_vars(temp.path().to_path_buf(), Some("/stack".to_string()), None);
        match result {
            Err(ConfigError::MissingEnv { var }) => assert_eq!(var, "EUPS_DIR"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_config_canonicalizes_build_dir() {
        let temp = TempDir::new().unwrap();
        let config = BuildConfig::from_vars(
            temp.path().to_path_buf(),
            Some("/stack".to_string()),
            Some("/stack/eups".to_string()),
        )
        .unwrap();
        assert!(config.build_dir.is_absolute());
        assert_eq!(config.eups_path, "/stack");
        assert_eq!(config.eups_dir, PathBuf::from("/stack/eups"));
    }
}
