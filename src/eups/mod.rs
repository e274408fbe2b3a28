//! Package store interface and the `eups` CLI binding
//!
//! The orchestrator consumes the package manager through the
//! [`PackageStore`] trait: query an installed product, register the
//! run's build tag in the global namespace, and tag installed products.
//! [`EupsCli`] implements it by shelling out to the `eups` binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::StoreError;

/// An installed product as reported by the package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledProduct {
    pub name: String,
    pub version: String,
    /// Install directory of this product
    pub dir: PathBuf,
    /// Tags currently associated with this product
    pub tags: Vec<String>,
}

/// The package manager operations the build pipeline needs.
///
/// "Not found" is a regular answer (`Ok(None)`), never an error; only
/// genuine query failures surface as `Err` and abort the run.
pub trait PackageStore {
    /// Look up an installed product by exact name and version.
    fn lookup(&self, name: &str, version: &str) -> Result<Option<InstalledProduct>, StoreError>;

    /// Register `tag` in the global tag namespace. Idempotent: a tag
    /// that already exists is left untouched.
    fn register_tag(&self, tag: &str) -> Result<(), StoreError>;

    /// Associate `tag` with an installed product.
    fn assign_tag(&self, name: &str, version: &str, tag: &str) -> Result<(), StoreError>;
}

/// Package store backed by the external `eups` binary.
#[derive(Debug, Clone)]
pub struct EupsCli {
    eups_path: String,
}

impl EupsCli {
    pub fn new(eups_path: impl Into<String>) -> Self {
        Self {
            eups_path: eups_path.into(),
        }
    }

    /// Verify the `eups` binary is reachable before any unit is attempted.
    pub fn preflight(&self) -> Result<(), StoreError> {
        which::which("eups")
            .map(|_| ())
            .map_err(|_| StoreError::MissingBinary {
                name: "eups".to_string(),
            })
    }

    /// First component of the (possibly colon-separated) search path.
    fn primary_root(&self) -> &str {
        self.eups_path.split(':').next().unwrap_or(&self.eups_path)
    }

    fn run(&self, args: &[&str]) -> Result<std::process::Output, StoreError> {
        Command::new("eups")
            .args(args)
            .env("EUPS_PATH", &self.eups_path)
            .output()
            .map_err(|e| StoreError::CommandFailed {
                command: format!("eups {}", args.join(" ")),
                message: e.to_string(),
            })
    }

    fn install_dir(&self, name: &str, version: &str) -> Result<PathBuf, StoreError> {
        let output = self.run(&["list", name, version, "-d"])?;
        if !output.status.success() {
            return Err(StoreError::CommandFailed {
                command: format!("eups list {name} {version} -d"),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let dir = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if dir.is_empty() {
            return Err(StoreError::ParseError {
                message: format!("empty install directory for {name} {version}"),
            });
        }
        Ok(PathBuf::from(dir))
    }
}

impl PackageStore for EupsCli {
    fn lookup(&self, name: &str, version: &str) -> Result<Option<InstalledProduct>, StoreError> {
        let output = self.run(&["list", name, version, "--raw"])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // an unknown product is a regular answer, not a failure
            if stderr.contains("Unable to find") || stderr.contains("not found") {
                return Ok(None);
            }
            return Err(StoreError::CommandFailed {
                command: format!("eups list {name} {version}"),
                message: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let tags = parse_raw_tags(&stdout)?;
        let dir = self.install_dir(name, version)?;
        Ok(Some(InstalledProduct {
            name: name.to_string(),
            version: version.to_string(),
            dir,
            tags,
        }))
    }

    fn register_tag(&self, tag: &str) -> Result<(), StoreError> {
        let db = Path::new(self.primary_root()).join("ups_db");
        let path = db.join("global.tags");

        let existing = std::fs::read_to_string(&path).unwrap_or_default();
        let mut tags: Vec<&str> = existing.split_whitespace().collect();
        if tags.iter().any(|t| *t == tag) {
            return Ok(());
        }

        std::fs::create_dir_all(&db).map_err(|e| StoreError::IoError {
            path: db.clone(),
            error: e.to_string(),
        })?;
        tags.push(tag);
        std::fs::write(&path, format!("{}\n", tags.join(" "))).map_err(|e| StoreError::IoError {
            path,
            error: e.to_string(),
        })
    }

    fn assign_tag(&self, name: &str, version: &str, tag: &str) -> Result<(), StoreError> {
        let output = self.run(&["declare", name, version, "-t", tag])?;
        if !output.status.success() {
            return Err(StoreError::CommandFailed {
                command: format!("eups declare {name} {version} -t {tag}"),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Parse the tag column of `eups list --raw` output
/// (`name|version|tag1 tag2 ...`).
fn parse_raw_tags(stdout: &str) -> Result<Vec<String>, StoreError> {
    let Some(line) = stdout.lines().next() else {
        return Ok(Vec::new());
    };
    let mut fields = line.split('|');
    fields.next();
    fields.next();
    match fields.next() {
        Some(tags) => Ok(tags.split_whitespace().map(str::to_string).collect()),
        None => Err(StoreError::ParseError {
            message: format!("unexpected listing line '{line}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_raw_tags() {
        let tags = parse_raw_tags("afw|22.0.1|current b42\n").unwrap();
        assert_eq!(tags, ["current", "b42"]);
    }

    #[test]
    fn test_parse_raw_tags_empty_column() {
        let tags = parse_raw_tags("afw|22.0.1|\n").unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn test_parse_raw_tags_no_listing() {
        let tags = parse_raw_tags("").unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn test_parse_raw_tags_malformed() {
        assert!(parse_raw_tags("just one field\n").is_err());
    }

    #[test]
    fn test_register_tag_creates_and_appends() {
        let temp = TempDir::new().unwrap();
        let store = EupsCli::new(temp.path().display().to_string());

        store.register_tag("b42").unwrap();
        let path = temp.path().join("ups_db").join("global.tags");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b42\n");

        store.register_tag("b43").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b42 b43\n");
    }

    #[test]
    fn test_register_tag_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = EupsCli::new(temp.path().display().to_string());

        store.register_tag("b42").unwrap();
        store.register_tag("b42").unwrap();

        let path = temp.path().join("ups_db").join("global.tags");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b42\n");
    }

    #[test]
    fn test_register_tag_uses_primary_search_path_entry() {
        let temp = TempDir::new().unwrap();
        let primary = temp.path().join("one");
        std::fs::create_dir_all(&primary).unwrap();
        let store = EupsCli::new(format!(
            "{}:{}",
            primary.display(),
            temp.path().join("two").display()
        ));

        store.register_tag("b42").unwrap();
        assert!(primary.join("ups_db").join("global.tags").is_file());
        assert!(!temp.path().join("two").exists());
    }
}
