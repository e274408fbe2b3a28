//! Error types for stackforge
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration and precondition errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing
    #[error("Required environment variable {var} is not set")]
    MissingEnv { var: String },

    /// Build directory does not exist
    #[error("Build directory '{path}' does not exist")]
    BuildDirMissing { path: PathBuf },

    /// Build directory is not writable
    #[error("Build directory '{path}' is not writable")]
    BuildDirNotWritable { path: PathBuf },

    /// IO error while resolving the build directory
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Manifest parsing errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Manifest not found at '{path}'")]
    NotFound { path: PathBuf },

    /// IO error reading the manifest
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Malformed manifest line
    #[error("Malformed manifest line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// A product is listed more than once
    #[error("Product '{name}' declared twice (line {line})")]
    DuplicateProduct { line: usize, name: String },

    /// A dependency references a product that was not declared earlier
    #[error("Product '{product}' (line {line}) depends on undeclared product '{dependency}'")]
    UnknownDependency {
        line: usize,
        product: String,
        dependency: String,
    },
}

/// Package store errors
///
/// "Not found" is never an error: [`crate::eups::PackageStore::lookup`]
/// reports it as `Ok(None)`. These variants cover genuine failures.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Package manager binary is missing from PATH
    #[error("Package manager binary '{name}' not found in PATH")]
    MissingBinary { name: String },

    /// A package manager command failed
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Unparseable package manager output
    #[error("Failed to parse package manager output: {message}")]
    ParseError { message: String },

    /// IO error on the tag store
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Build pipeline errors
///
/// A non-zero script exit is not an error here; it is a per-unit outcome
/// the [`crate::core::builder::Builder`] records. These variants abort
/// the run.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Failed to write or chmod the generated build script
    #[error("Failed to write build script '{path}': {error}")]
    ScriptWrite { path: PathBuf, error: String },

    /// Failed to launch the build script
    #[error("Failed to launch '{path}': {error}")]
    Launch { path: PathBuf, error: String },

    /// IO error on the log or status files
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Package store failure
    #[error("Package store error: {0}")]
    Store(#[from] StoreError),

    /// Status record failure
    #[error("Status record error: {0}")]
    Status(#[from] StatusError),
}

/// Status record errors
#[derive(Error, Debug)]
pub enum StatusError {
    /// No status record has been written
    #[error("No status record at '{path}'")]
    NotFound { path: PathBuf },

    /// IO error on the status file
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Serialization failure
    #[error("Failed to serialize status record: {error}")]
    Serialize { error: String },

    /// Deserialization failure
    #[error("Failed to parse status record '{path}': {error}")]
    Parse { path: PathBuf, error: String },
}

/// Status notification errors
///
/// Always logged and swallowed by the caller; a failed notification
/// must never fail the build.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// HTTP transport failure
    #[error("Status request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with an unexpected status code
    #[error("Status endpoint answered {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// IO error reading the PR context file
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Malformed PR context file
    #[error("Failed to parse '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// No credential available
    #[error("No credential available: {message}")]
    MissingCredential { message: String },
}
