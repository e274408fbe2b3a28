//! Output formatting
//!
//! Utilities for displaying status prefixes and error chains to the
//! user. The live per-product progress display lives in
//! [`crate::core::progress`]; this module only covers command-level
//! messages.

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";
}

/// Print an error and its cause chain to stderr.
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}
