//! Status command implementation
//!
//! Implements `stackforge status`: print the persisted record of the
//! last run in human-readable form.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::status;
use crate::config::defaults;
use crate::core::status::BuildStatus;

/// Execute the status command
pub fn execute(build_dir: &Path) -> Result<()> {
    let path = build_dir.join(defaults::STATUS_FILENAME);
    let record = BuildStatus::load(&path)
        .with_context(|| format!("No readable status record in {}", build_dir.display()))?;

    for product in &record.built {
        println!("{} {} {}", status::SUCCESS, product.name, product.version);
    }
    if let Some(failed) = &record.failed_at {
        println!(
            "{} {} {} (failed)",
            status::ERROR,
            failed.name,
            failed.version
        );
        println!(
            "{} build stopped at '{}'; {} product(s) built before the failure",
            status::WARNING,
            failed.name,
            record.built.len()
        );
    } else {
        println!("{} products built", record.built.len());
    }
    Ok(())
}
