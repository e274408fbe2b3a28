//! Build command implementation
//!
//! Implements `stackforge build`: load the manifest, build every product
//! in order, persist the status record, and report the outcome to the
//! CI status endpoint when a PR context is present.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::defaults;
use crate::config::{BuildConfig, NotifyConfig};
use crate::core::builder::Builder;
use crate::core::manifest::Manifest;
use crate::core::progress::ProgressReporter;
use crate::core::script::EupsScript;
use crate::eups::EupsCli;
use crate::notify::{BuildState, PrInfo, StatusNotifier};

/// Build options
pub struct BuildOptions {
    /// Root directory of the build
    pub build_dir: PathBuf,
    /// Skip CI status notification
    pub no_notify: bool,
}

/// Execute the build command. Returns overall success.
pub async fn execute(options: BuildOptions) -> Result<bool> {
    let config = BuildConfig::from_env(options.build_dir)
        .context("Build environment is not usable")?;

    let manifest_path = config.build_dir.join(defaults::MANIFEST_FILENAME);
    let manifest = Manifest::load(&manifest_path)
        .with_context(|| format!("Failed to load manifest from {}", manifest_path.display()))?;
    tracing::info!(
        products = manifest.index.len(),
        build_id = manifest.build_id.as_deref().unwrap_or("-"),
        "manifest loaded"
    );

    // PR context saved by the preparation step, if any
    let pr_info = if options.no_notify {
        None
    } else {
        match PrInfo::load(&config.build_dir) {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("ignoring unreadable PR context: {e}");
                None
            }
        }
    };
    let notifier = match (&pr_info, NotifyConfig::from_env()) {
        (Some(_), Some(notify_config)) => Some(StatusNotifier::new(notify_config)),
        (Some(_), None) => {
            tracing::warn!("PR context present but GITHUB_TOKEN is not set; not notifying");
            None
        }
        _ => None,
    };

    let store = EupsCli::new(config.eups_path.clone());
    store.preflight().context("Package manager is not usable")?;
    let scripts = EupsScript::new(&config);

    let mut builder = Builder::new(&config, &manifest, &store, &scripts);
    builder.clear_status()?;

    if let (Some(pr), Some(notifier)) = (&pr_info, &notifier) {
        let description = format!("Build started on {}", notifier.agent());
        if let Err(e) = notifier.post_status(pr, BuildState::Pending, &description).await {
            tracing::warn!("failed to post pending status: {e}");
        }
    }

    let mut reporter = ProgressReporter::new(std::io::stdout());
    let ok = builder.build(&mut reporter).await?;

    if let (Some(pr), Some(notifier)) = (&pr_info, &notifier) {
        let (state, verdict) = if ok {
            (BuildState::Success, "succeeded")
        } else {
            (BuildState::Failure, "failed")
        };
        let description = format!("Build {verdict} on {}", notifier.agent());
        if let Err(e) = notifier.post_status(pr, state, &description).await {
            tracing::warn!("failed to post terminal status: {e}");
        }
    }

    builder.write_status()?;
    Ok(ok)
}
