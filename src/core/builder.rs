//! Build orchestration
//!
//! Walks the manifest's products in build order, skipping units the
//! package manager already knows, building the rest via their generated
//! scripts, tagging successes, and stopping at the first failure. The
//! run's outcome is accumulated into a [`BuildStatus`] record.

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use crate::config::defaults;
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::eups::{InstalledProduct, PackageStore};
use crate::infra::process;

use super::manifest::Manifest;
use super::product::Product;
use super::progress::{ProgressReporter, UnitProgress};
use super::script::ScriptSource;
use super::status::BuildStatus;

/// Builds and installs every product in a manifest, in order.
///
/// Successful units are tagged with the manifest's build tag, if any.
/// Iteration halts at the first failing unit; partial results stay
/// inspectable through [`Builder::built`] and the persisted status.
pub struct Builder<'a> {
    config: &'a BuildConfig,
    manifest: &'a Manifest,
    store: &'a dyn PackageStore,
    scripts: &'a dyn ScriptSource,
    built: Vec<Product>,
    failed_at: Option<Product>,
}

impl<'a> Builder<'a> {
    pub fn new(
        config: &'a BuildConfig,
        manifest: &'a Manifest,
        store: &'a dyn PackageStore,
        scripts: &'a dyn ScriptSource,
    ) -> Self {
        Self {
            config,
            manifest,
            store,
            scripts,
            built: Vec::new(),
            failed_at: None,
        }
    }

    /// Products successfully built (or found installed) so far, in order.
    pub fn built(&self) -> &[Product] {
        &self.built
    }

    /// The first failing product, if the run failed.
    pub fn failed_at(&self) -> Option<&Product> {
        self.failed_at.as_ref()
    }

    /// Build all products. Returns overall success.
    ///
    /// A `false` return means some unit's build script failed; fatal
    /// conditions (unwritable files, package store query failures)
    /// surface as errors instead.
    pub async fn build<W: Write>(
        &mut self,
        reporter: &mut ProgressReporter<W>,
    ) -> Result<bool, BuildError> {
        // the build tag must exist before the first unit is declared with it
        if let Some(tag) = self.manifest.build_id.as_deref() {
            self.store.register_tag(tag)?;
        }

        let products: Vec<Product> = self.manifest.index.products().to_vec();
        tracing::info!(count = products.len(), "starting build");

        for product in products {
            if !self.build_if_needed(&product, reporter).await? {
                self.failed_at = Some(product);
                return Ok(false);
            }
            self.built.push(product);
        }
        Ok(true)
    }

    async fn build_if_needed<W: Write>(
        &mut self,
        product: &Product,
        reporter: &mut ProgressReporter<W>,
    ) -> Result<bool, BuildError> {
        let mut progress = reporter.start(product);

        // skip the build if the product has been installed
        let (installed, retcode, log_path) =
            match self.store.lookup(&product.name, &product.version)? {
                Some(installed) => {
                    tracing::debug!(product = %product, "already installed, skipping");
                    (Some(installed), 0, None)
                }
                None => self.build_product(product, &mut progress).await?,
            };

        if let (Some(installed), Some(tag)) = (&installed, self.manifest.build_id.as_deref()) {
            if !installed.tags.iter().any(|t| t == tag) {
                self.store.assign_tag(&product.name, &product.version, tag)?;
            }
        }

        progress.finish(retcode, log_path.as_deref());
        Ok(retcode == 0)
    }

    /// Run the eupspkg sequence for one product.
    async fn build_product<W: Write>(
        &self,
        product: &Product,
        progress: &mut UnitProgress<'_, W>,
    ) -> Result<(Option<InstalledProduct>, i32, Option<PathBuf>), BuildError> {
        let product_dir = self.config.build_dir.join(&product.name);
        let script_path = product_dir.join(defaults::SCRIPT_FILENAME);
        let log_path = product_dir.join(defaults::LOG_FILENAME);

        let deps = self.manifest.index.flat_dependencies(product);
        let text = self.scripts.render(product, &deps, &product_dir);

        std::fs::write(&script_path, text).map_err(|e| BuildError::ScriptWrite {
            path: script_path.clone(),
            error: e.to_string(),
        })?;
        let mut perms = std::fs::metadata(&script_path)
            .map_err(|e| BuildError::ScriptWrite {
                path: script_path.clone(),
                error: e.to_string(),
            })?
            .permissions();
        perms.set_mode(perms.mode() | 0o111);
        std::fs::set_permissions(&script_path, perms).map_err(|e| BuildError::ScriptWrite {
            path: script_path.clone(),
            error: e.to_string(),
        })?;

        tracing::info!(product = %product, script = %script_path.display(), "building");
        let retcode =
            process::run_script(&script_path, &product_dir, &log_path, || progress.tick()).await?;

        let installed = if retcode == 0 {
            match self.store.lookup(&product.name, &product.version)? {
                Some(installed) => {
                    // the log travels with the installed artifact
                    std::fs::copy(&log_path, installed.dir.join(defaults::LOG_FILENAME))
                        .map_err(|e| BuildError::IoError {
                            path: log_path.clone(),
                            error: e.to_string(),
                        })?;
                    Some(installed)
                }
                None => {
                    tracing::warn!(
                        product = %product,
                        "not registered with the package manager after a successful build"
                    );
                    None
                }
            }
        } else {
            None
        };

        Ok((installed, retcode, Some(log_path)))
    }

    fn status_path(&self) -> PathBuf {
        self.config.build_dir.join(defaults::STATUS_FILENAME)
    }

    /// Delete any status record left over from a previous run.
    pub fn clear_status(&self) -> Result<(), BuildError> {
        BuildStatus::clear(&self.status_path())?;
        Ok(())
    }

    /// Persist the run's outcome.
    pub fn write_status(&self) -> Result<(), BuildError> {
        let status = BuildStatus {
            built: self.built.clone(),
            failed_at: self.failed_at.clone(),
        };
        status.save(&self.status_path())?;
        Ok(())
    }
}
