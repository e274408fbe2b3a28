//! Shared test doubles
//!
//! An in-memory package store and a trivial script source, so builder
//! behavior can be exercised without an EUPS installation.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use crate::core::product::Product;
use crate::core::script::ScriptSource;
use crate::error::StoreError;
use crate::eups::{InstalledProduct, PackageStore};

/// In-memory [`PackageStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    installed: Vec<InstalledProduct>,
    global_tags: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store with an installed product.
    pub fn install(&self, product: InstalledProduct) {
        self.inner.lock().unwrap().installed.push(product);
    }

    pub fn global_tags(&self) -> Vec<String> {
        self.inner.lock().unwrap().global_tags.clone()
    }

    pub fn tags_of(&self, name: &str, version: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .installed
            .iter()
            .find(|p| p.name == name && p.version == version)
            .map(|p| p.tags.clone())
            .unwrap_or_default()
    }
}

impl PackageStore for MemoryStore {
    fn lookup(&self, name: &str, version: &str) -> Result<Option<InstalledProduct>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .installed
            .iter()
            .find(|p| p.name == name && p.version == version)
            .cloned())
    }

    fn register_tag(&self, tag: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.global_tags.iter().any(|t| t == tag) {
            inner.global_tags.push(tag.to_string());
        }
        Ok(())
    }

    fn assign_tag(&self, name: &str, version: &str, tag: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let product = inner
            .installed
            .iter_mut()
            .find(|p| p.name == name && p.version == version)
            .ok_or_else(|| StoreError::CommandFailed {
                command: format!("declare {name} {version}"),
                message: "no such product".to_string(),
            })?;
        if !product.tags.iter().any(|t| t == tag) {
            product.tags.push(tag.to_string());
        }
        Ok(())
    }
}

/// [`ScriptSource`] emitting trivial scripts with a controlled exit code.
#[derive(Debug, Default)]
pub struct StubScripts {
    fail: HashSet<String>,
}

impl StubScripts {
    /// Every product's script exits 0.
    pub fn passing() -> Self {
        Self::default()
    }

    /// Scripts for the named products exit 1; all others exit 0.
    pub fn failing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fail: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ScriptSource for StubScripts {
    fn render(&self, product: &Product, _deps: &[&Product], _product_dir: &Path) -> String {
        let code = i32::from(self.fail.contains(&product.name));
        format!(
            "#!/bin/sh\necho simulated build of {} {}\nexit {code}\n",
            product.name, product.version
        )
    }
}
