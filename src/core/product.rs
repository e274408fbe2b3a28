//! Product descriptors
//!
//! A product is one package/version resolved from the manifest. It is
//! immutable for the duration of a run; within one manifest a name
//! identifies exactly one product.

use serde::{Deserialize, Serialize};

/// One package to be built, as resolved from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Package name; unique within a manifest
    pub name: String,
    /// Exact resolved version
    pub version: String,
    /// Content fingerprint of the sources this version was resolved from
    pub sha1: String,
}

impl Product {
    /// Create a product descriptor.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        sha1: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            sha1: sha1.into(),
        }
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}
