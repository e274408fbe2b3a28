//! Manifest (manifest.txt) parsing and the dependency index
//!
//! The manifest is produced by an upstream resolution step and lists the
//! products of one build, already topologically ordered. Format:
//!
//! ```text
//! # comment
//! BUILD=b4821
//! base     8f31c2d4  1.0
//! utils    03ab99e1  2.1   base
//! pipeline 77cd10f2  0.9   base,utils
//! ```
//!
//! Columns are whitespace-separated: name, content fingerprint, exact
//! version, then an optional comma-separated list of immediate
//! dependencies. A dependency must be declared on an earlier line.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::ManifestError;

use super::product::Product;

/// The parsed manifest: an optional build tag plus the product index.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Tag identifying this end-to-end build (the `BUILD=` line), if any
    pub build_id: Option<String>,
    /// Products in build order with their dependency edges
    pub index: ProductIndex,
}

impl Manifest {
    /// Parse a manifest from its textual form.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let mut build_id: Option<String> = None;
        let mut index = ProductIndex::default();

        for (line_no, raw) in content.lines().enumerate() {
            let line_no = line_no + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(tag) = line.strip_prefix("BUILD=") {
                if build_id.is_some() {
                    return Err(ManifestError::Malformed {
                        line: line_no,
                        message: "duplicate BUILD= line".to_string(),
                    });
                }
                if tag.is_empty() {
                    return Err(ManifestError::Malformed {
                        line: line_no,
                        message: "empty BUILD= line".to_string(),
                    });
                }
                build_id = Some(tag.to_string());
                continue;
            }

            let mut fields = line.split_whitespace();
            let (name, sha1, version) = match (fields.next(), fields.next(), fields.next()) {
                (Some(n), Some(s), Some(v)) => (n, s, v),
                _ => {
                    return Err(ManifestError::Malformed {
                        line: line_no,
                        message: format!("expected 'name sha1 version [deps]', got '{line}'"),
                    })
                }
            };
            let dependencies: Vec<String> = fields
                .next()
                .map(|d| d.split(',').map(str::to_string).collect())
                .unwrap_or_default();

            index.insert(
                line_no,
                Product::new(name, version, sha1),
                dependencies,
            )?;
        }

        Ok(Self { build_id, index })
    }

    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.is_file() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::IoError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }
}

/// Products in build order, with dependency edges for flattening.
#[derive(Debug, Clone, Default)]
pub struct ProductIndex {
    products: Vec<Product>,
    by_name: HashMap<String, usize>,
    dependencies: HashMap<String, Vec<String>>,
}

impl ProductIndex {
    fn insert(
        &mut self,
        line_no: usize,
        product: Product,
        dependencies: Vec<String>,
    ) -> Result<(), ManifestError> {
        if self.by_name.contains_key(&product.name) {
            return Err(ManifestError::DuplicateProduct {
                line: line_no,
                name: product.name,
            });
        }
        for dep in &dependencies {
            if !self.by_name.contains_key(dep) {
                return Err(ManifestError::UnknownDependency {
                    line: line_no,
                    product: product.name,
                    dependency: dep.clone(),
                });
            }
        }
        self.by_name.insert(product.name.clone(), self.products.len());
        self.dependencies.insert(product.name.clone(), dependencies);
        self.products.push(product);
        Ok(())
    }

    /// All products, in build order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by name.
    pub fn get(&self, name: &str) -> Option<&Product> {
        self.by_name.get(name).map(|&i| &self.products[i])
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// The transitive dependency closure of `product`, exact versions,
    /// dependencies before dependents, deduplicated, excluding the
    /// product itself.
    pub fn flat_dependencies(&self, product: &Product) -> Vec<&Product> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect(&product.name, &mut seen, &mut out);
        out
    }

    fn collect<'a>(
        &'a self,
        name: &str,
        seen: &mut HashSet<String>,
        out: &mut Vec<&'a Product>,
    ) {
        let Some(deps) = self.dependencies.get(name) else {
            return;
        };
        for dep in deps {
            if seen.contains(dep) {
                continue;
            }
            seen.insert(dep.clone());
            self.collect(dep, seen, out);
            if let Some(&i) = self.by_name.get(dep) {
                out.push(&self.products[i]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# three products, diamond dependency
BUILD=b77
base     8f31c2d4 1.0
utils    03ab99e1 2.1 base
helpers  5510aa0c 0.3 base
pipeline 77cd10f2 0.9 utils,helpers
";

    #[test]
    fn test_parse_build_id_and_order() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.build_id.as_deref(), Some("b77"));
        let names: Vec<&str> = manifest
            .index
            .products()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["base", "utils", "helpers", "pipeline"]);
    }

    #[test]
    fn test_parse_without_build_line() {
        let manifest = Manifest::parse("base 8f31c2d4 1.0\n").unwrap();
        assert!(manifest.build_id.is_none());
        assert_eq!(manifest.index.len(), 1);
    }

    #[test]
    fn test_flat_dependencies_are_transitive_and_deduplicated() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        let pipeline = manifest.index.get("pipeline").unwrap();
        let deps: Vec<&str> = manifest
            .index
            .flat_dependencies(pipeline)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        // base appears once, before both products that need it
        assert_eq!(deps, ["base", "utils", "helpers"]);
    }

    #[test]
    fn test_flat_dependencies_of_leaf_is_empty() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        let base = manifest.index.get("base").unwrap();
        assert!(manifest.index.flat_dependencies(base).is_empty());
    }

    #[test]
    fn test_dependency_versions_are_exact() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        let utils = manifest.index.get("utils").unwrap();
        let deps = manifest.index.flat_dependencies(utils);
        assert_eq!(deps[0].version, "1.0");
        assert_eq!(deps[0].sha1, "8f31c2d4");
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let result = Manifest::parse("utils 03ab99e1 2.1 base\n");
        assert!(matches!(
            result,
            Err(ManifestError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_duplicate_product_is_rejected() {
        let result = Manifest::parse("base 8f31c2d4 1.0\nbase 8f31c2d4 1.0\n");
        assert!(matches!(result, Err(ManifestError::DuplicateProduct { .. })));
    }

    #[test]
    fn test_short_line_is_rejected() {
        let result = Manifest::parse("base 8f31c2d4\n");
        assert!(matches!(result, Err(ManifestError::Malformed { line: 1, .. })));
    }

    #[test]
    fn test_duplicate_build_line_is_rejected() {
        let result = Manifest::parse("BUILD=b1\nBUILD=b2\n");
        assert!(matches!(result, Err(ManifestError::Malformed { line: 2, .. })));
    }

    #[test]
    fn test_comments_and_blank_lines_are_ignored() {
        let manifest = Manifest::parse("# header\n\nbase 8f31c2d4 1.0\n").unwrap();
        assert_eq!(manifest.index.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Manifest::load(Path::new("/nonexistent/manifest.txt"));
        assert!(matches!(result, Err(ManifestError::NotFound { .. })));
    }
}
