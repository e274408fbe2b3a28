//! Build script generation
//!
//! Renders the per-product shell script that drives the eupspkg build
//! lifecycle. Rendering is a pure function of the product, its exact
//! flattened dependencies and a few paths; every substituted token is
//! shell-quoted.

use std::fmt::Write as _;
use std::path::Path;

use crate::config::BuildConfig;
use crate::config::defaults;

use super::product::Product;

/// Source of build scripts; a seam so tests can substitute trivial ones.
pub trait ScriptSource {
    /// Render the script that builds `product` in `product_dir`.
    fn render(&self, product: &Product, deps: &[&Product], product_dir: &Path) -> String;
}

/// Production script source, parameterized by the EUPS installation.
#[derive(Debug, Clone)]
pub struct EupsScript {
    eups_dir: String,
    eups_path: String,
}

impl EupsScript {
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            eups_dir: config.eups_dir.display().to_string(),
            eups_path: config.eups_path.clone(),
        }
    }
}

impl ScriptSource for EupsScript {
    fn render(&self, product: &Product, deps: &[&Product], product_dir: &Path) -> String {
        render_script(product, deps, product_dir, &self.eups_dir, &self.eups_path)
    }
}

/// Render the build script text.
///
/// The script merges stderr into stdout so one stream is observed, stops
/// on the first failing command, restores a pristine working tree while
/// sparing its own `_build.*` files, pins the exact dependency versions,
/// then walks the eupspkg phases prep/config/build/install/decl. Unit
/// test failures recorded under `tests/.tests` abort before install, and
/// the content fingerprint is appended to the installed product's
/// metadata as provenance.
pub fn render_script(
    product: &Product,
    deps: &[&Product],
    product_dir: &Path,
    eups_dir: &str,
    eups_path: &str,
) -> String {
    let name = sh_quote(&product.name);
    let version = sh_quote(&product.version);
    let sha1 = sh_quote(&product.sha1);
    let dir = sh_quote(&product_dir.display().to_string());
    let setups_sh = sh_quote(&format!("{eups_dir}/bin/setups.sh"));
    let eups_path = sh_quote(eups_path);

    // lines start with a tab: the <<-EOF heredoc strips it back out
    let mut pins = String::new();
    for dep in deps {
        let _ = writeln!(pins, "\t{:<20} {}", dep.name, dep.version);
    }

    let mut s = String::new();
    let w = &mut s;
    let _ = writeln!(w, "#!/bin/bash");
    let _ = writeln!(w);
    let _ = writeln!(w, "# merge stderr into the observed stream");
    let _ = writeln!(w, "exec 2>&1");
    let _ = writeln!(w);
    let _ = writeln!(w, "# stop on any error");
    let _ = writeln!(w, "set -ex");
    let _ = writeln!(w);
    let _ = writeln!(w, "export GIT_TERMINAL_PROMPT=0");
    let _ = writeln!(w);
    let _ = writeln!(w, "# define the setup command, but preserve EUPS_PATH");
    let _ = writeln!(w, ". {setups_sh}");
    let _ = writeln!(w, "export EUPS_PATH={eups_path}");
    let _ = writeln!(w);
    let _ = writeln!(w, "cd {dir}");
    let _ = writeln!(w);
    let _ = writeln!(w, "# clean up the working directory");
    let _ = writeln!(w, "git reset --hard");
    let _ = writeln!(w, "git clean -d -f -q -x -e '_build.*'");
    let _ = writeln!(w);
    let _ = writeln!(
        w,
        "eupspkg PRODUCT={name} VERSION={version} FLAVOR=generic prep"
    );
    let _ = writeln!(w);
    let _ = writeln!(w, "# pin the exact versions of all dependencies");
    let _ = writeln!(w, "cat > {} <<-EOF", defaults::TAGS_FILENAME);
    let _ = write!(w, "{pins}");
    let _ = writeln!(w, "EOF");
    let _ = writeln!(w, "set +x");
    let _ = writeln!(w, "setup --vro={} -r .", defaults::TAGS_FILENAME);
    let _ = writeln!(w, "set -x");
    let _ = writeln!(w);
    let _ = writeln!(
        w,
        "eupspkg PRODUCT={name} VERSION={version} FLAVOR=generic config"
    );
    let _ = writeln!(
        w,
        "eupspkg PRODUCT={name} VERSION={version} FLAVOR=generic build"
    );
    let _ = writeln!(w, "if [ -d tests/.tests ] && \\");
    let _ = writeln!(
        w,
        "    [ \"`ls tests/.tests/*.failed 2> /dev/null | wc -l`\" -ne 0 ]; then"
    );
    let _ = writeln!(w, "    echo \"*** Failed unit tests.\"");
    let _ = writeln!(w, "    exit 1");
    let _ = writeln!(w, "fi");
    let _ = writeln!(
        w,
        "eupspkg PRODUCT={name} VERSION={version} FLAVOR=generic install"
    );
    let _ = writeln!(w);
    let _ = writeln!(w, "# declare to EUPS");
    let _ = writeln!(
        w,
        "eupspkg PRODUCT={name} VERSION={version} FLAVOR=generic decl"
    );
    let _ = writeln!(w);
    let _ = writeln!(w, "# record provenance on the installed product");
    let _ = writeln!(
        w,
        "echo SHA1={sha1} >> \"$(eups list {name} {version} -d)/ups/pkginfo\""
    );
    s
}

/// Quote a string for safe interpolation into a shell command.
///
/// Returns the input unchanged when it consists only of safe characters,
/// otherwise wraps it in single quotes with embedded quotes escaped.
pub fn sh_quote(s: &str) -> String {
    const SAFE: &str =
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_@%+=:,./-";
    if !s.is_empty() && s.chars().all(|c| SAFE.contains(c)) {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}
