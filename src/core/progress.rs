//! Live build progress display
//!
//! Writes the product's version string character by character as a
//! liveness indicator, throttled to one character per tick step of real
//! time, continuing with dots once the version is spent. Purely
//! cosmetic: display failures are swallowed and never gate the build.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use crate::config::defaults;

use super::product::Product;

/// Factory for per-unit progress displays sharing one output stream.
#[derive(Debug)]
pub struct ProgressReporter<W: Write> {
    out: W,
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Begin the display for one unit.
    ///
    /// Writes the unit header and returns a guard; the guard's `Drop`
    /// emits a trailing newline if the unit is abandoned before
    /// [`UnitProgress::finish`], so the terminal is never left mid-line.
    pub fn start(&mut self, product: &Product) -> UnitProgress<'_, W> {
        let _ = write!(self.out, "{:>20}: ", product.name);
        let _ = self.out.flush();
        let now = Instant::now();
        UnitProgress {
            out: &mut self.out,
            name: product.name.clone(),
            buffer: format!("{} ", product.version),
            started: now,
            next_tick: now,
            done: false,
        }
    }
}

/// Progress display for a single unit.
pub struct UnitProgress<'a, W: Write> {
    out: &'a mut W,
    name: String,
    buffer: String,
    started: Instant,
    next_tick: Instant,
    done: bool,
}

impl<W: Write> UnitProgress<'_, W> {
    /// Advance the display up to the current wall clock.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        while self.next_tick <= now {
            if self.buffer.is_empty() {
                let _ = write!(self.out, ".");
            } else {
                let c = self.buffer.remove(0);
                let _ = write!(self.out, "{c}");
            }
            let _ = self.out.flush();
            self.next_tick += defaults::PROGRESS_TICK_STEP;
        }
    }

    /// Report the unit's outcome and close its display line.
    ///
    /// `logfile == None` means no build was performed because the unit
    /// was already installed. On failure the report includes elapsed
    /// time, exit code, log location and the last few log lines.
    pub fn finish(&mut self, retcode: i32, logfile: Option<&Path>) {
        // write out the full version string even if the build ended quickly
        if !self.buffer.is_empty() {
            let _ = write!(self.out, "{}", self.buffer);
            self.buffer.clear();
        }

        match logfile {
            None => {
                let _ = writeln!(self.out, "(already installed).");
            }
            Some(log) => {
                let elapsed = self.started.elapsed().as_secs_f64();
                if retcode == 0 {
                    let _ = writeln!(self.out, "ok ({elapsed:.1} sec).");
                } else {
                    let _ = writeln!(self.out, "ERROR ({elapsed:.1} sec).");
                    let _ = writeln!(self.out, "*** error building product {}.", self.name);
                    let _ = writeln!(self.out, "*** exit code = {retcode}");
                    let _ = writeln!(self.out, "*** log is in {}", log.display());
                    let _ = writeln!(self.out, "*** last few lines:");
                    for line in tail_lines(log, defaults::LOG_TAIL_LINES) {
                        let _ = writeln!(self.out, ":::::  {line}");
                    }
                }
            }
        }
        let _ = self.out.flush();
        self.done = true;
    }
}

impl<W: Write> Drop for UnitProgress<'_, W> {
    fn drop(&mut self) {
        if !self.done {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
        }
    }
}

/// Last `n` lines of a file, best effort: unreadable logs yield nothing.
fn tail_lines(path: &Path, n: usize) -> Vec<String> {
    let Ok(bytes) = std::fs::read(path) else {
        return Vec::new();
    };
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn product() -> Product {
        Product::new("afw", "22.0.1", "0123abcd")
    }

    #[test]
    fn test_header_is_right_aligned() {
        let mut out = Vec::new();
        {
            let mut reporter = ProgressReporter::new(&mut out);
            reporter.start(&product()).finish(0, None);
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(&format!("{:>20}: ", "afw")), "got: {text:?}");
    }

    #[test]
    fn test_ticks_type_out_version_then_dots() {
        let mut out = Vec::new();
        {
            let mut reporter = ProgressReporter::new(&mut out);
            let mut progress = reporter.start(&product());
            let start = progress.next_tick;
            // 10 steps: "22.0.1 " is 7 characters, then 3 filler dots
            progress.tick_at(start + Duration::from_secs(18));
            progress.finish(0, Some(Path::new("/tmp/x.log")));
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("22.0.1 ..."), "got: {text}");
    }

    #[test]
    fn test_quick_build_still_shows_full_version() {
        let mut out = Vec::new();
        {
            let mut reporter = ProgressReporter::new(&mut out);
            reporter.start(&product()).finish(0, Some(Path::new("/tmp/x.log")));
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("22.0.1 ok ("), "got: {text}");
    }

    #[test]
    fn test_already_installed_line() {
        let mut out = Vec::new();
        {
            let mut reporter = ProgressReporter::new(&mut out);
            reporter.start(&product()).finish(0, None);
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("(already installed).\n"), "got: {text}");
    }

    #[test]
    fn test_failure_report_includes_log_tail() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("_build.log");
        let body: String = (1..=15).map(|i| format!("line {i}\n")).collect();
        std::fs::write(&log, body).unwrap();

        let mut out = Vec::new();
        {
            let mut reporter = ProgressReporter::new(&mut out);
            reporter.start(&product()).finish(7, Some(&log));
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("ERROR ("));
        assert!(text.contains("*** error building product afw."));
        assert!(text.contains("*** exit code = 7"));
        assert!(text.contains(&format!("*** log is in {}", log.display())));
        // only the last 10 of 15 lines appear
        assert!(!text.contains(":::::  line 5\n"));
        assert!(text.contains(":::::  line 6"));
        assert!(text.contains(":::::  line 15"));
    }

    #[test]
    fn test_abandoned_unit_gets_trailing_newline() {
        let mut out = Vec::new();
        {
            let mut reporter = ProgressReporter::new(&mut out);
            let _progress = reporter.start(&product());
            // dropped without finish, as after an unexpected fault
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'), "got: {text:?}");
    }

    #[test]
    fn test_finish_suppresses_drop_newline() {
        let mut out = Vec::new();
        {
            let mut reporter = ProgressReporter::new(&mut out);
            let mut progress = reporter.start(&product());
            progress.finish(0, None);
        }
        let text = String::from_utf8(out).unwrap();
        assert!(!text.ends_with("\n\n"), "got: {text:?}");
    }
}
