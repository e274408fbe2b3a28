//! Default configuration values

use std::time::Duration;

/// Generated build script filename, inside each product directory
pub const SCRIPT_FILENAME: &str = "_build.sh";

/// Timestamped build log filename, inside each product directory
pub const LOG_FILENAME: &str = "_build.log";

/// Exact-dependency pin file written by the build script
pub const TAGS_FILENAME: &str = "_build.tags";

/// Run-level status record filename, inside the build directory
pub const STATUS_FILENAME: &str = "status.yaml";

/// Manifest filename, inside the build directory
pub const MANIFEST_FILENAME: &str = "manifest.txt";

/// PR context filename, inside the build directory
pub const PR_INFO_FILENAME: &str = "pr_info.json";

/// Bounded wait for child output before yielding a progress tick
pub const OUTPUT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Virtual-clock increment per emitted progress character
pub const PROGRESS_TICK_STEP: Duration = Duration::from_secs(2);

/// Number of log lines echoed in a failure report
pub const LOG_TAIL_LINES: usize = 10;

/// GitHub API root for status notification
pub const GITHUB_API_ROOT: &str = "https://api.github.com";
