//! Build script execution and log streaming
//!
//! Runs a generated build script as a child process and tees its output,
//! one timestamped line at a time, into a persistent log file. The drain
//! loop never blocks unboundedly: each read carries a bounded timeout,
//! and the timeout branch yields to the caller's idle callback (the
//! progress tick). The two activities interleave cooperatively on one
//! thread of control; the only suspension point is the timed read.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::config::defaults;
use crate::error::BuildError;

/// Execute `script` in `workdir`, streaming its output into `log_path`.
///
/// Returns the child's exit code (`-1` when it was killed by a signal).
/// The generated script merges stderr into stdout as its first action,
/// so draining the stdout pipe observes the full interleaved stream.
/// `on_idle` is invoked once per poll interval that passes without
/// output.
pub async fn run_script(
    script: &Path,
    workdir: &Path,
    log_path: &Path,
    on_idle: impl FnMut(),
) -> Result<i32, BuildError> {
    let mut log = std::fs::File::create(log_path).map_err(|e| BuildError::IoError {
        path: log_path.to_path_buf(),
        error: e.to_string(),
    })?;

    let mut child = Command::new(script)
        .current_dir(workdir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BuildError::Launch {
            path: script.to_path_buf(),
            error: e.to_string(),
        })?;

    let mut stdout = child.stdout.take().ok_or_else(|| BuildError::Launch {
        path: script.to_path_buf(),
        error: "stdout pipe unavailable".to_string(),
    })?;

    stream_to_log(&mut stdout, &mut log, on_idle)
        .await
        .map_err(|e| BuildError::IoError {
            path: log_path.to_path_buf(),
            error: e.to_string(),
        })?;

    let status = child.wait().await.map_err(|e| BuildError::Launch {
        path: script.to_path_buf(),
        error: e.to_string(),
    })?;
    Ok(status.code().unwrap_or(-1))
}

/// Tee `reader` into `log`, one line at a time.
///
/// Bytes are read one at a time and accumulated; on a newline or end of
/// stream the accumulated line is prefixed with the UTC timestamp at
/// which it was observed and appended to the log. A zero-length read
/// ends the loop, flushing any unterminated final line first. When no
/// byte arrives within the poll interval, `on_idle` runs once.
pub async fn stream_to_log<R>(
    reader: &mut R,
    log: &mut impl Write,
    mut on_idle: impl FnMut(),
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut line: Vec<u8> = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match tokio::time::timeout(defaults::OUTPUT_POLL_INTERVAL, reader.read(&mut byte)).await {
            Ok(Ok(0)) => {
                if !line.is_empty() {
                    write_line(log, &line)?;
                }
                break;
            }
            Ok(Ok(_)) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    write_line(log, &line)?;
                    line.clear();
                }
            }
            Ok(Err(e)) => return Err(e),
            Err(_elapsed) => on_idle(),
        }
    }
    log.flush()
}

fn write_line(log: &mut impl Write, line: &[u8]) -> std::io::Result<()> {
    let stamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f");
    write!(log, "[{stamp}Z] {}", String::from_utf8_lossy(line))
}
