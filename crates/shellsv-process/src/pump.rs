//! Moves a child's stdout and stderr into [`LogStore`] line-by-line until
//! EOF (spec §4.2).
//!
//! The two streams are pumped concurrently rather than through a single
//! OS-level merged pipe: lines from either stream are appended to the same
//! log file in arrival order, which is what "merged output" means to a
//! caller reading the log back. This mirrors the teacher's own dual-stream
//! tee idiom in `csa-process::wait_and_capture` (concurrent `tokio::select!`
//! over both handles) rather than plumbing a raw shared fd.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use shellsv_log::LogStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::task::JoinHandle;

/// Background task handle for one child's output pump. Exactly one exists
/// per `ChildRun` (spec §4.2).
pub struct OutputPump;

impl OutputPump {
    /// Spawn the pump task. Reading blocks on the child's output and must
    /// never hold any supervisor lock (spec §5) — this task touches nothing
    /// but `log_store` and the pipes it owns.
    pub fn spawn(
        stdout: ChildStdout,
        stderr: ChildStderr,
        log_store: Arc<LogStore>,
        log_path: PathBuf,
    ) -> JoinHandle<()> {
        tokio::spawn(pump_loop(stdout, stderr, log_store, log_path))
    }
}

async fn pump_loop(
    stdout: ChildStdout,
    stderr: ChildStderr,
    log_store: Arc<LogStore>,
    log_path: PathBuf,
) {
    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_reader = BufReader::new(stderr);
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let mut stdout_done = false;
    let mut stderr_done = false;

    while !stdout_done || !stderr_done {
        tokio::select! {
            result = stdout_reader.read_until(b'\n', &mut stdout_buf), if !stdout_done => {
                stdout_done = !handle_chunk(result, &mut stdout_buf, &log_store, &log_path, "stdout").await;
            }
            result = stderr_reader.read_until(b'\n', &mut stderr_buf), if !stderr_done => {
                stderr_done = !handle_chunk(result, &mut stderr_buf, &log_store, &log_path, "stderr").await;
            }
        }
    }

    tracing::debug!(path = %log_path.display(), "output pump finished");
}

/// Handle one `read_until` result. Returns `false` once the stream is done
/// (EOF or an unrecoverable read error) so the caller can stop polling it.
async fn handle_chunk(
    result: std::io::Result<usize>,
    buf: &mut Vec<u8>,
    log_store: &Arc<LogStore>,
    log_path: &std::path::Path,
    stream_name: &'static str,
) -> bool {
    match result {
        Ok(0) => false,
        Ok(_) => {
            let instant = Utc::now();
            // Non-UTF-8 bytes are replaced with U+FFFD rather than crashing
            // the pump on binary output (spec §4.2).
            let line = String::from_utf8_lossy(buf).into_owned();
            buf.clear();
            if let Err(error) = log_store.append(log_path, &line, instant).await {
                tracing::warn!(%error, stream = stream_name, "failed to append log record");
            }
            true
        }
        Err(error) => {
            tracing::warn!(%error, stream = stream_name, "output pump read error, treating as EOF");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellsv_log::LogFilter;
    use std::process::Stdio;
    use tempfile::tempdir;
    use tokio::process::Command;

    #[tokio::test]
    async fn pumps_both_streams_into_one_log_file() {
        let dir = tempdir().unwrap();
        let store = Arc::new(LogStore::new(dir.path()));
        let path = store.create(Utc::now()).await.unwrap();

        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg("echo out-line; echo err-line 1>&2")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let stdout = child.stdout.take().unwrap();
        let stderr = child.stderr.take().unwrap();

        let handle = OutputPump::spawn(stdout, stderr, store.clone(), path.clone());
        child.wait().await.unwrap();
        handle.await.unwrap();

        let result = store.read(&path, LogFilter::All).await.unwrap();
        assert_eq!(result.total_records, 2);
        assert!(result.text_body.contains("out-line"));
        assert!(result.text_body.contains("err-line"));
    }

    #[tokio::test]
    async fn binary_output_is_replaced_not_fatal() {
        let dir = tempdir().unwrap();
        let store = Arc::new(LogStore::new(dir.path()));
        let path = store.create(Utc::now()).await.unwrap();

        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg("printf 'bad \\xff byte\\n'")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let stdout = child.stdout.take().unwrap();
        let stderr = child.stderr.take().unwrap();

        let handle = OutputPump::spawn(stdout, stderr, store.clone(), path.clone());
        child.wait().await.unwrap();
        handle.await.unwrap();

        let result = store.read(&path, LogFilter::All).await.unwrap();
        assert_eq!(result.total_records, 1);
        assert!(result.text_body.contains('\u{FFFD}'));
    }
}
