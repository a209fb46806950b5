use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use shellsv_core::{LogRecord, ShellSvError, error::Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::filter::LogFilter;

/// Result of a filtered log read (spec §4.1).
#[derive(Debug, Clone)]
pub struct ReadResult {
    pub total_records: usize,
    pub returned_records: usize,
    pub text_body: String,
}

/// Creates per-run log files, accepts lines from the output pump, and serves
/// filtered reads. Appends to a given path are serialized by a per-path
/// mutex; reads open the file read-only and never block a concurrent append.
pub struct LogStore {
    log_dir: PathBuf,
    writers: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl LogStore {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            writers: Mutex::new(HashMap::new()),
        }
    }

    /// Create a fresh, empty log file named from `created_at`, creating the
    /// log directory if needed. Same-second collisions get a disambiguating
    /// numeric suffix so the returned path is always unique.
    pub async fn create(&self, created_at: DateTime<Utc>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.log_dir)
            .await
            .with_context(|| format!("failed to create log directory {}", self.log_dir.display()))?;

        let base = created_at.format("%Y-%m-%d_%H-%M-%S").to_string();
        let mut candidate = self.log_dir.join(format!("{base}.log"));
        let mut suffix = 1u32;
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(_) => break,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    candidate = self.log_dir.join(format!("{base}_{suffix}.log"));
                    suffix += 1;
                }
                Err(e) => {
                    return Err(ShellSvError::from(anyhow::Error::new(e).context(format!(
                        "failed to create log file {}",
                        candidate.display()
                    ))));
                }
            }
        }

        tracing::debug!(path = %candidate.display(), "created log file");
        Ok(candidate)
    }

    /// Append one record, flushing immediately so concurrent readers observe it.
    pub async fn append(&self, path: &Path, line: &str, instant: DateTime<Utc>) -> Result<()> {
        let lock = self.writer_lock(path).await;
        let _guard = lock.lock().await;

        let record = LogRecord::new(instant, strip_line_ending(line).to_string());
        let mut serialized =
            serde_json::to_string(&record).context("failed to serialize log record")?;
        serialized.push('\n');

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .await
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        file.write_all(serialized.as_bytes())
            .await
            .with_context(|| format!("failed to append to log file {}", path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("failed to flush log file {}", path.display()))?;
        file.sync_data()
            .await
            .with_context(|| format!("failed to sync log file {}", path.display()))?;
        Ok(())
    }

    /// Scan `path` and return the records selected by `filter`.
    ///
    /// Malformed trailing (or interior) lines are skipped and do not count
    /// toward `total_records`. `SinceSeconds` samples "now" once per call.
    pub async fn read(&self, path: &Path, filter: LogFilter) -> Result<ReadResult> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(ShellSvError::not_found(format!(
                "log file not found: {}",
                path.display()
            )));
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read log file {}", path.display()))?;

        let records: Vec<LogRecord> = contents
            .lines()
            .filter(|line| !line.is_empty())
            .filter_map(|line| serde_json::from_str::<LogRecord>(line).ok())
            .collect();
        let total_records = records.len();

        let selected: Vec<LogRecord> = match filter {
            LogFilter::All => records,
            LogFilter::LastN(n) => {
                let skip = total_records.saturating_sub(n);
                records.into_iter().skip(skip).collect()
            }
            LogFilter::SinceSeconds(secs) => {
                let cutoff = Utc::now() - chrono::Duration::seconds(secs as i64);
                records
                    .into_iter()
                    .filter(|r| r.timestamp >= cutoff)
                    .collect()
            }
        };

        let returned_records = selected.len();
        let text_body = selected
            .iter()
            .map(|r| r.line.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ReadResult {
            total_records,
            returned_records,
            text_body,
        })
    }

    async fn writer_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut writers = self.writers.lock().await;
        writers
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn strip_line_ending(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .or_else(|| line.strip_suffix('\r'))
        .unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn create_returns_unique_path_on_collision() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let now = Utc::now();

        let first = store.create(now).await.unwrap();
        let second = store.create(now).await.unwrap();

        assert_ne!(first, second);
        assert!(first.exists());
        assert!(second.exists());
    }

    #[tokio::test]
    async fn append_then_read_all_round_trips_last_line() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let path = store.create(Utc::now()).await.unwrap();

        store.append(&path, "hello\n", Utc::now()).await.unwrap();
        store.append(&path, "world", Utc::now()).await.unwrap();

        let result = store.read(&path, LogFilter::All).await.unwrap();
        assert_eq!(result.total_records, 2);
        assert_eq!(result.returned_records, 2);
        assert_eq!(result.text_body, "hello\nworld");
    }

    #[tokio::test]
    async fn read_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let missing = dir.path().join("nope.log");

        let err = store.read(&missing, LogFilter::All).await.unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn last_n_returns_fewer_when_file_has_fewer_records() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let path = store.create(Utc::now()).await.unwrap();

        store.append(&path, "one", Utc::now()).await.unwrap();
        store.append(&path, "two", Utc::now()).await.unwrap();

        let result = store.read(&path, LogFilter::LastN(10)).await.unwrap();
        assert_eq!(result.returned_records, 2);
        assert_eq!(result.text_body, "one\ntwo");
    }

    #[tokio::test]
    async fn last_n_on_empty_file_returns_empty_body() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let path = store.create(Utc::now()).await.unwrap();

        let result = store.read(&path, LogFilter::LastN(1)).await.unwrap();
        assert_eq!(result.total_records, 0);
        assert_eq!(result.returned_records, 0);
        assert_eq!(result.text_body, "");
    }

    #[tokio::test]
    async fn since_seconds_excludes_old_records() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let path = store.create(Utc::now()).await.unwrap();

        let old = Utc::now() - chrono::Duration::seconds(120);
        store.append(&path, "old", old).await.unwrap();
        store.append(&path, "fresh", Utc::now()).await.unwrap();

        let result = store.read(&path, LogFilter::SinceSeconds(5)).await.unwrap();
        assert_eq!(result.total_records, 2);
        assert_eq!(result.returned_records, 1);
        assert_eq!(result.text_body, "fresh");
    }

    #[tokio::test]
    async fn malformed_trailing_line_is_skipped() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let path = store.create(Utc::now()).await.unwrap();

        store.append(&path, "good", Utc::now()).await.unwrap();
        tokio::fs::write(&path, {
            let mut existing = tokio::fs::read_to_string(&path).await.unwrap();
            existing.push_str("{not valid json\n");
            existing
        })
        .await
        .unwrap();

        let result = store.read(&path, LogFilter::All).await.unwrap();
        assert_eq!(result.total_records, 1);
        assert_eq!(result.text_body, "good");
    }

    #[tokio::test]
    async fn concurrent_appends_to_same_path_do_not_interleave() {
        let dir = tempdir().unwrap();
        let store = Arc::new(LogStore::new(dir.path()));
        let path = store.create(Utc::now()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append(&path, &format!("line-{i}"), Utc::now())
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let result = store.read(&path, LogFilter::All).await.unwrap();
        assert_eq!(result.total_records, 20);
    }
}
