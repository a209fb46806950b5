use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One captured output line, with millisecond-resolution UTC timestamp.
///
/// This is the unit LogStore appends to and reads from disk; see
/// `shellsv-log` for the on-disk format (one JSON object per line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub line: String,
}

impl LogRecord {
    pub fn new(timestamp: DateTime<Utc>, line: String) -> Self {
        Self { timestamp, line }
    }
}
