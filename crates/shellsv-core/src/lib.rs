//! Shared types for the shellsv process supervisor: the `ChildRun` record,
//! log records, resource probes, and the error kinds the HTTP surface maps
//! to status codes.

pub mod error;
pub mod probe;
pub mod record;
pub mod run;

pub use error::ShellSvError;
pub use probe::{Probe, ProbeSource};
pub use record::LogRecord;
pub use run::{ChildRun, RunTag, SignalKind};
