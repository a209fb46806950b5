use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which OS signal a `kill` call used, independent of how the child actually died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalKind {
    /// SIGTERM: ask the child to shut down.
    GracefulTerminate,
    /// SIGKILL: the child is terminated immediately, no cleanup.
    ForceKill,
}

impl SignalKind {
    /// The raw signal number this kind sends on Unix.
    pub fn as_raw(self) -> i32 {
        match self {
            SignalKind::GracefulTerminate => libc::SIGTERM,
            SignalKind::ForceKill => libc::SIGKILL,
        }
    }

    /// The name used in the `type` query parameter and in plain-text/JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::GracefulTerminate => "SIGTERM",
            SignalKind::ForceKill => "SIGKILL",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "SIGTERM" => Some(SignalKind::GracefulTerminate),
            "SIGKILL" => Some(SignalKind::ForceKill),
            _ => None,
        }
    }
}

/// Final-state tag of a [`ChildRun`]. `Running` is the only non-terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunTag {
    Running,
    Exited,
    Killed,
}

impl RunTag {
    pub fn as_str(self) -> &'static str {
        match self {
            RunTag::Running => "running",
            RunTag::Exited => "exited",
            RunTag::Killed => "killed",
        }
    }
}

/// One invocation of a command under supervision.
///
/// Created by `Supervisor::start`, mutated only by the supervisor when it
/// observes termination or issues a signal, and never mutated again once
/// `tag` leaves `Running`.
#[derive(Debug, Clone, Serialize)]
pub struct ChildRun {
    /// The command verbatim, as passed in (not re-quoted or normalized).
    pub command: String,
    pub pid: u32,
    pub created_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    /// Negative values encode "died from signal N" as `-N`, matching the
    /// convention `std::process::ExitStatus` lacks on its own.
    pub exit_code: Option<i32>,
    pub kill_type: Option<SignalKind>,
    pub log_path: PathBuf,
    pub tag: RunTag,
    /// Monotonic per-process counter, incremented once per successful start.
    /// Lets a caller tell two different runs apart even if the OS recycles a PID.
    pub generation: u64,
}

impl ChildRun {
    pub fn is_running(&self) -> bool {
        self.tag == RunTag::Running
    }

    /// Mark the run terminated. Idempotent: once `stopped_at`/`exit_code` are
    /// set they are never overwritten (mirrors the "never mutated after
    /// terminal" invariant — callers must not call this twice with different
    /// values, but doing so harmlessly keeps the first observation here).
    pub fn mark_terminated(&mut self, tag: RunTag, exit_code: i32, at: DateTime<Utc>) {
        if self.stopped_at.is_some() {
            return;
        }
        self.tag = tag;
        self.exit_code = Some(exit_code);
        self.stopped_at = Some(at);
    }
}
