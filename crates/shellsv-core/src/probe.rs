use serde::Serialize;

/// Point-in-time snapshot of a live process's resource usage.
///
/// Every field is independently best-effort: a field that could not be
/// determined is `None` ("unavailable"), it does not fail the whole probe.
/// A probe on an unknown or dead PID is `Probe::default()` — every field
/// `None`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Probe {
    pub cpu_percent: Option<f64>,
    pub mem_mb: Option<f64>,
    pub threads: Option<u64>,
    pub open_files: Option<u64>,
    pub connections: Option<u64>,
    pub children: Option<u64>,
    /// Unique, ascending listening TCP ports.
    pub ports: Vec<u16>,
    pub user: Option<String>,
    pub env_count: Option<u64>,
}

/// Queries resource usage for a live PID. Implemented by `shellsv-resource`;
/// kept as a trait here so the supervisor can depend on the interface
/// without pulling in `sysinfo`/`/proc` parsing directly.
pub trait ProbeSource: Send + Sync {
    fn probe(&self, pid: u32) -> Probe;
}
