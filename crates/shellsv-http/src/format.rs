//! Plain-text and JSON rendering for the mutating/inspecting endpoints
//! (`/start`, `/status`, `/kill`, `/restart`), plus the shared uptime
//! humanizer.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use shellsv_core::{ChildRun, Probe, SignalKind};
use shellsv_supervisor::StatusSnapshot;

/// Whether a response is rendered as `key: value` lines or as JSON, chosen
/// by the `format=json` query parameter (plain text is the default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            Some("json") => Format::Json,
            _ => Format::Text,
        }
    }
}

/// Turns a non-negative second count into the short form the plain-text
/// surface uses, e.g. `2s`, `3m4s`, `1h2m3s`. Zero-valued leading components
/// are omitted rather than printed as `0m`/`0h`.
pub fn humanize_uptime(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn opt_str(v: &Option<String>) -> String {
    v.clone().unwrap_or_else(|| "-".to_string())
}

fn opt_f64(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "-".to_string())
}

fn opt_u64(v: Option<u64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "-".to_string())
}

fn ports_field(ports: &[u16]) -> String {
    if ports.is_empty() {
        "-".to_string()
    } else {
        ports
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn uptime_field(run: &ChildRun) -> Option<String> {
    if run.is_running() {
        Some(humanize_uptime((Utc::now() - run.created_at).num_seconds()))
    } else {
        None
    }
}

/// Renders the `/start`, `/status`, `/restart` plain-text body.
pub fn render_snapshot_text(snapshot: &StatusSnapshot) -> String {
    let run = &snapshot.run;
    let probe = &snapshot.probe;
    let mut lines = vec![
        format!("status: {}", run.tag.as_str()),
        format!("pid: {}", run.pid),
        format!("uptime: {}", uptime_field(run).unwrap_or_else(|| "-".to_string())),
        format!("command: {}", run.command),
        format!("user: {}", opt_str(&probe.user)),
        format!("ports: {}", ports_field(&probe.ports)),
        format!("cpu: {}", opt_f64(probe.cpu_percent)),
        format!("mem_mb: {}", opt_f64(probe.mem_mb)),
        format!("threads: {}", opt_u64(probe.threads)),
        format!("open_files: {}", opt_u64(probe.open_files)),
        format!("connections: {}", opt_u64(probe.connections)),
        format!("children: {}", opt_u64(probe.children)),
        format!("env_count: {}", opt_u64(probe.env_count)),
    ];
    if let Some(stopped_at) = run.stopped_at {
        lines.push(format!(
            "stopped_at: {}",
            stopped_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        lines.push(format!(
            "exit_code: {}",
            run.exit_code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
        ));
        lines.push(format!(
            "kill_type: {}",
            run.kill_type.map(|k| k.as_str().to_string()).unwrap_or_else(|| "-".to_string())
        ));
    }
    lines.join("\n")
}

#[derive(Serialize)]
struct SnapshotJson<'a> {
    status: &'static str,
    pid: u32,
    uptime: Option<String>,
    command: &'a str,
    user: Option<String>,
    ports: &'a [u16],
    cpu: Option<f64>,
    mem_mb: Option<f64>,
    threads: Option<u64>,
    open_files: Option<u64>,
    connections: Option<u64>,
    children: Option<u64>,
    env_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stopped_at: Option<chrono::DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kill_type: Option<&'static str>,
    generation: u64,
}

/// Renders the same endpoints' JSON body, opted into via `format=json`.
pub fn render_snapshot_json(snapshot: &StatusSnapshot) -> serde_json::Value {
    let run = &snapshot.run;
    let probe = &snapshot.probe;
    let json = SnapshotJson {
        status: run.tag.as_str(),
        pid: run.pid,
        uptime: uptime_field(run),
        command: &run.command,
        user: probe.user.clone(),
        ports: &probe.ports,
        cpu: probe.cpu_percent,
        mem_mb: probe.mem_mb,
        threads: probe.threads,
        open_files: probe.open_files,
        connections: probe.connections,
        children: probe.children,
        env_count: probe.env_count,
        stopped_at: run.stopped_at,
        exit_code: run.exit_code,
        kill_type: run.kill_type.map(SignalKind::as_str),
        generation: run.generation,
    };
    serde_json::to_value(json).unwrap_or(serde_json::Value::Null)
}

/// Renders the `/kill` plain-text body, which carries a smaller, fixed field
/// set rather than the full snapshot.
pub fn render_kill_text(run: &ChildRun) -> String {
    format!(
        "status: {}\ntype: {}\nexit_code: {}\nstopped_at: {}",
        run.tag.as_str(),
        run.kill_type.map(|k| k.as_str()).unwrap_or("-"),
        run.exit_code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
        run.stopped_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| "-".to_string()),
    )
}

pub fn render_kill_json(run: &ChildRun) -> serde_json::Value {
    serde_json::json!({
        "status": run.tag.as_str(),
        "type": run.kill_type.map(SignalKind::as_str),
        "exit_code": run.exit_code,
        "stopped_at": run.stopped_at,
    })
}
