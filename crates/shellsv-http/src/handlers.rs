use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use shellsv_core::error::Result as CoreResult;
use shellsv_core::{ShellSvError, SignalKind};
use shellsv_log::LogFilter;
use shellsv_supervisor::StatusSnapshot;

use crate::error::ApiError;
use crate::format::{self, Format};
use crate::state::AppState;

type QueryMap = HashMap<String, String>;

fn query_format(query: &QueryMap) -> Format {
    Format::from_query(query.get("format").map(String::as_str))
}

fn render_snapshot(format: Format, snapshot: &StatusSnapshot) -> Response {
    match format {
        Format::Text => format::render_snapshot_text(snapshot).into_response(),
        Format::Json => axum::Json(format::render_snapshot_json(snapshot)).into_response(),
    }
}

/// `POST /start`: spawns the command and returns the settled status.
pub async fn start(
    State(state): State<AppState>,
    Query(query): Query<QueryMap>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let format = query_format(&query);
    let command = extract_command(&headers, &body).map_err(|e| ApiError::new(e, format))?;
    state
        .supervisor
        .start(command)
        .await
        .map_err(|e| ApiError::new(e, format))?;
    let snapshot = state
        .supervisor
        .status()
        .await
        .map_err(|e| ApiError::new(e, format))?;
    Ok(render_snapshot(format, &snapshot))
}

/// `GET /status`: reports the current (or most recent) run.
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<QueryMap>,
) -> Result<Response, ApiError> {
    let format = query_format(&query);
    let snapshot = state
        .supervisor
        .status()
        .await
        .map_err(|e| ApiError::new(e, format))?;
    Ok(render_snapshot(format, &snapshot))
}

/// `POST /kill?type=...`: signals and reaps the running child.
pub async fn kill(
    State(state): State<AppState>,
    Query(query): Query<QueryMap>,
) -> Result<Response, ApiError> {
    let format = query_format(&query);
    let signal = match query.get("type").map(String::as_str) {
        None => SignalKind::GracefulTerminate,
        Some(raw) => SignalKind::parse(raw).ok_or_else(|| {
            ApiError::new(
                ShellSvError::bad_request(format!("invalid kill type '{raw}'")),
                format,
            )
        })?,
    };
    let run = state
        .supervisor
        .kill(signal)
        .await
        .map_err(|e| ApiError::new(e, format))?;
    Ok(match format {
        Format::Text => format::render_kill_text(&run).into_response(),
        Format::Json => axum::Json(format::render_kill_json(&run)).into_response(),
    })
}

/// `POST /restart?timeout=...`: terminates then respawns the remembered command.
pub async fn restart(
    State(state): State<AppState>,
    Query(query): Query<QueryMap>,
) -> Result<Response, ApiError> {
    let format = query_format(&query);
    let timeout = match query.get("timeout") {
        None => 10,
        Some(raw) => parse_non_negative(raw, "timeout").map_err(|e| ApiError::new(e, format))?,
    };
    state
        .supervisor
        .restart(timeout)
        .await
        .map_err(|e| ApiError::new(e, format))?;
    let snapshot = state
        .supervisor
        .status()
        .await
        .map_err(|e| ApiError::new(e, format))?;
    Ok(render_snapshot(format, &snapshot))
}

/// `GET /logs?lines=...|seconds=...`: always plain text, regardless of `format`.
pub async fn logs(
    State(state): State<AppState>,
    Query(query): Query<QueryMap>,
) -> Result<Response, ApiError> {
    let format = Format::Text;
    let lines = query.get("lines");
    let seconds = query.get("seconds");
    if lines.is_some() && seconds.is_some() {
        return Err(ApiError::new(
            ShellSvError::bad_request("lines and seconds are mutually exclusive"),
            format,
        ));
    }
    let filter = if let Some(raw) = lines {
        LogFilter::LastN(parse_positive(raw, "lines").map_err(|e| ApiError::new(e, format))? as usize)
    } else if let Some(raw) = seconds {
        LogFilter::SinceSeconds(parse_positive(raw, "seconds").map_err(|e| ApiError::new(e, format))?)
    } else {
        LogFilter::All
    };

    let snapshot = state
        .supervisor
        .status()
        .await
        .map_err(|e| ApiError::new(e, format))?;
    let read = state
        .log_store
        .read(&snapshot.run.log_path, filter)
        .await
        .map_err(|e| ApiError::new(e, format))?;
    Ok((
        [(axum::http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        read.text_body,
    )
        .into_response())
}

/// `GET /health`: a fixed payload, never affected by `format`.
pub async fn health() -> Response {
    axum::Json(serde_json::json!({ "status": "healthy" })).into_response()
}

fn extract_command(headers: &HeaderMap, body: &[u8]) -> CoreResult<String> {
    let is_json = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
        #[derive(Deserialize)]
        struct StartBody {
            command: String,
        }
        let parsed: StartBody = serde_json::from_slice(body)
            .map_err(|e| ShellSvError::bad_request(format!("invalid JSON body: {e}")))?;
        Ok(parsed.command)
    } else {
        String::from_utf8(body.to_vec())
            .map_err(|_| ShellSvError::bad_request("request body is not valid UTF-8"))
    }
}

fn parse_positive(raw: &str, name: &str) -> CoreResult<u64> {
    let value: i64 = raw
        .parse()
        .map_err(|_| ShellSvError::bad_request(format!("{name} must be a positive integer")))?;
    if value <= 0 {
        return Err(ShellSvError::bad_request(format!(
            "{name} must be a positive integer"
        )));
    }
    Ok(value as u64)
}

fn parse_non_negative(raw: &str, name: &str) -> CoreResult<u64> {
    let value: i64 = raw.parse().map_err(|_| {
        ShellSvError::bad_request(format!("{name} must be a non-negative integer"))
    })?;
    if value < 0 {
        return Err(ShellSvError::bad_request(format!(
            "{name} must be a non-negative integer"
        )));
    }
    Ok(value as u64)
}
