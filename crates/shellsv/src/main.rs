use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use shellsv_http::AppState;
use shellsv_log::LogStore;
use shellsv_resource::SysinfoProbeSource;
use shellsv_supervisor::Supervisor;

mod cli;
mod config;

use cli::Cli;
use config::ShellSvConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let config = ShellSvConfig::load(&cli);

    let cwd = std::env::current_dir().context("failed to determine working directory")?;
    let log_store = Arc::new(LogStore::new(cwd.join(&config.log_dir)));
    let probe_source = Arc::new(SysinfoProbeSource::new());
    let supervisor = Arc::new(Supervisor::new(log_store, probe_source, cwd));

    let app = shellsv_http::build_router(AppState::new(supervisor.clone()));

    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind shellsv HTTP listener at {bind_addr}"))?;
    let local_addr = listener.local_addr().context("failed to resolve local address")?;
    tracing::info!(addr = %local_addr, log_dir = %config.log_dir, "shellsv listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("shellsv HTTP server stopped with an error")?;

    supervisor.shutdown().await;
    Ok(())
}

/// Waits for Ctrl-C or SIGTERM so the supervisor can terminate its child
/// before the process exits (spec §4.4 "on shutdown of the supervisor
/// process itself").
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, terminating supervised child");
}
