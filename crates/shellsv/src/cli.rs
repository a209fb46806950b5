use clap::Parser;

/// A single-session process supervisor exposed over a local HTTP API.
#[derive(Debug, Parser)]
#[command(name = "shellsv", version)]
pub struct Cli {
    /// Address to bind the HTTP listener to. Overrides `LLM_SHELL_HOST`.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the HTTP listener to. Overrides `LLM_SHELL_PORT`.
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory to write per-run log files into. Overrides `LLM_SHELL_LOG_DIR`.
    #[arg(long = "log-dir")]
    pub log_dir: Option<String>,
}
