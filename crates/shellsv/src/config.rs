use crate::cli::Cli;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_DIR: &str = "logs";

/// Resolved listen address and log directory: CLI flag, then `LLM_SHELL_*`
/// environment variable, then the built-in default (spec §9.2).
#[derive(Debug, Clone)]
pub struct ShellSvConfig {
    pub host: String,
    pub port: u16,
    pub log_dir: String,
}

impl ShellSvConfig {
    pub fn load(cli: &Cli) -> Self {
        let host = cli
            .host
            .clone()
            .or_else(|| std::env::var("LLM_SHELL_HOST").ok())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = cli
            .port
            .or_else(|| {
                std::env::var("LLM_SHELL_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(DEFAULT_PORT);

        let log_dir = cli
            .log_dir
            .clone()
            .or_else(|| std::env::var("LLM_SHELL_LOG_DIR").ok())
            .unwrap_or_else(|| DEFAULT_LOG_DIR.to_string());

        Self { host, port, log_dir }
    }
}
