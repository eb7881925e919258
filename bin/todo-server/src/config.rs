//! Server configuration, loaded from environment variables at startup and
//! optionally overridden by command-line flags.

use std::time::Duration;

use anyhow::anyhow;
use clap::Parser;

use crate::models::Variant;

/// Runtime configuration for todo-server.
///
/// Every field has a default so the server works without any environment
/// variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8031"`).
    pub bind_address: String,

    /// SQLite database URL (default: `"sqlite://todo.db?mode=rwc"`).
    pub database_url: String,

    /// Upper bound on pooled database connections.
    pub max_connections: u32,

    /// Which deployment this process serves.
    pub variant: Variant,

    /// `tracing` filter string, e.g. `"info"` or `"debug,sqlx=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Directory for daily-rolling log files; stdout only when unset.
    pub log_dir: Option<String>,

    /// Comma-separated allowed origins; wildcard when unset.
    pub cors_allowed_origins: Option<String>,

    pub enable_swagger: bool,

    /// Shared secret the auth gateway presents in `x-gateway-token`.
    pub gateway_token: Option<String>,

    /// Grace period for in-flight requests after a shutdown signal.
    pub shutdown_timeout: Duration,
}

/// Command-line overrides; anything left out falls back to the environment.
#[derive(Parser, Debug)]
#[command(name = "todo-server", version, about = "Per-user task and time-log records over HTTP")]
pub struct Cli {
    /// Address to listen on, e.g. `0.0.0.0:8031`.
    #[arg(short = 'l', long = "listen")]
    pub listen: Option<String>,

    /// SQLite database URL.
    #[arg(short = 'd', long = "database-url")]
    pub database_url: Option<String>,

    /// Deployment variant: `task` or `log`.
    #[arg(long)]
    pub variant: Option<String>,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bind_address: env_or("TODO_BIND", "0.0.0.0:8031"),
            database_url: env_or("TODO_DATABASE_URL", "sqlite://todo.db?mode=rwc"),
            max_connections: parse_env("TODO_MAX_CONNECTIONS", 8),
            variant: parse_variant(&env_or("TODO_VARIANT", "task"))?,
            log_level: env_or("TODO_LOG", "info"),
            log_json: env_flag("TODO_LOG_JSON", false),
            log_dir: env_opt("TODO_LOG_DIR"),
            cors_allowed_origins: env_opt("TODO_CORS_ORIGINS"),
            enable_swagger: env_flag("TODO_ENABLE_SWAGGER", true),
            gateway_token: env_opt("TODO_GATEWAY_TOKEN"),
            shutdown_timeout: Duration::from_secs(parse_env("TODO_SHUTDOWN_TIMEOUT_SECS", 60)),
        })
    }

    /// Apply command-line overrides on top of the environment.
    pub fn merge_cli(mut self, cli: Cli) -> anyhow::Result<Self> {
        if let Some(listen) = cli.listen {
            self.bind_address = listen;
        }
        if let Some(url) = cli.database_url {
            self.database_url = url;
        }
        if let Some(variant) = cli.variant {
            self.variant = parse_variant(&variant)?;
        }
        Ok(self)
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_variant(raw: &str) -> anyhow::Result<Variant> {
    raw.parse().map_err(|e: String| anyhow!(e))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
pub(crate) fn test_config(variant: Variant) -> Config {
    Config {
        bind_address: "127.0.0.1:0".into(),
        database_url: "sqlite::memory:".into(),
        max_connections: 1,
        variant,
        log_level: "info".into(),
        log_json: false,
        log_dir: None,
        cors_allowed_origins: None,
        enable_swagger: false,
        gateway_token: None,
        shutdown_timeout: Duration::from_secs(1),
    }
}
