//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::executor::ExecutionContext;
use crate::resource::default_readme_path;
use crate::security::ShellPolicy;

/// MCP terminal server: runs shell commands and serves a readme over stdio.
#[derive(Parser, Debug)]
#[command(name = "mcp-terminal-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Seconds a command may run before it is killed
    #[arg(long, env = "MCP_TERMINAL_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Path of the file served as readme://mcp (default: mcpreadme.md next to the executable)
    #[arg(long, env = "MCP_TERMINAL_README")]
    pub readme: Option<PathBuf>,

    /// Directory commands run in (default: the server's working directory)
    #[arg(long, env = "MCP_TERMINAL_WORKDIR")]
    pub working_dir: Option<PathBuf>,

    /// Pass commands to the shell untouched, including pipes, redirection and substitution
    #[arg(long, env = "MCP_TERMINAL_UNRESTRICTED")]
    pub unrestricted: bool,

    /// Log filter directive, e.g. "info" or "mcp_terminal_server=debug"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("timeout must be at least one second")]
    ZeroTimeout,
    #[error("working directory '{0}' is not a directory")]
    NotADirectory(PathBuf),
}

/// Resolved settings handed to the server at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub execution: ExecutionContext,
    pub readme_path: PathBuf,
    pub policy: ShellPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            execution: ExecutionContext::default(),
            readme_path: default_readme_path(),
            policy: ShellPolicy::default(),
        }
    }
}

impl TryFrom<&Cli> for ServerConfig {
    type Error = ConfigError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        if cli.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if let Some(ref dir) = cli.working_dir {
            if !dir.is_dir() {
                return Err(ConfigError::NotADirectory(dir.clone()));
            }
        }

        Ok(Self {
            execution: ExecutionContext {
                timeout: Duration::from_secs(cli.timeout_secs),
                working_dir: cli.working_dir.clone(),
            },
            readme_path: cli.readme.clone().unwrap_or_else(default_readme_path),
            policy: ShellPolicy::from_flag(cli.unrestricted),
        })
    }
}
