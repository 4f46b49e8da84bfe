//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

/// LURK multiplayer text-adventure server.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file. A missing file means defaults.
    #[arg(short, long, value_name = "FILE", default_value = "lurk.toml")]
    pub config: PathBuf,

    /// Port to listen on, overriding the config file.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Interface to listen on, overriding the config file.
    #[arg(short, long, value_name = "ADDRESS")]
    pub bind: Option<String>,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Output logs as JSON.
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded file.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = &self.bind {
            config.server.bind.clone_from(bind);
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}
