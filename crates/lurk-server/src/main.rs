//! LURK server binary.
//!
//! Loads `lurk.toml` (or the file named by `--config`), applies command-line
//! overrides, and serves until SIGINT or SIGTERM. Stopping closes the
//! listener; sessions in progress end with the process.

mod cli;
mod config;
mod logging;

use clap::Parser;
use lurk::LurkServer;

use crate::cli::Cli;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config).await?;
    cli.apply(&mut config);
    logging::init(&config.logging)?;
    tracing::info!(path = %cli.config.display(), "configuration loaded");

    let server = LurkServer::builder().config(config.server).build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening for LURK clients");

    let stop = server.stop_handle();
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => tracing::info!("shutdown signal received"),
            Err(e) => tracing::error!(error = %e, "signal handler failed"),
        }
        stop.stop();
    });

    server.run().await?;
    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM (Ctrl+C on Windows).
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
