//! `LurkServer` builder and accept loop.
//!
//! This is the entry point for running a LURK server. It ties together
//! all the layers: transport → protocol → session → world.

use std::net::SocketAddr;
use std::sync::Arc;

use lurk_session::SessionConfig;
use lurk_transport::{Connection, Deadlines, TcpTransport, Transport};
use lurk_world::GameConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::LurkError;
use crate::game::Game;
use crate::handler::handle_connection;

/// Port the server listens on when none is configured.
pub const DEFAULT_PORT: u16 = 34567;

/// Everything needed to start a server.
///
/// Every field has a default, so a config file only names what it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub bind: String,
    pub port: u16,
    pub session: SessionConfig,
    pub game: GameConfig,
}

impl ServerConfig {
    /// The `host:port` string to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            session: SessionConfig::default(),
            game: GameConfig::default(),
        }
    }
}

/// Builder for configuring and starting a LURK server.
///
/// # Example
///
/// ```rust,no_run
/// use lurk::prelude::*;
///
/// # async fn start() -> Result<(), LurkError> {
/// let server = LurkServer::builder()
///     .config(ServerConfig::default())
///     .bind("127.0.0.1:0")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Default)]
pub struct LurkServerBuilder {
    config: ServerConfig,
    bind_addr: Option<String>,
}

impl LurkServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds to `addr` instead of the configured host and port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = Some(addr.to_string());
        self
    }

    /// Binds the listener and builds the world.
    pub async fn build(self) -> Result<LurkServer, LurkError> {
        let addr = self.bind_addr.unwrap_or_else(|| self.config.addr());
        let session = self.config.session;
        let transport = TcpTransport::bind(&addr).await?.with_deadlines(Deadlines {
            chunk: session.chunk_timeout(),
            write: session.write_timeout(),
        });

        Ok(LurkServer {
            transport,
            game: Arc::new(Game::new(self.config.game)),
            session,
            stop: Arc::new(Notify::new()),
        })
    }
}

/// Stops a running server's accept loop.
///
/// Sessions already in progress are left to finish on their own.
#[derive(Debug, Clone)]
pub struct StopHandle {
    stop: Arc<Notify>,
}

impl StopHandle {
    /// Asks the accept loop to exit. Safe to call before `run` starts.
    pub fn stop(&self) {
        self.stop.notify_one();
    }
}

/// A bound LURK server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct LurkServer {
    transport: TcpTransport,
    game: Arc<Game>,
    session: SessionConfig,
    stop: Arc<Notify>,
}

impl LurkServer {
    /// Creates a new builder.
    pub fn builder() -> LurkServerBuilder {
        LurkServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, LurkError> {
        Ok(self.transport.local_addr()?)
    }

    /// The shared game, for inspection.
    pub fn game(&self) -> Arc<Game> {
        Arc::clone(&self.game)
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop: Arc::clone(&self.stop),
        }
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Accept errors
    /// are logged and the loop keeps going. Once the [`StopHandle`] fires
    /// the listener is closed and this returns.
    pub async fn run(mut self) -> Result<(), LurkError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "LURK server running");

        loop {
            tokio::select! {
                () = self.stop.notified() => {
                    tracing::info!("accept loop stopping");
                    break;
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        tracing::info!(conn_id = %conn.id(), peer = ?conn.peer_addr(), "connection accepted");
                        let game = Arc::clone(&self.game);
                        let session = self.session.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, game, session).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.transport.shutdown().await?;
        Ok(())
    }
}
