//! # LURK
//!
//! A multiplayer text-adventure server speaking the LURK binary protocol.
//!
//! Each client connects over TCP, registers a character, and explores a
//! shared world of rooms, monsters, and other players. The server is
//! authoritative: clients only send intents, and every state change goes
//! through one world lock.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lurk::prelude::*;
//!
//! # async fn start() -> Result<(), LurkError> {
//! let server = LurkServer::builder()
//!     .bind("0.0.0.0:34567")
//!     .build()
//!     .await?;
//! let stop = server.stop_handle();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     stop.stop();
//! });
//! server.run().await
//! # }
//! ```

mod error;
mod game;
mod handler;
mod server;

pub use error::LurkError;
pub use game::{Game, GameState};
pub use server::{
    DEFAULT_PORT, LurkServer, LurkServerBuilder, ServerConfig, StopHandle,
};

/// Re-exports of the types most servers and tests need.
pub mod prelude {
    pub use crate::{
        DEFAULT_PORT, Game, GameState, LurkError, LurkServer,
        LurkServerBuilder, ServerConfig, StopHandle,
    };
    pub use lurk_protocol::{
        Character, CharacterFlags, ErrorCode, LurkCodec, Message,
        MessageType, TextMessage,
    };
    pub use lurk_session::SessionConfig;
    pub use lurk_transport::{Connection, Deadlines, TcpConnection};
    pub use lurk_world::GameConfig;
}
