//! Wire protocol for LURK.
//!
//! This crate defines the bytes that clients and the server exchange:
//!
//! - **Types** ([`Message`], [`Character`], [`ErrorCode`], etc.): the
//!   closed set of frames and their payloads.
//! - **Registry** ([`FrameRegistry`]): the per-type header length and
//!   where the variable payload length lives inside it.
//! - **Codec** ([`LurkCodec`]): conversion between [`Message`] and bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing that.
//!
//! # Architecture
//!
//! The protocol layer sits between the socket and the game. It knows
//! nothing about connections or players; the transport uses the registry
//! to cut frames off a stream and the codec to turn them into messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Session (player state)
//! ```

mod codec;
mod error;
pub mod fixed;
mod registry;
mod types;

pub use codec::LurkCodec;
pub use error::ProtocolError;
pub use registry::{FrameLayout, FrameRegistry};
pub use types::{
    Character, CharacterFlags, Connection, ErrorCode, ErrorMessage,
    GameInfo, Message, MessageType, Room, TextMessage, Version,
};
