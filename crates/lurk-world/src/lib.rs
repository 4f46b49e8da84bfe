//! The LURK game world.
//!
//! This crate owns the rules of the game: the room graph and its per-player
//! gates, the monster roster, combat resolution, stat upgrades and room
//! unlocks. It holds no sockets and spawns no tasks. Every action on
//! [`World`] is a synchronous transition that returns an
//! [`Outbox`](lurk_session::Outbox) for the caller to dispatch to the
//! players' writer tasks.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server Layer (above)  ← world lock, heal timers, connection handlers
//!     ↕
//! World Layer (this crate)  ← rooms, monsters, combat, unlocks
//!     ↕
//! Session Layer (below)  ← players, outbound queues
//! ```

mod combat;
mod config;
pub mod content;
mod error;
mod map;
mod monster;
mod world;

pub use combat::{Exchange, damage, resolve_fight};
pub use config::GameConfig;
pub use error::WorldError;
pub use map::{RoomNode, WorldMap};
pub use monster::{Monster, MonsterRoster};
pub use world::{FightOutcome, World, narrate};
