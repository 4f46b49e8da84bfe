//! Player session management for LURK.
//!
//! This crate holds everything the server knows about one connected
//! player, independent of the world they play in:
//!
//! 1. **Lifecycle**: where a connection is in the handshake
//!    ([`SessionState`])
//! 2. **Players**: the registered character, its outbound channel, its
//!    unlocks ([`Player`], [`PlayerRegistry`])
//! 3. **Deliveries**: frames collected by a world action and handed to the
//!    writer tasks in world order ([`Outbox`])
//!
//! # How it fits in the stack
//!
//! ```text
//! World Layer (above)  ← moves players between rooms, resolves fights
//!     ↕
//! Session Layer (this crate)  ← player identity, unlocks, outbound queue
//!     ↕
//! Protocol Layer (below)  ← Character, Message types
//! ```

mod error;
mod manager;
mod outbox;
mod session;

pub use error::SessionError;
pub use manager::PlayerRegistry;
pub use outbox::Outbox;
pub use session::{Player, PlayerSender, SessionConfig, SessionState};
