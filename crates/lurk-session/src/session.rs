//! Session types: the server's record of one connected player.
//!
//! A session tracks:
//! - WHERE the connection is in its lifecycle ([`SessionState`])
//! - WHO the player is and what they look like (their [`Character`])
//! - HOW to reach them (an outbound [`PlayerSender`])
//! - WHAT they have unlocked (allowed rooms and progress flags)

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use lurk_protocol::{Character, ErrorCode, Message, MessageType};
use lurk_transport::{ConnectionId, DEFAULT_CHUNK_TIMEOUT, DEFAULT_WRITE_TIMEOUT};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Channel carrying frames to one player's writer task.
///
/// Unbounded so that producing a delivery never waits on a slow socket;
/// the writer task applies the write deadline instead.
pub type PlayerSender = mpsc::UnboundedSender<Message>;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Per-connection timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Bound on each read while a frame is being assembled.
    pub chunk_timeout_ms: u64,

    /// Bound on writing one frame to the player.
    pub write_timeout_ms: u64,

    /// How long a terminated session waits for queued frames to flush
    /// before the connection is dropped.
    pub termination_grace_ms: u64,
}

impl SessionConfig {
    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_millis(self.chunk_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn termination_grace(&self) -> Duration {
        Duration::from_millis(self.termination_grace_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_timeout_ms: DEFAULT_CHUNK_TIMEOUT.as_millis() as u64,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT.as_millis() as u64,
            termination_grace_ms: 2_000,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle state of one connection.
///
/// Transitions are strictly ordered, except that any state may end in
/// `Terminated`:
///
/// ```text
/// Connecting → AwaitCharacter → AwaitStart → Gameplay → Terminated
/// ```
///
/// - **Connecting**: Version and Game frames are being sent.
/// - **AwaitCharacter**: Waiting for a valid `Character`. Other frames
///   are answered with `Error(Other)`.
/// - **AwaitStart**: Registered, waiting for `Start`. Other frames are
///   answered with `Error(NotReady)`.
/// - **Gameplay**: In the world; every action frame is dispatched.
/// - **Terminated**: Leave, disconnect, or a fatal read error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Connecting,
    AwaitCharacter,
    AwaitStart,
    Gameplay,
    Terminated,
}

impl SessionState {
    /// The next state in the normal flow, or `None` once terminated.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Connecting => Some(Self::AwaitCharacter),
            Self::AwaitCharacter => Some(Self::AwaitStart),
            Self::AwaitStart => Some(Self::Gameplay),
            Self::Gameplay => Some(Self::Terminated),
            Self::Terminated => None,
        }
    }

    /// Returns `true` if moving to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        match target {
            Self::Terminated => self != Self::Terminated,
            _ => self.next() == Some(target),
        }
    }

    /// The frame type that moves this state forward, if it waits on one.
    pub fn awaits(self) -> Option<MessageType> {
        match self {
            Self::AwaitCharacter => Some(MessageType::Character),
            Self::AwaitStart => Some(MessageType::Start),
            _ => None,
        }
    }

    /// The error returned for any other frame while waiting.
    ///
    /// `None` in states that are not waiting on a particular frame.
    pub fn rejection(self, got: MessageType) -> Option<Message> {
        match self {
            Self::AwaitCharacter => Some(Message::error(
                ErrorCode::Other,
                format!("expected a CHARACTER message, got {got}"),
            )),
            Self::AwaitStart => Some(Message::error(
                ErrorCode::NotReady,
                format!("send START to begin, got {got}"),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "Connecting",
            Self::AwaitCharacter => "AwaitCharacter",
            Self::AwaitStart => "AwaitStart",
            Self::Gameplay => "Gameplay",
            Self::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A registered player.
///
/// Created when a `Character` passes validation and removed on leave or
/// disconnect. The world mutates it only while holding the world lock.
#[derive(Debug, Clone)]
pub struct Player {
    /// The authoritative character, as last sent to clients.
    pub character: Character,

    /// The connection this player arrived on.
    pub connection: ConnectionId,

    /// Outbound frames for this player.
    pub sender: PlayerSender,

    /// Per-player gate over room numbers. A room missing from the map, or
    /// present as `false`, cannot be entered or seen as a connection.
    pub allowed_rooms: HashMap<u16, bool>,

    /// Set once the player has killed the Hive Queen.
    pub killed_queen: bool,

    /// Set once the player has destroyed the Formic Fleet.
    pub killed_fleet: bool,
}

impl Player {
    pub fn new(
        character: Character,
        connection: ConnectionId,
        sender: PlayerSender,
        allowed_rooms: HashMap<u16, bool>,
    ) -> Self {
        Self {
            character,
            connection,
            sender,
            allowed_rooms,
            killed_queen: false,
            killed_fleet: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.character.name
    }

    pub fn room(&self) -> u16 {
        self.character.room
    }

    /// Returns `true` if the player may enter or see `room`.
    pub fn may_enter(&self, room: u16) -> bool {
        self.allowed_rooms.get(&room).copied().unwrap_or(false)
    }

    /// Sorted list of rooms currently open to this player.
    pub fn unlocked_rooms(&self) -> Vec<u16> {
        let mut rooms: Vec<u16> = self
            .allowed_rooms
            .iter()
            .filter_map(|(&room, &open)| open.then_some(room))
            .collect();
        rooms.sort_unstable();
        rooms
    }
}
