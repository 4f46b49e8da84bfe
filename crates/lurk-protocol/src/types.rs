//! Wire types for the LURK protocol.
//!
//! Every frame on the wire starts with a one-byte [`MessageType`]. The
//! [`Message`] enum is the closed set of frames; each variant carries the
//! decoded payload for that type. All types also derive serde so a front
//! end can hand decoded frames to a browser as JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// The type discriminant carried in the first byte of every frame.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum MessageType {
    Message = 1,
    ChangeRoom = 2,
    Fight = 3,
    PvpFight = 4,
    Loot = 5,
    Start = 6,
    Error = 7,
    Accept = 8,
    Room = 9,
    Character = 10,
    Game = 11,
    Leave = 12,
    Connection = 13,
    Version = 14,
}

impl MessageType {
    /// Every registered type, in discriminant order.
    pub const ALL: [MessageType; 14] = [
        Self::Message,
        Self::ChangeRoom,
        Self::Fight,
        Self::PvpFight,
        Self::Loot,
        Self::Start,
        Self::Error,
        Self::Accept,
        Self::Room,
        Self::Character,
        Self::Game,
        Self::Leave,
        Self::Connection,
        Self::Version,
    ];

    /// Returns the wire byte for this type.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    /// Fails with the offending byte when it is outside `1..=14`.
    fn try_from(byte: u8) -> Result<Self, u8> {
        match byte {
            1..=14 => Ok(Self::ALL[usize::from(byte) - 1]),
            other => Err(other),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Message => "MESSAGE",
            Self::ChangeRoom => "CHANGEROOM",
            Self::Fight => "FIGHT",
            Self::PvpFight => "PVPFIGHT",
            Self::Loot => "LOOT",
            Self::Start => "START",
            Self::Error => "ERROR",
            Self::Accept => "ACCEPT",
            Self::Room => "ROOM",
            Self::Character => "CHARACTER",
            Self::Game => "GAME",
            Self::Leave => "LEAVE",
            Self::Connection => "CONNECTION",
            Self::Version => "VERSION",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable code carried by an `Error` frame.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ErrorCode {
    Other = 0,
    BadRoom = 1,
    PlayerAlreadyExists = 2,
    BadMonster = 3,
    StatError = 4,
    NotReady = 5,
    NoTarget = 6,
    NoFight = 7,
    NoPvp = 8,
    NoError = 255,
}

impl ErrorCode {
    /// Returns the wire byte for this code.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        Ok(match byte {
            0 => Self::Other,
            1 => Self::BadRoom,
            2 => Self::PlayerAlreadyExists,
            3 => Self::BadMonster,
            4 => Self::StatError,
            5 => Self::NotReady,
            6 => Self::NoTarget,
            7 => Self::NoFight,
            8 => Self::NoPvp,
            255 => Self::NoError,
            other => return Err(other),
        })
    }
}

// ---------------------------------------------------------------------------
// CharacterFlags
// ---------------------------------------------------------------------------

/// The packed flag byte of a `Character` frame.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CharacterFlags(u8);

impl CharacterFlags {
    pub const ALIVE: u8 = 0b1000_0000;
    pub const JOIN_BATTLE: u8 = 0b0100_0000;
    pub const MONSTER: u8 = 0b0010_0000;
    pub const STARTED: u8 = 0b0001_0000;
    pub const READY: u8 = 0b0000_1000;

    /// Wraps a raw flag byte as read off the wire.
    ///
    /// Bits outside the five known masks are kept so a byte read from a
    /// peer is written back unchanged.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw flag byte.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit in `mask` is set.
    pub fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }

    /// Sets or clears every bit in `mask`.
    pub fn set(&mut self, mask: u8, on: bool) {
        if on {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, mask: u8, on: bool) -> Self {
        self.set(mask, on);
        self
    }
}

// ---------------------------------------------------------------------------
// Payload structs
// ---------------------------------------------------------------------------

/// Payload of a `Message` frame: chat between players or narration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextMessage {
    /// Name of the player the text is for (32-byte field).
    pub recipient: String,
    /// Name of the sender (30-byte field).
    pub sender: String,
    /// `true` when the server narrates rather than relays a player.
    pub narration: bool,
    pub text: String,
}

impl TextMessage {
    /// Builds a narrated message.
    pub fn narration(
        recipient: impl Into<String>,
        sender: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            sender: sender.into(),
            narration: true,
            text: text.into(),
        }
    }
}

/// Payload of an `Error` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub code: ErrorCode,
    pub message: String,
}

/// Payload of a `Room` frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Room {
    pub number: u16,
    pub name: String,
    pub description: String,
}

/// Payload of a `Connection` frame: a room reachable from the current one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Connection {
    pub number: u16,
    pub name: String,
    pub description: String,
}

impl From<&Room> for Connection {
    fn from(room: &Room) -> Self {
        Self {
            number: room.number,
            name: room.name.clone(),
            description: room.description.clone(),
        }
    }
}

/// Payload of a `Character` frame. Players and monsters share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub flags: CharacterFlags,
    pub attack: u16,
    pub defense: u16,
    pub regen: u16,
    /// Signed on the wire; goes negative when a fight overshoots zero.
    pub health: i16,
    pub gold: u16,
    pub room: u16,
    pub description: String,
}

impl Character {
    pub fn is_alive(&self) -> bool {
        self.flags.contains(CharacterFlags::ALIVE)
    }

    pub fn is_monster(&self) -> bool {
        self.flags.contains(CharacterFlags::MONSTER)
    }

    pub fn set_alive(&mut self, alive: bool) {
        self.flags.set(CharacterFlags::ALIVE, alive);
    }

    /// Sum of attack, defense and regen, widened so it cannot overflow.
    pub fn stat_total(&self) -> u32 {
        u32::from(self.attack) + u32::from(self.defense) + u32::from(self.regen)
    }
}

/// Payload of a `Game` frame: global constants sent at handshake.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameInfo {
    pub initial_points: u16,
    pub stat_limit: u16,
    pub description: String,
}

/// Payload of a `Version` frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    /// Opaque extension blobs, each length-prefixed on the wire.
    pub extensions: Vec<Vec<u8>>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One decoded LURK frame.
///
/// Matching on this enum is exhaustive, so adding a frame type is a
/// compile error at every decode and dispatch site until it is handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    Message(TextMessage),
    ChangeRoom { room: u16 },
    Fight,
    PvpFight { target: String },
    Loot { target: String },
    Start,
    Error(ErrorMessage),
    Accept { action: MessageType },
    Room(Room),
    Character(Character),
    Game(GameInfo),
    Leave,
    Connection(Connection),
    Version(Version),
}

impl Message {
    /// Returns the discriminant this message is written with.
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Message(_) => MessageType::Message,
            Self::ChangeRoom { .. } => MessageType::ChangeRoom,
            Self::Fight => MessageType::Fight,
            Self::PvpFight { .. } => MessageType::PvpFight,
            Self::Loot { .. } => MessageType::Loot,
            Self::Start => MessageType::Start,
            Self::Error(_) => MessageType::Error,
            Self::Accept { .. } => MessageType::Accept,
            Self::Room(_) => MessageType::Room,
            Self::Character(_) => MessageType::Character,
            Self::Game(_) => MessageType::Game,
            Self::Leave => MessageType::Leave,
            Self::Connection(_) => MessageType::Connection,
            Self::Version(_) => MessageType::Version,
        }
    }

    /// Shorthand for an `Error` frame.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ErrorMessage {
            code,
            message: message.into(),
        })
    }

    /// Shorthand for an `Accept` frame acknowledging `action`.
    pub fn accept(action: MessageType) -> Self {
        Self::Accept { action }
    }
}
