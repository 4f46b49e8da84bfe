//! Binary codec for LURK frames.
//!
//! Pure functions over byte slices: no I/O and no shared state. All
//! integers are little-endian. Decoding validates that the buffer holds
//! the full fixed header and then the full declared payload before it
//! slices anything, so a short or lying frame is an error and never a
//! panic.

use crate::fixed::{self, NAME_LEN, SENDER_LEN};
use crate::{
    Character, CharacterFlags, Connection, ErrorCode, ErrorMessage,
    FrameRegistry, GameInfo, Message, MessageType, ProtocolError, Room,
    TextMessage, Version,
};

/// Encodes and decodes [`Message`] values using a [`FrameRegistry`].
///
/// ## Example
///
/// ```rust
/// use lurk_protocol::{LurkCodec, Message};
///
/// let codec = LurkCodec::default();
/// let bytes = codec.encode(&Message::ChangeRoom { room: 4 }).unwrap();
/// assert_eq!(bytes, [2, 4, 0]);
/// assert_eq!(codec.decode(&bytes).unwrap(), Message::ChangeRoom { room: 4 });
/// ```
#[derive(Debug, Clone, Default)]
pub struct LurkCodec {
    registry: FrameRegistry,
}

impl LurkCodec {
    /// Creates a codec over the given layout table.
    pub fn new(registry: FrameRegistry) -> Self {
        Self { registry }
    }

    /// The layout table this codec uses.
    pub fn registry(&self) -> &FrameRegistry {
        &self.registry
    }

    /// Reads the declared variable-payload length from a frame header.
    /// `Ok(None)` means the type is fixed-size.
    pub fn variable_length(
        &self,
        data: &[u8],
    ) -> Result<Option<usize>, ProtocolError> {
        self.registry.variable_length(data)
    }

    /// Serializes a message into one frame.
    ///
    /// # Errors
    /// [`ProtocolError::FieldTooLong`] if a text field exceeds what a
    /// `u16` length can describe.
    pub fn encode(&self, msg: &Message) -> Result<Vec<u8>, ProtocolError> {
        let ty = msg.message_type();
        let layout = self.registry.layout(ty);
        let mut buf = Vec::with_capacity(layout.header_len);
        buf.push(ty.as_byte());

        match msg {
            Message::Fight | Message::Start | Message::Leave => {}
            Message::Message(m) => {
                let len = text_len("text", &m.text)?;
                buf.extend_from_slice(&len.to_le_bytes());
                fixed::put(&mut buf, &m.recipient, NAME_LEN);
                fixed::put(&mut buf, &m.sender, SENDER_LEN);
                buf.push(0);
                buf.push(u8::from(m.narration));
                buf.extend_from_slice(m.text.as_bytes());
            }
            Message::ChangeRoom { room } => {
                buf.extend_from_slice(&room.to_le_bytes());
            }
            Message::PvpFight { target } | Message::Loot { target } => {
                fixed::put(&mut buf, target, NAME_LEN);
            }
            Message::Error(e) => {
                let len = text_len("message", &e.message)?;
                buf.push(e.code.as_byte());
                buf.extend_from_slice(&len.to_le_bytes());
                buf.extend_from_slice(e.message.as_bytes());
            }
            Message::Accept { action } => buf.push(action.as_byte()),
            Message::Room(r) => {
                put_room(&mut buf, r.number, &r.name, &r.description)?;
            }
            Message::Connection(c) => {
                put_room(&mut buf, c.number, &c.name, &c.description)?;
            }
            Message::Character(c) => {
                let len = text_len("description", &c.description)?;
                fixed::put(&mut buf, &c.name, NAME_LEN);
                buf.push(c.flags.bits());
                for field in [c.attack, c.defense, c.regen] {
                    buf.extend_from_slice(&field.to_le_bytes());
                }
                buf.extend_from_slice(&c.health.to_le_bytes());
                buf.extend_from_slice(&c.gold.to_le_bytes());
                buf.extend_from_slice(&c.room.to_le_bytes());
                buf.extend_from_slice(&len.to_le_bytes());
                buf.extend_from_slice(c.description.as_bytes());
            }
            Message::Game(g) => {
                let len = text_len("description", &g.description)?;
                buf.extend_from_slice(&g.initial_points.to_le_bytes());
                buf.extend_from_slice(&g.stat_limit.to_le_bytes());
                buf.extend_from_slice(&len.to_le_bytes());
                buf.extend_from_slice(g.description.as_bytes());
            }
            Message::Version(v) => {
                let total: usize =
                    v.extensions.iter().map(|ext| ext.len() + 2).sum();
                let total = u16::try_from(total).map_err(|_| {
                    ProtocolError::FieldTooLong {
                        field: "extensions",
                        len: total,
                    }
                })?;
                buf.push(v.major);
                buf.push(v.minor);
                buf.extend_from_slice(&total.to_le_bytes());
                for ext in &v.extensions {
                    // Each entry is bounded by the total checked above.
                    buf.extend_from_slice(&(ext.len() as u16).to_le_bytes());
                    buf.extend_from_slice(ext);
                }
            }
        }

        debug_assert!(buf.len() >= layout.header_len);
        Ok(buf)
    }

    /// Parses one complete frame.
    ///
    /// Trailing bytes past the declared frame length are ignored.
    ///
    /// # Errors
    /// - [`ProtocolError::FrameTooSmall`] on an empty buffer, a short
    ///   header, or a payload shorter than its length field declares
    /// - [`ProtocolError::InvalidMessageType`] for an unknown type byte
    ///   (or an unknown action byte inside `Accept`)
    /// - [`ProtocolError::InvalidErrCode`] for an `Error` frame whose code
    ///   is outside the closed set
    pub fn decode(&self, data: &[u8]) -> Result<Message, ProtocolError> {
        let first = *data.first().ok_or(ProtocolError::FrameTooSmall {
            needed: 1,
            got: 0,
        })?;
        let ty = MessageType::try_from(first)
            .map_err(ProtocolError::InvalidMessageType)?;
        let layout = self.registry.layout(ty);
        if data.len() < layout.header_len {
            return Err(ProtocolError::FrameTooSmall {
                needed: layout.header_len,
                got: data.len(),
            });
        }

        let body_len = self.registry.variable_length(data)?.unwrap_or(0);
        let end = layout.header_len + body_len;
        if data.len() < end {
            return Err(ProtocolError::FrameTooSmall {
                needed: end,
                got: data.len(),
            });
        }
        let body = &data[layout.header_len..end];

        let msg = match ty {
            MessageType::Fight => Message::Fight,
            MessageType::Start => Message::Start,
            MessageType::Leave => Message::Leave,
            MessageType::Message => Message::Message(TextMessage {
                recipient: fixed::read(&data[3..], NAME_LEN),
                sender: fixed::read(&data[3 + NAME_LEN..], SENDER_LEN),
                narration: data[66] != 0,
                text: text(body),
            }),
            MessageType::ChangeRoom => Message::ChangeRoom {
                room: u16_at(data, 1),
            },
            MessageType::PvpFight => Message::PvpFight {
                target: fixed::read(&data[1..], NAME_LEN),
            },
            MessageType::Loot => Message::Loot {
                target: fixed::read(&data[1..], NAME_LEN),
            },
            MessageType::Error => {
                let code = ErrorCode::try_from(data[1])
                    .map_err(ProtocolError::InvalidErrCode)?;
                Message::Error(ErrorMessage {
                    code,
                    message: text(body),
                })
            }
            MessageType::Accept => Message::Accept {
                action: MessageType::try_from(data[1])
                    .map_err(ProtocolError::InvalidMessageType)?,
            },
            MessageType::Room => Message::Room(Room {
                number: u16_at(data, 1),
                name: fixed::read(&data[3..], NAME_LEN),
                description: text(body),
            }),
            MessageType::Connection => Message::Connection(Connection {
                number: u16_at(data, 1),
                name: fixed::read(&data[3..], NAME_LEN),
                description: text(body),
            }),
            MessageType::Character => Message::Character(Character {
                name: fixed::read(&data[1..], NAME_LEN),
                flags: CharacterFlags::from_bits(data[33]),
                attack: u16_at(data, 34),
                defense: u16_at(data, 36),
                regen: u16_at(data, 38),
                health: i16::from_le_bytes([data[40], data[41]]),
                gold: u16_at(data, 42),
                room: u16_at(data, 44),
                description: text(body),
            }),
            MessageType::Game => Message::Game(GameInfo {
                initial_points: u16_at(data, 1),
                stat_limit: u16_at(data, 3),
                description: text(body),
            }),
            MessageType::Version => Message::Version(Version {
                major: data[1],
                minor: data[2],
                extensions: extensions(body),
            }),
        };
        Ok(msg)
    }
}

fn u16_at(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}

fn text_len(field: &'static str, value: &str) -> Result<u16, ProtocolError> {
    u16::try_from(value.len()).map_err(|_| ProtocolError::FieldTooLong {
        field,
        len: value.len(),
    })
}

fn put_room(
    buf: &mut Vec<u8>,
    number: u16,
    name: &str,
    description: &str,
) -> Result<(), ProtocolError> {
    let len = text_len("description", description)?;
    buf.extend_from_slice(&number.to_le_bytes());
    fixed::put(buf, name, NAME_LEN);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(description.as_bytes());
    Ok(())
}

/// Splits a version extension list into its entries.
///
/// Parsing stops quietly at the first entry whose length prefix is cut
/// off or whose declared size runs past the list; everything before it is
/// kept.
fn extensions(mut list: &[u8]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    while list.len() >= 2 {
        let len = usize::from(u16_at(list, 0));
        let rest = &list[2..];
        if rest.len() < len {
            break;
        }
        out.push(rest[..len].to_vec());
        list = &rest[len..];
    }
    out
}
