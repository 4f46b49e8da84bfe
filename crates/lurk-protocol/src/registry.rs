//! Protocol Type Registry: how many bytes each frame type needs.
//!
//! A frame is a fixed header whose length depends only on the type byte,
//! optionally followed by a variable payload whose length is a little-endian
//! `u16` stored somewhere inside that header. The socket reader uses this
//! table to know how much to pull off the wire before it can decode.
//!
//! The table is an ordinary value rather than a global so the codec and
//! the reader can be tested against it in isolation.

use crate::{MessageType, ProtocolError};

/// Layout of one frame type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Bytes in the fixed header, including the type byte.
    pub header_len: usize,
    /// Offset of the `u16` payload length inside the header, if the type
    /// carries a variable payload.
    pub length_offset: Option<usize>,
}

impl FrameLayout {
    const fn fixed(header_len: usize) -> Self {
        Self {
            header_len,
            length_offset: None,
        }
    }

    const fn variable(header_len: usize, length_offset: usize) -> Self {
        Self {
            header_len,
            length_offset: Some(length_offset),
        }
    }

    /// Returns `true` if a variable payload follows the header.
    pub fn is_variable(&self) -> bool {
        self.length_offset.is_some()
    }
}

/// Lookup table from [`MessageType`] to [`FrameLayout`].
#[derive(Debug, Clone)]
pub struct FrameRegistry {
    layouts: [FrameLayout; 14],
}

impl FrameRegistry {
    /// The standard LURK layout table.
    pub fn lurk() -> Self {
        Self {
            layouts: [
                // type, len(2), recipient(32), sender(30), pad, narration
                FrameLayout::variable(67, 1),
                // type, room(2)
                FrameLayout::fixed(3),
                FrameLayout::fixed(1),
                // type, target(32)
                FrameLayout::fixed(33),
                FrameLayout::fixed(33),
                FrameLayout::fixed(1),
                // type, code, len(2)
                FrameLayout::variable(4, 2),
                // type, action
                FrameLayout::fixed(2),
                // type, number(2), name(32), len(2)
                FrameLayout::variable(37, 35),
                // type, name(32), flags, 6 x u16, len(2)
                FrameLayout::variable(48, 46),
                // type, points(2), limit(2), len(2)
                FrameLayout::variable(7, 5),
                FrameLayout::fixed(1),
                FrameLayout::variable(37, 35),
                // type, major, minor, list len(2)
                FrameLayout::variable(5, 3),
            ],
        }
    }

    /// Returns the layout for a known message type.
    pub fn layout(&self, ty: MessageType) -> FrameLayout {
        self.layouts[usize::from(ty.as_byte()) - 1]
    }

    /// Looks up the layout for a raw type byte.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessageType`] for bytes outside `1..=14`.
    pub fn layout_for_byte(
        &self,
        byte: u8,
    ) -> Result<FrameLayout, ProtocolError> {
        let ty = MessageType::try_from(byte)
            .map_err(ProtocolError::InvalidMessageType)?;
        Ok(self.layout(ty))
    }

    /// Reads the declared variable-payload length out of a frame header.
    ///
    /// Returns `Ok(None)` for fixed-size types. `data` needs to hold at
    /// least the full fixed header.
    ///
    /// # Errors
    /// - [`ProtocolError::FrameTooSmall`] on an empty buffer or a header
    ///   shorter than the type requires
    /// - [`ProtocolError::InvalidMessageType`] for an unknown type byte
    pub fn variable_length(
        &self,
        data: &[u8],
    ) -> Result<Option<usize>, ProtocolError> {
        let first = *data.first().ok_or(ProtocolError::FrameTooSmall {
            needed: 1,
            got: 0,
        })?;
        let layout = self.layout_for_byte(first)?;
        let Some(offset) = layout.length_offset else {
            return Ok(None);
        };
        if data.len() < layout.header_len {
            return Err(ProtocolError::FrameTooSmall {
                needed: layout.header_len,
                got: data.len(),
            });
        }
        let len = u16::from_le_bytes([data[offset], data[offset + 1]]);
        Ok(Some(usize::from(len)))
    }

    /// Total frame length (header plus payload) declared by `data`.
    pub fn frame_len(&self, data: &[u8]) -> Result<usize, ProtocolError> {
        let extra = self.variable_length(data)?.unwrap_or(0);
        // variable_length already validated the first byte.
        let layout = self.layout_for_byte(data[0])?;
        Ok(layout.header_len + extra)
    }
}

impl Default for FrameRegistry {
    fn default() -> Self {
        Self::lurk()
    }
}
