//! Command codec: the five panel intents and their byte encodings.
//!
//! | Command         | Bytes                                |
//! |-----------------|--------------------------------------|
//! | `Paint(12, c)`  | `12` `,` `0x` + 6 lowercase hex      |
//! | `Clear`         | `c0`                                 |
//! | `SaveSlot(n)`   | `w` + `n`                            |
//! | `LoadSlot(n)`   | `l` + `n` + NUL                      |
//! | `SelectSlot(n)` | `s` + `n` + NUL                      |
//!
//! Inbound notifications are one 192-byte frame of RGB triples in wire order; see
//! [`decode_notification`].

use core::fmt::Write as _;

use heapless::{String, Vec};

use crate::color::{RGB8, from_hex_u32, to_hex_u32};
use crate::panel::{CellId, WireFrame};
use crate::snapshot::SlotId;
use crate::{Error, Result};

/// Longest encoded command: `63,0x` + six hex digits.
pub const MAX_COMMAND_LEN: usize = 11;

/// Bytes of one encoded command.
pub type EncodedCommand = Vec<u8, MAX_COMMAND_LEN>;

/// One panel intent, ready to be encoded and written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Set one cell to a color.
    Paint {
        /// Target cell (wire order).
        cell: CellId,
        /// New color.
        color: RGB8,
    },
    /// Blacken the panel's working buffer.
    Clear,
    /// Persist the working buffer into a slot.
    SaveSlot(SlotId),
    /// Ask the panel to send a slot's pixels back as a notification.
    LoadSlot(SlotId),
    /// Change the panel's active slot.
    SelectSlot(SlotId),
}

#[cfg(feature = "defmt")]
impl defmt::Format for Command {
    fn format(&self, f: defmt::Formatter<'_>) {
        match self {
            Self::Paint { cell, color } => {
                defmt::write!(f, "Paint({}, {=u32:06x})", cell, to_hex_u32(*color));
            }
            Self::Clear => defmt::write!(f, "Clear"),
            Self::SaveSlot(slot) => defmt::write!(f, "SaveSlot({})", slot),
            Self::LoadSlot(slot) => defmt::write!(f, "LoadSlot({})", slot),
            Self::SelectSlot(slot) => defmt::write!(f, "SelectSlot({})", slot),
        }
    }
}

impl Command {
    /// Encode into the bytes written on the link.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedCommand`] if the encoding does not fit
    /// [`MAX_COMMAND_LEN`]; every valid command fits.
    ///
    /// ```rust
    /// use pixel_link::color::RGB8;
    /// use pixel_link::command::Command;
    /// use pixel_link::panel::CellId;
    ///
    /// let paint = Command::Paint { cell: CellId::new(0)?, color: RGB8::new(0xff, 0, 0) };
    /// assert_eq!(paint.encode()?.as_slice(), b"0,0xff0000");
    /// assert_eq!(Command::Clear.encode()?.as_slice(), b"c0");
    /// # Ok::<(), pixel_link::Error>(())
    /// ```
    pub fn encode(&self) -> Result<EncodedCommand> {
        let mut text: String<MAX_COMMAND_LEN> = String::new();
        match self {
            Self::Paint { cell, color } => {
                write!(text, "{},0x{:06x}", cell.get(), to_hex_u32(*color))
            }
            Self::Clear => text.write_str("c0"),
            Self::SaveSlot(slot) => write!(text, "w{}", slot.get()),
            Self::LoadSlot(slot) => write!(text, "l{}\0", slot.get()),
            Self::SelectSlot(slot) => write!(text, "s{}\0", slot.get()),
        }
        .map_err(|_| Error::MalformedCommand)?;
        Ok(text.into_bytes())
    }

    /// Parse bytes produced by [`Command::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedCommand`] for unknown shapes, or the address error of an
    /// out-of-range cell or slot id.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        match bytes {
            b"c0" => Ok(Self::Clear),
            [b'w', digit] => Ok(Self::SaveSlot(parse_slot(*digit)?)),
            [b'l', digit, 0] => Ok(Self::LoadSlot(parse_slot(*digit)?)),
            [b's', digit, 0] => Ok(Self::SelectSlot(parse_slot(*digit)?)),
            _ => parse_paint(bytes),
        }
    }

    /// The slot this command targets, if any.
    #[must_use]
    pub const fn slot(&self) -> Option<SlotId> {
        match self {
            Self::SaveSlot(slot) | Self::LoadSlot(slot) | Self::SelectSlot(slot) => Some(*slot),
            Self::Paint { .. } | Self::Clear => None,
        }
    }
}

/// Decode an inbound notification into a wire-order frame.
///
/// # Errors
///
/// Returns [`Error::FrameLength`] unless `bytes` is exactly 192 long.
pub fn decode_notification(bytes: &[u8]) -> Result<WireFrame> {
    WireFrame::from_bytes(bytes)
}

fn parse_slot(digit: u8) -> Result<SlotId> {
    if digit.is_ascii_digit() {
        SlotId::new(digit.saturating_sub(b'0'))
    } else {
        Err(Error::MalformedCommand)
    }
}

// `<id>,0x<rrggbb>`
fn parse_paint(bytes: &[u8]) -> Result<Command> {
    let text = core::str::from_utf8(bytes).map_err(|_| Error::MalformedCommand)?;
    let (id_text, color_text) = text.split_once(',').ok_or(Error::MalformedCommand)?;
    let hex_text = color_text
        .strip_prefix("0x")
        .ok_or(Error::MalformedCommand)?;
    if !(1..=2).contains(&id_text.len())
        || hex_text.len() != 6
        || !id_text.bytes().all(|byte| byte.is_ascii_digit())
        || !hex_text.bytes().all(|byte| byte.is_ascii_hexdigit())
    {
        return Err(Error::MalformedCommand);
    }
    let id: u8 = id_text.parse().map_err(|_| Error::MalformedCommand)?;
    let value = u32::from_str_radix(hex_text, 16).map_err(|_| Error::MalformedCommand)?;
    Ok(Command::Paint {
        cell: CellId::new(id)?,
        color: from_hex_u32(value),
    })
}
