//! Crate-wide error type.

use derive_more::{Display, Error};

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Everything that can go wrong between a paint intent and the LED panel.
///
/// Errors are `Copy` so they can be carried inside [`PanelEvent`](crate::pixel_link::PanelEvent)s
/// across channels.
#[derive(Clone, Copy, Debug, Display, Error, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Device not found or service negotiation failed. Fatal to the session.
    #[display("connection to the panel failed")]
    Connection,
    /// A write was rejected by the link. Only the failed command is dropped.
    #[display("link write failed")]
    Transport,
    /// A write did not complete within the configured timeout.
    #[display("link write timed out")]
    WriteTimeout,
    /// An inbound notification was not exactly one 192-byte frame.
    #[display("notification frame has {len} bytes, expected 192")]
    FrameLength {
        /// Length of the rejected buffer.
        len: usize,
    },
    /// A frame answered a load that had already timed out; it was discarded.
    #[display("frame arrived after its load timed out")]
    LateFrame,
    /// Cell id outside `0..64`.
    #[display("cell id {_0} out of range")]
    CellOutOfRange(#[error(not(source))] u8),
    /// Visual position outside the 8×8 panel.
    #[display("position (row {row}, col {col}) is off the panel")]
    PositionOutOfRange {
        /// Requested row.
        row: u8,
        /// Requested column.
        col: u8,
    },
    /// Slot id outside `0..4`.
    #[display("slot id {_0} out of range")]
    SlotOutOfRange(#[error(not(source))] u8),
    /// The dispatch queue has no room for another waiting command.
    #[display("dispatch queue is full")]
    QueueFull,
    /// The operation needs an active session.
    #[display("no active session")]
    NotConnected,
    /// Bytes do not form any known command.
    #[display("malformed command bytes")]
    MalformedCommand,
    /// A color string is not `#rrggbb`, `0xrrggbb`, or `rrggbb`.
    #[display("invalid color string")]
    InvalidColor,
    /// The notification could not be handed to the device loop.
    #[display("notification dropped: link event queue full or frame too long")]
    NotificationOverflow,
}
