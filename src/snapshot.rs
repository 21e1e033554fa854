//! Local mirror of the panel's four save slots.
//!
//! The store caches what the panel is believed to hold. It is not authoritative; a
//! `LoadSlot` round trip is the only way to reconcile a slot with the device.

use crate::panel::{FRAME_BYTES, PanelFrame};
use crate::{Error, Result};

/// Number of save slots on the panel.
pub const SLOT_COUNT: usize = 4;

/// Identity of one save slot, in `0..4`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotId(u8);

impl SlotId {
    /// Slot 0, the slot the panel starts on.
    pub const FIRST: Self = Self(0);

    /// Validate a raw slot id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SlotOutOfRange`] for ids of 4 or more.
    pub const fn new(id: u8) -> Result<Self> {
        if (id as usize) < SLOT_COUNT {
            Ok(Self(id))
        } else {
            Err(Error::SlotOutOfRange(id))
        }
    }

    /// The id as a raw byte.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The id as an index into the store.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The slot after this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match Self::new(self.0.saturating_add(1)) {
            Ok(slot) => Some(slot),
            Err(_) => None,
        }
    }

    /// All slots in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..SLOT_COUNT as u8).map(Self)
    }
}

/// Four row-major snapshots, addressed by [`SlotId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotStore {
    slots: [PanelFrame; SLOT_COUNT],
}

impl SnapshotStore {
    /// Four black snapshots.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [PanelFrame::new(); SLOT_COUNT],
        }
    }

    /// Overwrite a slot.
    pub fn write(&mut self, slot: SlotId, frame: PanelFrame) {
        if let Some(stored) = self.slots.get_mut(slot.index()) {
            *stored = frame;
        }
    }

    /// Read a slot.
    #[must_use]
    pub fn read(&self, slot: SlotId) -> PanelFrame {
        self.slots.get(slot.index()).copied().unwrap_or_default()
    }

    /// Reset a slot to black.
    pub fn clear(&mut self, slot: SlotId) {
        self.write(slot, PanelFrame::new());
    }

    /// Read a slot as 192 row-major RGB bytes.
    #[must_use]
    pub fn read_bytes(&self, slot: SlotId) -> [u8; FRAME_BYTES] {
        self.read(slot).to_bytes()
    }

    /// Overwrite a slot from 192 row-major RGB bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameLength`] and leaves the slot untouched unless `bytes` is
    /// exactly 192 long.
    pub fn write_bytes(&mut self, slot: SlotId, bytes: &[u8]) -> Result<()> {
        let frame = PanelFrame::from_bytes(bytes)?;
        self.write(slot, frame);
        Ok(())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
