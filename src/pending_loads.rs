//! Attribution of inbound frames to outstanding `LoadSlot` requests.
//!
//! The panel answers loads in the order they were written, so frames are matched FIFO.
//! A request whose sync deadline passed stays queued as a stale marker for a while: if its
//! frame shows up late, the marker absorbs it instead of letting it land on the next slot.

use embassy_time::Instant;
use heapless::Deque;

use crate::snapshot::SlotId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingLoad {
    slot: SlotId,
    stale_until: Option<Instant>,
}

impl PendingLoad {
    const fn is_live(&self) -> bool {
        self.stale_until.is_none()
    }
}

/// Where an inbound frame belongs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Attribution {
    /// Reply to an outstanding load of this slot.
    Load(SlotId),
    /// Reply to a load of this slot that already timed out.
    Late(SlotId),
    /// Nothing was asked for.
    Unsolicited,
}

/// FIFO of `LoadSlot` requests awaiting their frame.
pub(crate) struct PendingLoads<const N: usize> {
    entries: Deque<PendingLoad, N>,
}

impl<const N: usize> PendingLoads<N> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Deque::new(),
        }
    }

    /// Record a load whose write is starting. When full, the oldest entry is evicted and
    /// its slot returned.
    pub(crate) fn expect(&mut self, slot: SlotId, now: Instant) -> Option<SlotId> {
        self.purge(now);
        let evicted = if self.entries.is_full() {
            self.entries.pop_front().map(|entry| entry.slot)
        } else {
            None
        };
        let _ = self.entries.push_back(PendingLoad {
            slot,
            stale_until: None,
        });
        evicted
    }

    /// Drop the newest live request for `slot`. Used when its write failed, so no frame
    /// will ever answer it.
    pub(crate) fn forget(&mut self, slot: SlotId) -> bool {
        let newest = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.slot == slot && entry.is_live())
            .map(|(position, _)| position)
            .last();
        let Some(newest) = newest else {
            return false;
        };
        for position in 0..self.entries.len() {
            if let Some(entry) = self.entries.pop_front() {
                if position != newest {
                    let _ = self.entries.push_back(entry);
                }
            }
        }
        true
    }

    /// Turn the newest live request for `slot` into a stale marker that lives until
    /// `until`.
    pub(crate) fn mark_stale(&mut self, slot: SlotId, until: Instant) -> bool {
        let newest = self
            .entries
            .iter_mut()
            .filter(|entry| entry.slot == slot && entry.is_live())
            .last();
        match newest {
            Some(entry) => {
                entry.stale_until = Some(until);
                true
            }
            None => false,
        }
    }

    /// Consume the entry an inbound frame answers.
    pub(crate) fn attribute(&mut self, now: Instant) -> Attribution {
        self.purge(now);
        match self.entries.pop_front() {
            Some(entry) if entry.is_live() => Attribution::Load(entry.slot),
            Some(entry) => Attribution::Late(entry.slot),
            None => Attribution::Unsolicited,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    // Expired markers are dropped wherever they sit.
    fn purge(&mut self, now: Instant) {
        for _ in 0..self.entries.len() {
            if let Some(entry) = self.entries.pop_front() {
                if entry.stale_until.is_none_or(|until| until > now) {
                    let _ = self.entries.push_back(entry);
                }
            }
        }
    }
}
