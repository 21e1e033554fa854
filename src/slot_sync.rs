//! Request→response sweep that reloads all four slots from the panel.
//!
//! For each slot in order the sweep selects the slot, asks for its pixels, and waits
//! for exactly one response (or a timeout) before moving on. When slot 3 is done the
//! panel is put back on slot 0.

use crate::command::Command;
use crate::snapshot::SlotId;

/// Commands issued for one slot: select it, then ask for its pixels.
pub type SlotRequest = [Command; 2];

/// What the device loop does after a slot's response (or timeout).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncStep {
    /// Issue these commands and keep waiting.
    Next(SlotRequest),
    /// Sweep finished; issue this final `SelectSlot(0)`.
    Done(Command),
}

/// Progress of one sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotSync {
    awaiting: SlotId,
}

impl SlotSync {
    /// Begin a sweep at slot 0.
    #[must_use]
    pub const fn start() -> (Self, SlotRequest) {
        let awaiting = SlotId::FIRST;
        (Self { awaiting }, requests_for(awaiting))
    }

    /// The slot whose response the sweep is waiting for.
    #[must_use]
    pub const fn awaiting(&self) -> SlotId {
        self.awaiting
    }

    /// The awaited slot has answered or timed out.
    #[must_use]
    pub const fn advance(&mut self) -> SyncStep {
        match self.awaiting.next() {
            Some(next) => {
                self.awaiting = next;
                SyncStep::Next(requests_for(next))
            }
            None => SyncStep::Done(Command::SelectSlot(SlotId::FIRST)),
        }
    }
}

const fn requests_for(slot: SlotId) -> SlotRequest {
    [Command::SelectSlot(slot), Command::LoadSlot(slot)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_loads_each_slot_once_in_order() {
        let (mut sync, first) = SlotSync::start();
        let mut issued: Vec<Command> = first.to_vec();
        let done = loop {
            match sync.advance() {
                SyncStep::Next(requests) => issued.extend(requests),
                SyncStep::Done(last) => break last,
            }
        };

        let loads: Vec<u8> = issued
            .iter()
            .filter_map(|command| match command {
                Command::LoadSlot(slot) => Some(slot.get()),
                _ => None,
            })
            .collect();
        assert_eq!(loads, [0, 1, 2, 3]);
        assert_eq!(done, Command::SelectSlot(SlotId::FIRST));
        assert_eq!(sync.awaiting().get(), 3);
    }

    #[test]
    fn each_load_is_preceded_by_its_select() {
        let (mut sync, first) = SlotSync::start();
        assert_eq!(first[0], Command::SelectSlot(SlotId::FIRST));
        let SyncStep::Next(second) = sync.advance() else {
            panic!("sweep ended after one slot");
        };
        let slot1 = SlotId::new(1).expect("valid slot");
        assert_eq!(second, [Command::SelectSlot(slot1), Command::LoadSlot(slot1)]);
    }
}
