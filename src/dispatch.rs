//! Single-in-flight FIFO dispatch queue.
//!
//! [`DispatchQueue`] is a pure state machine: it never touches the link. Each transition
//! returns the command that must be written next (if any), and the caller reports back
//! with [`on_transport_complete`](DispatchQueue::on_transport_complete) or
//! [`on_transport_failure`](DispatchQueue::on_transport_failure). A command is only ever
//! handed out while no other command is in flight.
//!
//! ```text
//!            enqueue                 complete / failure (wait list empty)
//!   Idle ───────────────▶ Busy ──────────────────────────────────────────▶ Idle
//!                          │ ▲
//!                          └─┘ complete / failure (pop next waiting command)
//! ```

use heapless::Deque;

use crate::command::Command;
use crate::{Error, Result};

/// Default number of commands that may wait behind the in-flight one.
pub const QUEUE_CAPACITY: usize = 128;

/// Nominal depth used only to scale [`DispatchQueue::fullness_percent`].
pub const NOMINAL_QUEUE_CAPACITY: usize = 10;

/// FIFO of commands with at most one in flight.
#[derive(Debug)]
pub struct DispatchQueue<const CAPACITY: usize = QUEUE_CAPACITY> {
    in_flight: Option<Command>,
    waiting: Deque<Command, CAPACITY>,
}

impl<const CAPACITY: usize> DispatchQueue<CAPACITY> {
    /// An idle, empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            in_flight: None,
            waiting: Deque::new(),
        }
    }

    /// Add a command.
    ///
    /// Returns `Some(command)` when the queue was idle: the caller must write it now.
    /// Otherwise the command waits its turn and `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueFull`] when `CAPACITY` commands are already waiting; the
    /// queue is left unchanged.
    pub fn enqueue(&mut self, command: Command) -> Result<Option<Command>> {
        if self.in_flight.is_none() {
            self.in_flight = Some(command);
            return Ok(Some(command));
        }
        self.waiting
            .push_back(command)
            .map_err(|_| Error::QueueFull)?;
        Ok(None)
    }

    /// The in-flight command was written. Returns the next command to write, if any.
    pub fn on_transport_complete(&mut self) -> Option<Command> {
        self.advance()
    }

    /// The in-flight command failed and is dropped. Waiting commands are not stranded:
    /// the next one is returned for writing, exactly as after a completion.
    pub fn on_transport_failure(&mut self) -> Option<Command> {
        if let Some(dropped) = self.in_flight {
            warn!("dropping failed command {:?}", dropped);
        }
        self.advance()
    }

    fn advance(&mut self) -> Option<Command> {
        self.in_flight = self.waiting.pop_front();
        self.in_flight
    }

    /// The command awaiting completion, if any.
    #[must_use]
    pub const fn in_flight(&self) -> Option<Command> {
        self.in_flight
    }

    /// True while a command awaits completion.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Commands waiting behind the in-flight one.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.waiting.len()
    }

    /// Waiting commands as a percentage of `nominal`, capped at 100. Display only.
    #[must_use]
    pub fn fullness_percent(&self, nominal: usize) -> u8 {
        let nominal = nominal.max(1);
        let percent = self
            .pending_len()
            .saturating_mul(100)
            .checked_div(nominal)
            .map_or(100, |percent| percent.min(100));
        u8::try_from(percent).unwrap_or(100)
    }

    /// Drop everything and return to idle. Returns how many commands were dropped,
    /// counting the in-flight one.
    pub fn reset(&mut self) -> usize {
        let dropped = self
            .pending_len()
            .saturating_add(usize::from(self.in_flight.is_some()));
        self.in_flight = None;
        self.waiting.clear();
        dropped
    }
}

impl<const CAPACITY: usize> Default for DispatchQueue<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SlotId;

    fn save(id: u8) -> Command {
        Command::SaveSlot(SlotId::new(id).expect("valid slot"))
    }

    #[test]
    fn completions_dispatch_in_enqueue_order() {
        let mut queue: DispatchQueue = DispatchQueue::new();
        assert_eq!(queue.enqueue(save(0)), Ok(Some(save(0))));
        assert_eq!(queue.enqueue(save(1)), Ok(None));
        assert_eq!(queue.enqueue(save(2)), Ok(None));
        assert_eq!(queue.enqueue(Command::Clear), Ok(None));

        let mut written = vec![save(0)];
        while let Some(next) = queue.on_transport_complete() {
            written.push(next);
        }
        assert_eq!(written, [save(0), save(1), save(2), Command::Clear]);
        assert!(!queue.is_busy());
    }

    #[test]
    fn busy_queue_never_hands_out_a_second_command() {
        let mut queue: DispatchQueue = DispatchQueue::new();
        assert!(queue.enqueue(save(0)).expect("room").is_some());
        for _ in 0..5 {
            assert_eq!(queue.enqueue(Command::Clear), Ok(None));
        }
        assert_eq!(queue.in_flight(), Some(save(0)));
        assert_eq!(queue.pending_len(), 5);
    }

    #[test]
    fn failure_drops_only_the_in_flight_command_and_drains() {
        let mut queue: DispatchQueue = DispatchQueue::new();
        queue.enqueue(save(0)).expect("room");
        queue.enqueue(save(1)).expect("room");
        assert_eq!(queue.on_transport_failure(), Some(save(1)));
        assert_eq!(queue.on_transport_failure(), None);
        assert!(!queue.is_busy());
        assert_eq!(queue.enqueue(save(3)), Ok(Some(save(3))));
    }

    #[test]
    fn full_wait_list_rejects_without_losing_order() {
        let mut queue: DispatchQueue<2> = DispatchQueue::new();
        queue.enqueue(save(0)).expect("room");
        queue.enqueue(save(1)).expect("room");
        queue.enqueue(save(2)).expect("room");
        assert_eq!(queue.enqueue(save(3)), Err(Error::QueueFull));
        assert_eq!(queue.on_transport_complete(), Some(save(1)));
        assert_eq!(queue.on_transport_complete(), Some(save(2)));
    }

    #[test]
    fn reset_with_one_in_flight_and_two_waiting() {
        let mut queue: DispatchQueue = DispatchQueue::new();
        queue.enqueue(save(0)).expect("room");
        queue.enqueue(save(1)).expect("room");
        queue.enqueue(save(2)).expect("room");
        assert_eq!(queue.reset(), 3);
        assert!(!queue.is_busy());
        assert_eq!(queue.pending_len(), 0);
        assert_eq!(queue.on_transport_complete(), None);
    }

    #[test]
    fn fullness_scales_to_nominal_and_caps() {
        let mut queue: DispatchQueue = DispatchQueue::new();
        assert_eq!(queue.fullness_percent(NOMINAL_QUEUE_CAPACITY), 0);
        queue.enqueue(Command::Clear).expect("room");
        assert_eq!(queue.fullness_percent(NOMINAL_QUEUE_CAPACITY), 0);
        for _ in 0..3 {
            queue.enqueue(Command::Clear).expect("room");
        }
        assert_eq!(queue.fullness_percent(NOMINAL_QUEUE_CAPACITY), 30);
        for _ in 0..20 {
            queue.enqueue(Command::Clear).expect("room");
        }
        assert_eq!(queue.fullness_percent(NOMINAL_QUEUE_CAPACITY), 100);
    }
}
