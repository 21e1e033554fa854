//! In-memory panel and link used by the host tests.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::cell::RefCell;
use std::collections::HashSet;
use std::future::Future;
use std::rc::Rc;

use embassy_futures::block_on;
use embassy_futures::select::{Either, select};
use embassy_futures::yield_now;
use embassy_time::{Duration, Timer, with_timeout};
use pixel_link::command::Command;
use pixel_link::link::{Link, NotificationSink};
use pixel_link::panel::{FRAME_BYTES, WireFrame};
use pixel_link::pixel_link::{
    PixelLink, PixelLinkConfig, PixelLinkStatic, pixel_link_device_loop,
};
use pixel_link::snapshot::{SLOT_COUNT, SlotId};
use pixel_link::{Error, Result};

/// Emulates the panel firmware: a working buffer, four slots, and an active slot.
#[derive(Clone, Debug, Default)]
pub struct FakePanel {
    pub buffer: WireFrame,
    pub slots: [WireFrame; SLOT_COUNT],
    pub active: SlotId,
}

impl FakePanel {
    /// Apply one encoded command. `LoadSlot` answers with the slot's wire-order bytes.
    pub fn apply(&mut self, bytes: &[u8]) -> Option<[u8; FRAME_BYTES]> {
        match Command::parse(bytes).expect("panel understands every command") {
            Command::Paint { cell, color } => self.buffer.set_cell(cell, color),
            Command::Clear => self.buffer = WireFrame::new(),
            Command::SaveSlot(slot) => self.slots[slot.index()] = self.buffer,
            Command::LoadSlot(slot) => {
                self.buffer = self.slots[slot.index()];
                return Some(self.buffer.to_bytes());
            }
            Command::SelectSlot(slot) => self.active = slot,
        }
        None
    }
}

/// Everything the fake link saw and how it should misbehave.
#[derive(Debug, Default)]
pub struct LinkLog {
    pub panel: FakePanel,
    pub writes: Vec<Vec<u8>>,
    pub outstanding: usize,
    pub max_outstanding: usize,
    pub connects: usize,
    pub disconnects: usize,
    pub sink: Option<NotificationSink>,
    pub refuse_connect: bool,
    pub mute_loads: bool,
    pub hang_writes: bool,
    pub failing_writes: HashSet<usize>,
    pub yields_per_write: usize,
}

impl LinkLog {
    pub fn sink(&self) -> NotificationSink {
        self.sink.expect("link connected")
    }

    pub fn decoded_writes(&self) -> Vec<Command> {
        self.writes
            .iter()
            .map(|bytes| Command::parse(bytes).expect("valid command bytes"))
            .collect()
    }
}

/// A [`Link`] whose writes take a few polls, then land on a [`FakePanel`].
#[derive(Clone, Debug)]
pub struct FakeLink {
    pub log: Rc<RefCell<LinkLog>>,
}

impl FakeLink {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(LinkLog {
                yields_per_write: 3,
                ..LinkLog::default()
            })),
        }
    }

    pub fn configure(self, f: impl FnOnce(&mut LinkLog)) -> Self {
        f(&mut self.log.borrow_mut());
        self
    }

}

impl Link for FakeLink {
    async fn connect(&mut self, sink: NotificationSink) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.connects += 1;
        if log.refuse_connect {
            return Err(Error::Connection);
        }
        log.sink = Some(sink);
        Ok(())
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let (yields, hang) = {
            let mut log = self.log.borrow_mut();
            log.outstanding += 1;
            log.max_outstanding = log.max_outstanding.max(log.outstanding);
            (log.yields_per_write, log.hang_writes)
        };
        let _guard = Outstanding(Rc::clone(&self.log));
        for _ in 0..yields {
            yield_now().await;
        }
        if hang {
            core::future::pending::<()>().await;
        }

        let mut log = self.log.borrow_mut();
        let index = log.writes.len();
        log.writes.push(bytes.to_vec());
        if log.failing_writes.contains(&index) {
            return Err(Error::Transport);
        }
        let response = log.panel.apply(bytes);
        if let (Some(frame), false, Some(sink)) = (response, log.mute_loads, log.sink) {
            sink.deliver(&frame).expect("device loop keeps up");
        }
        Ok(())
    }

    async fn disconnect(&mut self) {
        let mut log = self.log.borrow_mut();
        log.disconnects += 1;
        log.sink = None;
    }
}

// Counts a write as finished even when its future is dropped mid-flight.
struct Outstanding(Rc<RefCell<LinkLog>>);

impl Drop for Outstanding {
    fn drop(&mut self) {
        self.0.borrow_mut().outstanding -= 1;
    }
}

/// Run `body` against a device loop driving `link`, then hand back the link's log.
///
/// Panics if `body` takes over 10 s.
pub fn run<Fut>(
    pixel_link_static: &'static PixelLinkStatic,
    link: FakeLink,
    config: PixelLinkConfig,
    body: impl FnOnce(PixelLink, Rc<RefCell<LinkLog>>) -> Fut,
) -> Rc<RefCell<LinkLog>>
where
    Fut: Future<Output = ()>,
{
    let log = Rc::clone(&link.log);
    let device = pixel_link_device_loop(pixel_link_static, link, config);
    let ui = with_timeout(
        Duration::from_secs(10),
        body(PixelLink::new(pixel_link_static), Rc::clone(&log)),
    );
    match block_on(select(device, ui)) {
        Either::First(never) => match never {},
        Either::Second(result) => result.expect("test body finished in time"),
    }
    log
}

/// Poll `condition` every millisecond until it holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    while !condition() {
        Timer::after(Duration::from_millis(1)).await;
    }
}

pub fn slot(id: u8) -> SlotId {
    SlotId::new(id).expect("valid slot")
}
