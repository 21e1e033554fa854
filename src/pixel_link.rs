//! A device abstraction that keeps an 8×8 LED panel in step with a painting UI.
//!
//! The UI holds a [`PixelLink`] handle; a single [`pixel_link_device_loop`] task owns
//! the [`Link`] and the [`DispatchQueue`]. Handle methods apply their local effect to the
//! shared grid and snapshot store at once, then pass the wire command to the loop. The
//! loop writes commands one at a time, attributes inbound frames to `LoadSlot` requests,
//! runs slot sync sweeps, and reports outcomes as [`PanelEvent`]s.
//!
//! # Example
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use pixel_link::color::colors;
//! use pixel_link::link::{Link, NotificationSink};
//! use pixel_link::pixel_link::{
//!     PanelEvent, PixelLink, PixelLinkConfig, PixelLinkStatic, pixel_link_device_loop,
//! };
//!
//! # struct Radio;
//! # impl Link for Radio {
//! #     async fn connect(&mut self, _sink: NotificationSink) -> pixel_link::Result<()> { Ok(()) }
//! #     async fn write(&mut self, _bytes: &[u8]) -> pixel_link::Result<()> { Ok(()) }
//! #     async fn disconnect(&mut self) {}
//! # }
//! static PIXEL_LINK_STATIC: PixelLinkStatic = PixelLink::new_static();
//!
//! async fn device_task(radio: Radio) -> Infallible {
//!     pixel_link_device_loop(&PIXEL_LINK_STATIC, radio, PixelLinkConfig::DEFAULT).await
//! }
//!
//! async fn ui() -> pixel_link::Result<()> {
//!     let pixel_link = PixelLink::new(&PIXEL_LINK_STATIC);
//!     pixel_link.connect().await;
//!     if let PanelEvent::Connected = pixel_link.wait_for_event().await {
//!         pixel_link.paint_at(0, 0, colors::RED).await?;
//!         pixel_link.sync_all_slots().await;
//!     }
//!     Ok(())
//! }
//! ```

use core::cell::RefCell;
use core::convert::Infallible;
use core::future::pending;
use core::pin::pin;

use embassy_futures::select::{Either, Either4, select, select4};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant, TimeoutError, Timer, with_timeout};

use crate::color::{BLACK, RGB8};
use crate::command::{Command, decode_notification};
use crate::dispatch::{DispatchQueue, NOMINAL_QUEUE_CAPACITY};
use crate::link::{Link, LinkEvent, LinkEventChannel, NotificationSink};
use crate::panel::layout::to_physical;
use crate::panel::{CellId, PanelFrame, WireFrame};
use crate::pending_loads::{Attribution, PendingLoads};
use crate::slot_sync::{SlotRequest, SlotSync, SyncStep};
use crate::snapshot::{SLOT_COUNT, SlotId, SnapshotStore};
use crate::{Error, Result};

/// Requests buffered between handles and the device loop.
pub const REQUEST_CAPACITY: usize = 16;
/// Events buffered for the UI. When full, the oldest event is discarded.
pub const EVENT_CAPACITY: usize = 16;
/// `LoadSlot` responses that may be outstanding at once.
const PENDING_LOAD_CAPACITY: usize = 2 * SLOT_COUNT;

/// Timing knobs for [`pixel_link_device_loop`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelLinkConfig {
    /// Longest a single write may take before the session is considered dead.
    pub write_timeout: Duration,
    /// Longest a slot sync waits for one slot's frame before moving on. A frame that
    /// arrives within a further `sync_response_timeout` is discarded as late.
    pub sync_response_timeout: Duration,
    /// Queue depth shown as 100% in [`PanelStatus::fullness_percent`].
    pub nominal_queue_capacity: usize,
}

impl PixelLinkConfig {
    /// Two-second write and sync timeouts; fullness scaled to 10 waiting commands.
    pub const DEFAULT: Self = Self {
        write_timeout: Duration::from_secs(2),
        sync_response_timeout: Duration::from_secs(2),
        nominal_queue_capacity: NOMINAL_QUEUE_CAPACITY,
    };
}

impl Default for PixelLinkConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Session state as seen by the UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// No session.
    #[default]
    Disconnected,
    /// [`Link::connect`] is running.
    Connecting,
    /// Commands are being sent.
    Connected,
}

/// Snapshot of the loop's progress, for status displays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelStatus {
    /// Current session state.
    pub connection: ConnectionState,
    /// Slot that clear targets and the panel is believed to be on.
    pub active_slot: SlotId,
    /// A write is outstanding.
    pub busy: bool,
    /// Commands waiting behind the outstanding write.
    pub pending: usize,
    /// `pending` relative to the nominal queue capacity, 0..=100.
    pub fullness_percent: u8,
    /// A slot sync sweep is running.
    pub syncing: bool,
}

impl PanelStatus {
    const INITIAL: Self = Self {
        connection: ConnectionState::Disconnected,
        active_slot: SlotId::FIRST,
        busy: false,
        pending: 0,
        fullness_percent: 0,
        syncing: false,
    };
}

/// Outcome reported by the device loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelEvent {
    /// Session established.
    Connected,
    /// [`Link::connect`] failed; still disconnected.
    ConnectionFailed(Error),
    /// Session ended; `dropped` commands (in flight and waiting) were discarded.
    Disconnected {
        /// Commands discarded.
        dropped: usize,
    },
    /// A write failed and its command was dropped.
    WriteFailed {
        /// The dropped command.
        command: Command,
        /// Why.
        error: Error,
    },
    /// A command was never queued.
    CommandRejected {
        /// The rejected command.
        command: Command,
        /// Why.
        error: Error,
    },
    /// An inbound frame could not be used; the snapshot store is unchanged.
    FrameRejected(Error),
    /// A slot's pixels arrived and are in the snapshot store.
    SlotLoaded(SlotId),
    /// A sync sweep gave up waiting for a slot.
    SlotLoadTimedOut(SlotId),
    /// A sync sweep was requested while disconnected or already syncing.
    SyncRejected,
    /// All four slots were loaded (or timed out) and the panel is back on slot 0.
    SyncCompleted,
}

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Request {
    Connect,
    Disconnect,
    Send(Command),
    SyncAllSlots,
}

struct PanelState {
    status: PanelStatus,
    grid: WireFrame,
    store: SnapshotStore,
}

impl PanelState {
    const fn new() -> Self {
        Self {
            status: PanelStatus::INITIAL,
            grid: WireFrame::new(),
            store: SnapshotStore::new(),
        }
    }
}

type RequestChannel = Channel<CriticalSectionRawMutex, Request, REQUEST_CAPACITY>;
type EventChannel = Channel<CriticalSectionRawMutex, PanelEvent, EVENT_CAPACITY>;

/// Static resources shared by [`PixelLink`] handles and [`pixel_link_device_loop`].
pub struct PixelLinkStatic {
    requests: RequestChannel,
    link_events: LinkEventChannel,
    events: EventChannel,
    state: Mutex<CriticalSectionRawMutex, RefCell<PanelState>>,
}

impl PixelLinkStatic {
    /// Create static resources for a pixel link.
    #[must_use]
    pub const fn new_static() -> Self {
        Self {
            requests: Channel::new(),
            link_events: Channel::new(),
            events: Channel::new(),
            state: Mutex::new(RefCell::new(PanelState::new())),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut PanelState) -> R) -> R {
        self.state.lock(|state| f(&mut state.borrow_mut()))
    }

    // Back to the state before any session: status (including the active slot) and link
    // events. The grid and snapshots are kept.
    fn reset_state(&self) {
        self.link_events.clear();
        self.with_state(|state| state.status = PanelStatus::INITIAL);
    }

    fn emit(&self, event: PanelEvent) {
        if self.events.try_send(event).is_err() {
            let _ = self.events.try_receive();
            if self.events.try_send(event).is_err() {
                warn!("event dropped: {:?}", event);
            }
        }
    }
}

/// UI-side handle. Cheap to copy; every copy talks to the same device loop.
#[derive(Clone, Copy)]
pub struct PixelLink {
    pixel_link_static: &'static PixelLinkStatic,
}

impl PixelLink {
    /// Create static resources for a pixel link.
    #[must_use]
    pub const fn new_static() -> PixelLinkStatic {
        PixelLinkStatic::new_static()
    }

    /// Create a handle. [`pixel_link_device_loop`] must be running on the same statics
    /// for wire commands to go anywhere.
    #[must_use]
    pub const fn new(pixel_link_static: &'static PixelLinkStatic) -> Self {
        Self { pixel_link_static }
    }

    /// Ask the loop to open a session. The outcome arrives as [`PanelEvent::Connected`]
    /// or [`PanelEvent::ConnectionFailed`].
    pub async fn connect(&self) {
        self.send(Request::Connect).await;
    }

    /// End the session, discarding queued commands. Does nothing while disconnected.
    pub async fn disconnect(&self) {
        self.send(Request::Disconnect).await;
    }

    /// Paint one cell in the grid and on the panel.
    pub async fn paint(&self, cell: CellId, color: RGB8) {
        self.pixel_link_static
            .with_state(|state| state.grid.set_cell(cell, color));
        self.send(Request::Send(Command::Paint { cell, color }))
            .await;
    }

    /// Paint the cell drawn at visual `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PositionOutOfRange`] off the panel; nothing is painted or sent.
    pub async fn paint_at(&self, row: u8, col: u8, color: RGB8) -> Result<()> {
        let cell = to_physical(row, col)?;
        self.paint(cell, color).await;
        Ok(())
    }

    /// Blacken the grid and the active slot, and clear the panel.
    pub async fn clear(&self) {
        self.pixel_link_static.with_state(|state| {
            state.grid.fill(BLACK);
            let active_slot = state.status.active_slot;
            state.store.clear(active_slot);
        });
        self.send(Request::Send(Command::Clear)).await;
    }

    /// Copy the grid into `slot` and have the panel persist its buffer there.
    pub async fn save_slot(&self, slot: SlotId) {
        self.pixel_link_static.with_state(|state| {
            let frame = PanelFrame::from_wire(&state.grid);
            state.store.write(slot, frame);
        });
        self.send(Request::Send(Command::SaveSlot(slot))).await;
    }

    /// Ask the panel for `slot`'s pixels. The reply arrives as [`PanelEvent::SlotLoaded`].
    pub async fn load_slot(&self, slot: SlotId) {
        self.send(Request::Send(Command::LoadSlot(slot))).await;
    }

    /// Make `slot` the active slot locally and on the panel.
    pub async fn select_slot(&self, slot: SlotId) {
        self.pixel_link_static
            .with_state(|state| state.status.active_slot = slot);
        self.send(Request::Send(Command::SelectSlot(slot))).await;
    }

    /// Reload all four slots from the panel; ends with [`PanelEvent::SyncCompleted`].
    pub async fn sync_all_slots(&self) {
        self.send(Request::SyncAllSlots).await;
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> PanelStatus {
        self.pixel_link_static.with_state(|state| state.status)
    }

    /// Cached pixels of `slot`, row-major.
    #[must_use]
    pub fn snapshot(&self, slot: SlotId) -> PanelFrame {
        self.pixel_link_static
            .with_state(|state| state.store.read(slot))
    }

    /// The painted grid in wire order.
    #[must_use]
    pub fn grid(&self) -> WireFrame {
        self.pixel_link_static.with_state(|state| state.grid)
    }

    /// The painted grid, row-major for drawing.
    #[must_use]
    pub fn grid_frame(&self) -> PanelFrame {
        PanelFrame::from_wire(&self.grid())
    }

    /// Wait for the next event from the device loop.
    pub async fn wait_for_event(&self) -> PanelEvent {
        self.pixel_link_static.events.receive().await
    }

    /// Next event, if one is ready.
    #[must_use]
    pub fn try_event(&self) -> Option<PanelEvent> {
        self.pixel_link_static.events.try_receive().ok()
    }

    async fn send(&self, request: Request) {
        self.pixel_link_static.requests.send(request).await;
    }
}

impl core::fmt::Debug for PixelLink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixelLink")
            .field("status", &self.status())
            .finish()
    }
}

/// Run the panel session manager forever.
///
/// While disconnected, wire commands are discarded (their local effects were already
/// applied by the handle). While connected, exactly one write is outstanding at a time.
pub async fn pixel_link_device_loop<L: Link>(
    pixel_link_static: &'static PixelLinkStatic,
    mut link: L,
    config: PixelLinkConfig,
) -> Infallible {
    loop {
        match pixel_link_static.requests.receive().await {
            Request::Connect => {
                pixel_link_static
                    .with_state(|state| state.status.connection = ConnectionState::Connecting);
                pixel_link_static.link_events.clear();
                let sink = NotificationSink::new(&pixel_link_static.link_events);
                match link.connect(sink).await {
                    Ok(()) => {
                        info!("panel connected");
                        pixel_link_static.with_state(|state| {
                            state.status.connection = ConnectionState::Connected;
                        });
                        pixel_link_static.emit(PanelEvent::Connected);
                        run_session(pixel_link_static, &mut link, config).await;
                    }
                    Err(error) => {
                        warn!("panel connection failed: {}", error);
                        pixel_link_static.reset_state();
                        pixel_link_static.emit(PanelEvent::ConnectionFailed(error));
                    }
                }
            }
            Request::Disconnect => debug!("disconnect ignored: no session"),
            Request::Send(command) => trace!("not connected, {:?} stays local", command),
            Request::SyncAllSlots => {
                warn!("slot sync needs a session");
                pixel_link_static.emit(PanelEvent::SyncRejected);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Disconnect,
    LinkLost,
}

struct Session {
    pixel_link_static: &'static PixelLinkStatic,
    config: PixelLinkConfig,
    queue: DispatchQueue,
    pending_loads: PendingLoads<PENDING_LOAD_CAPACITY>,
    sync: Option<SlotSync>,
    sync_deadline: Option<Instant>,
}

async fn run_session<L: Link>(
    pixel_link_static: &'static PixelLinkStatic,
    link: &mut L,
    config: PixelLinkConfig,
) {
    let mut session = Session {
        pixel_link_static,
        config,
        queue: DispatchQueue::new(),
        pending_loads: PendingLoads::new(),
        sync: None,
        sync_deadline: None,
    };

    let flow = loop {
        session.publish_status();
        let flow = match session.queue.in_flight() {
            Some(command) => session.write_in_flight(link, command).await,
            None => session.idle().await,
        };
        if flow != Flow::Continue {
            break flow;
        }
    };

    if flow == Flow::Disconnect {
        link.disconnect().await;
    }
    session.reset();
}

impl Session {
    // Drives one outstanding write while still servicing requests, frames, and the sync
    // deadline, so a slow write never stalls inbound traffic.
    async fn write_in_flight<L: Link>(&mut self, link: &mut L, command: Command) -> Flow {
        let bytes = match command.encode() {
            Ok(bytes) => bytes,
            Err(error) => return self.on_write_result(command, Err(error)),
        };
        trace!("writing {:?}", command);
        if let Command::LoadSlot(slot) = command {
            self.expect_load(slot);
        }
        let statics = self.pixel_link_static;
        let mut write = pin!(with_timeout(self.config.write_timeout, link.write(&bytes)));
        loop {
            let outcome = select4(
                write.as_mut(),
                statics.link_events.receive(),
                statics.requests.receive(),
                sync_timer(self.sync_deadline),
            )
            .await;
            let flow = match outcome {
                Either4::First(Ok(result)) => return self.on_write_result(command, result),
                Either4::First(Err(TimeoutError)) => {
                    error!("write of {:?} timed out, dropping session", command);
                    statics.emit(PanelEvent::WriteFailed {
                        command,
                        error: Error::WriteTimeout,
                    });
                    return Flow::Disconnect;
                }
                Either4::Second(event) => self.on_link_event(event),
                Either4::Third(request) => self.on_request(request),
                Either4::Fourth(()) => self.on_sync_timeout(),
            };
            if flow != Flow::Continue {
                return flow;
            }
            self.publish_status();
        }
    }

    async fn idle(&mut self) -> Flow {
        let statics = self.pixel_link_static;
        let outcome = select(
            select(statics.link_events.receive(), statics.requests.receive()),
            sync_timer(self.sync_deadline),
        )
        .await;
        match outcome {
            Either::First(Either::First(event)) => self.on_link_event(event),
            Either::First(Either::Second(request)) => self.on_request(request),
            Either::Second(()) => self.on_sync_timeout(),
        }
    }

    fn on_write_result(&mut self, command: Command, result: Result<()>) -> Flow {
        match result {
            Ok(()) => {
                self.queue.on_transport_complete();
            }
            Err(error) => {
                warn!("write of {:?} failed: {}", command, error);
                self.pixel_link_static
                    .emit(PanelEvent::WriteFailed { command, error });
                self.queue.on_transport_failure();
                if let Command::LoadSlot(slot) = command {
                    self.pending_loads.forget(slot);
                    if self.sync_awaits(slot) {
                        self.sync_advance();
                    }
                }
            }
        }
        Flow::Continue
    }

    fn on_request(&mut self, request: Request) -> Flow {
        match request {
            Request::Connect => debug!("already connected"),
            Request::Disconnect => return Flow::Disconnect,
            Request::Send(command) => self.enqueue(command),
            Request::SyncAllSlots => self.sync_start(),
        }
        Flow::Continue
    }

    fn on_link_event(&mut self, event: LinkEvent) -> Flow {
        match event {
            LinkEvent::Lost => {
                warn!("panel link lost");
                Flow::LinkLost
            }
            LinkEvent::Notification(bytes) => {
                self.on_notification(&bytes);
                Flow::Continue
            }
        }
    }

    fn on_notification(&mut self, bytes: &[u8]) {
        let frame = match decode_notification(bytes) {
            Ok(frame) => frame,
            Err(error) => {
                warn!("discarding notification: {}", error);
                self.pixel_link_static.emit(PanelEvent::FrameRejected(error));
                return;
            }
        };
        let slot = match self.pending_loads.attribute(Instant::now()) {
            Attribution::Load(slot) => slot,
            Attribution::Late(slot) => {
                warn!("discarding late frame for slot {}", slot.get());
                self.pixel_link_static
                    .emit(PanelEvent::FrameRejected(Error::LateFrame));
                return;
            }
            Attribution::Unsolicited => {
                warn!("discarding unsolicited frame");
                return;
            }
        };
        self.pixel_link_static.with_state(|state| {
            state.store.write(slot, PanelFrame::from_wire(&frame));
        });
        debug!("slot {} loaded", slot.get());
        self.pixel_link_static.emit(PanelEvent::SlotLoaded(slot));
        if self.sync_awaits(slot) {
            self.sync_advance();
        }
    }

    fn on_sync_timeout(&mut self) -> Flow {
        self.sync_deadline = None;
        if let Some(sync) = self.sync {
            let slot = sync.awaiting();
            warn!("slot {} did not answer", slot.get());
            let late_until = deadline_after(self.config.sync_response_timeout);
            self.pending_loads.mark_stale(slot, late_until);
            self.pixel_link_static
                .emit(PanelEvent::SlotLoadTimedOut(slot));
            self.sync_advance();
        }
        Flow::Continue
    }

    fn enqueue(&mut self, command: Command) {
        if let Err(error) = self.queue.enqueue(command) {
            warn!("rejecting {:?}: {}", command, error);
            self.pixel_link_static
                .emit(PanelEvent::CommandRejected { command, error });
        }
    }

    fn expect_load(&mut self, slot: SlotId) {
        if let Some(evicted) = self.pending_loads.expect(slot, Instant::now()) {
            warn!("load of slot {} evicted unanswered", evicted.get());
        }
        if self.sync_awaits(slot) {
            self.sync_deadline = Some(deadline_after(self.config.sync_response_timeout));
        }
    }

    fn sync_awaits(&self, slot: SlotId) -> bool {
        self.sync.is_some_and(|sync| sync.awaiting() == slot)
    }

    fn sync_start(&mut self) {
        if self.sync.is_some() {
            warn!("slot sync already running");
            self.pixel_link_static.emit(PanelEvent::SyncRejected);
            return;
        }
        info!("slot sync started");
        let (sync, requests) = SlotSync::start();
        self.sync = Some(sync);
        self.sync_request(sync.awaiting(), requests);
    }

    fn sync_advance(&mut self) {
        self.sync_deadline = None;
        let Some(mut sync) = self.sync else {
            return;
        };
        match sync.advance() {
            SyncStep::Next(requests) => {
                self.sync = Some(sync);
                self.sync_request(sync.awaiting(), requests);
            }
            SyncStep::Done(select_first) => {
                self.sync = None;
                self.enqueue(select_first);
                self.pixel_link_static
                    .with_state(|state| state.status.active_slot = SlotId::FIRST);
                info!("slot sync completed");
                self.pixel_link_static.emit(PanelEvent::SyncCompleted);
            }
        }
    }

    fn sync_request(&mut self, slot: SlotId, requests: SlotRequest) {
        debug!("syncing slot {}", slot.get());
        self.pixel_link_static
            .with_state(|state| state.status.active_slot = slot);
        for command in requests {
            self.enqueue(command);
        }
    }

    fn publish_status(&self) {
        let busy = self.queue.is_busy();
        let pending = self.queue.pending_len();
        let fullness_percent = self
            .queue
            .fullness_percent(self.config.nominal_queue_capacity);
        let syncing = self.sync.is_some();
        self.pixel_link_static.with_state(|state| {
            state.status.busy = busy;
            state.status.pending = pending;
            state.status.fullness_percent = fullness_percent;
            state.status.syncing = syncing;
        });
    }

    fn reset(&mut self) {
        let dropped = self.queue.reset();
        self.pending_loads.clear();
        self.sync = None;
        self.sync_deadline = None;
        self.pixel_link_static.reset_state();
        info!("panel disconnected, {} commands dropped", dropped);
        self.pixel_link_static
            .emit(PanelEvent::Disconnected { dropped });
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    Instant::now().checked_add(timeout).unwrap_or(Instant::MAX)
}

async fn sync_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => Timer::at(deadline).await,
        None => pending().await,
    }
}
