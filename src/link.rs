//! Transport seam between the device loop and a wireless link.
//!
//! A [`Link`] is whatever can reach the panel: a BLE GATT client on a host, a radio
//! driver on a microcontroller, or an in-memory fake in tests. The device loop is its only
//! caller and never issues a second [`Link::write`] before the previous one returns.
//!
//! Inbound traffic goes the other way through a [`NotificationSink`], handed to the link
//! on [`Link::connect`]. Its methods are synchronous and non-blocking, so they can be
//! called from a radio callback or interrupt.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

use crate::{Error, Result};

/// Advertised name prefix of the panel.
pub const DEVICE_NAME_PREFIX: &str = "PixelDisplay";
/// GATT service carrying the command characteristic.
pub const SERVICE_UUID: &str = "4fafc201-1fb5-459e-8fcc-c5c9c331914b";
/// Characteristic commands are written to and notifications arrive on.
pub const CHARACTERISTIC_UUID: &str = "beb5483e-36e1-4688-b7f5-ea07361b26a8";

/// Longest inbound notification accepted by the sink.
pub const MAX_NOTIFICATION_LEN: usize = 256;
/// Inbound events buffered between the link and the device loop.
pub const LINK_EVENT_CAPACITY: usize = 4;

/// Something the link reports without being asked.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Raw notification bytes.
    Notification(Vec<u8, MAX_NOTIFICATION_LEN>),
    /// The device went away.
    Lost,
}

pub(crate) type LinkEventChannel = Channel<CriticalSectionRawMutex, LinkEvent, LINK_EVENT_CAPACITY>;

/// Connection to the panel.
pub trait Link {
    /// Find the panel, negotiate the service, and subscribe `sink` to notifications.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the panel cannot be reached.
    async fn connect(&mut self, sink: NotificationSink) -> Result<()>;

    /// Write one encoded command and wait for the link to accept it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the write is rejected.
    async fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Tear the session down. Only called while connected.
    async fn disconnect(&mut self);
}

/// Subscription handle passed to [`Link::connect`].
#[derive(Clone, Copy)]
pub struct NotificationSink {
    channel: &'static LinkEventChannel,
}

impl NotificationSink {
    pub(crate) const fn new(channel: &'static LinkEventChannel) -> Self {
        Self { channel }
    }

    /// Hand a received notification to the device loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotificationOverflow`] if `bytes` is longer than
    /// [`MAX_NOTIFICATION_LEN`] or the loop has fallen behind. The frame is dropped.
    pub fn deliver(&self, bytes: &[u8]) -> Result<()> {
        let frame = Vec::from_slice(bytes).map_err(|()| Error::NotificationOverflow)?;
        self.channel
            .try_send(LinkEvent::Notification(frame))
            .map_err(|_| Error::NotificationOverflow)
    }

    /// Report that the device disconnected. Never dropped: pending notifications are
    /// discarded to make room.
    pub fn link_lost(&self) {
        if self.channel.try_send(LinkEvent::Lost).is_err() {
            self.channel.clear();
            let _ = self.channel.try_send(LinkEvent::Lost);
        }
    }
}

impl core::fmt::Debug for NotificationSink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NotificationSink")
            .field("queued", &self.channel.len())
            .finish()
    }
}
