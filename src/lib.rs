//! Drive an 8×8 serpentine RGB LED panel over a wireless command link.
//!
//! A painting UI edits a logical grid; this crate turns those edits into byte commands,
//! writes them to the panel strictly one at a time, and turns pixel frames read back from
//! the panel into row-major snapshots held in four save slots.
//!
//! # Glossary
//!
//! - **Wire index:** a cell's position along the LED strip. The strip snakes: row 0 runs
//!   right-to-left, row 1 left-to-right, and so on.
//! - **Cell id:** the stable identity of a grid cell. Equal to its wire index, so outbound
//!   commands need no translation.
//! - **Visual position:** `(row, col)` with `(0, 0)` at the top left.
//! - **Slot:** one of four snapshots the panel can persist and send back.
//!
//! # Modules
//!
//! - [`panel`]: cell ids, frames, and the [`panel::layout`] address mapper.
//! - [`command`]: encoding and decoding of commands and notification frames.
//! - [`dispatch`]: the single-in-flight FIFO queue.
//! - [`snapshot`]: the four-slot snapshot store.
//! - [`slot_sync`]: the request→response sweep that reloads every slot.
//! - [`link`]: the transport trait the device loop writes through.
//! - [`pixel_link`]: the UI handle and the device loop tying it all together.
#![cfg_attr(not(any(test, feature = "host")), no_std)]
#![allow(async_fn_in_trait, reason = "single-threaded embedded")]

#[macro_use]
mod fmt;

pub mod color;
pub mod command;
pub mod dispatch;
mod error;
pub mod link;
pub mod panel;
mod pending_loads;
pub mod pixel_link;
pub mod slot_sync;
pub mod snapshot;

pub use crate::error::{Error, Result};
