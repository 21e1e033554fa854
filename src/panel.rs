//! The 8×8 panel: cell identity and the two frame shapes.
//!
//! A [`WireFrame`] holds colors in strip (wire) order and doubles as the logical grid:
//! `grid[cell.index()]` is the color of that cell. A [`PanelFrame`] holds the same colors
//! row-major, top-left first, ready for drawing. [`layout`] converts between the two.
//!
//! # Example: draw a snapshot preview with embedded-graphics
//!
//! ```rust
//! use embedded_graphics::{
//!     pixelcolor::Rgb888,
//!     prelude::*,
//!     primitives::{PrimitiveStyle, Rectangle},
//! };
//! use pixel_link::panel::{PanelFrame, WireFrame};
//!
//! let mut frame = PanelFrame::new();
//! Rectangle::new(PanelFrame::TOP_LEFT, PanelFrame::SIZE)
//!     .into_styled(PrimitiveStyle::with_stroke(Rgb888::RED, 1))
//!     .draw(&mut frame)
//!     .expect("drawing into a frame cannot fail");
//!
//! // The top-left pixel is the eighth LED on the strip.
//! let wire = WireFrame::from_panel(&frame);
//! assert_eq!(wire[7].r, 255);
//! ```

pub mod layout;

use core::convert::Infallible;
use core::ops::{Deref, DerefMut, Index, IndexMut};

use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Point, RgbColor, Size};

use crate::color::{BLACK, RGB8, Rgb888};
use crate::{Error, Result};

use layout::PANEL_LAYOUT;

/// Panel width in cells.
pub const PANEL_WIDTH: usize = 8;
/// Panel height in cells.
pub const PANEL_HEIGHT: usize = 8;
/// Number of cells (and LEDs).
pub const PANEL_LEN: usize = PANEL_WIDTH * PANEL_HEIGHT;
/// Bytes in one RGB frame: three per cell.
pub const FRAME_BYTES: usize = PANEL_LEN * 3;

/// Identity of one panel cell, in `0..64`.
///
/// The id equals the cell's wire index, so it can go on the wire untranslated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CellId(u8);

impl CellId {
    /// First cell on the strip (top-right corner).
    pub const FIRST: Self = Self(0);
    /// Last cell on the strip (bottom-right corner).
    pub const LAST: Self = Self(PANEL_LEN as u8 - 1);

    /// Validate a raw cell id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CellOutOfRange`] for ids of 64 or more.
    pub const fn new(id: u8) -> Result<Self> {
        if (id as usize) < PANEL_LEN {
            Ok(Self(id))
        } else {
            Err(Error::CellOutOfRange(id))
        }
    }

    /// The id as a raw byte.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The id as an index into a [`WireFrame`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// All 64 cells in wire order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..PANEL_LEN as u8).map(Self)
    }
}

impl TryFrom<usize> for CellId {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        u8::try_from(index)
            .map_err(|_| Error::CellOutOfRange(u8::MAX))
            .and_then(Self::new)
    }
}

/// Fixed-size 1D frame: colors in LED strip order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame1d<const N: usize>(pub [RGB8; N]);

impl<const N: usize> Frame1d<N> {
    /// Number of LEDs in this frame.
    pub const LEN: usize = N;

    /// Create a new blank (all black) frame.
    #[must_use]
    pub const fn new() -> Self {
        Self([BLACK; N])
    }

    /// Create a frame filled with a single color.
    #[must_use]
    pub const fn filled(color: RGB8) -> Self {
        Self([color; N])
    }
}

impl<const N: usize> Deref for Frame1d<N> {
    type Target = [RGB8; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> DerefMut for Frame1d<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const N: usize> From<[RGB8; N]> for Frame1d<N> {
    fn from(array: [RGB8; N]) -> Self {
        Self(array)
    }
}

impl<const N: usize> Default for Frame1d<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Row-major 2D frame where `frame[(x, y)]` is the pixel at column `x`, row `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame2d<const W: usize, const H: usize>(pub [[RGB8; W]; H]);

impl<const W: usize, const H: usize> Frame2d<W, H> {
    /// Frame width in pixels (columns).
    pub const WIDTH: usize = W;
    /// Frame height in pixels (rows).
    pub const HEIGHT: usize = H;
    /// Total number of pixels (WIDTH × HEIGHT).
    pub const LEN: usize = W * H;
    /// Frame dimensions as a [`Size`], for embedded-graphics.
    pub const SIZE: Size = Size::new(W as u32, H as u32);
    /// Top-left corner as a [`Point`], for embedded-graphics.
    pub const TOP_LEFT: Point = Point::new(0, 0);
    /// Bottom-right corner as a [`Point`], for embedded-graphics.
    pub const BOTTOM_RIGHT: Point = Point::new((W - 1) as i32, (H - 1) as i32);

    /// Create a new blank (all black) frame.
    #[must_use]
    pub const fn new() -> Self {
        Self([[BLACK; W]; H])
    }

    /// Create a frame filled with a single color.
    #[must_use]
    pub const fn filled(color: RGB8) -> Self {
        Self([[color; W]; H])
    }
}

impl<const W: usize, const H: usize> Deref for Frame2d<W, H> {
    type Target = [[RGB8; W]; H];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const W: usize, const H: usize> DerefMut for Frame2d<W, H> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const W: usize, const H: usize> Index<(usize, usize)> for Frame2d<W, H> {
    type Output = RGB8;

    fn index(&self, (x_index, y_index): (usize, usize)) -> &Self::Output {
        let Some(pixel) = self.0.get(y_index).and_then(|row| row.get(x_index)) else {
            panic!("({x_index}, {y_index}) is outside the {W}x{H} frame");
        };
        pixel
    }
}

impl<const W: usize, const H: usize> IndexMut<(usize, usize)> for Frame2d<W, H> {
    fn index_mut(&mut self, (x_index, y_index): (usize, usize)) -> &mut Self::Output {
        let Some(pixel) = self.0.get_mut(y_index).and_then(|row| row.get_mut(x_index)) else {
            panic!("({x_index}, {y_index}) is outside the {W}x{H} frame");
        };
        pixel
    }
}

impl<const W: usize, const H: usize> Default for Frame2d<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const H: usize> OriginDimensions for Frame2d<W, H> {
    fn size(&self) -> Size {
        Self::SIZE
    }
}

impl<const W: usize, const H: usize> DrawTarget for Frame2d<W, H> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (Ok(x_index), Ok(y_index)) = (usize::try_from(coord.x), usize::try_from(coord.y))
            else {
                continue;
            };
            if let Some(pixel) = self.0.get_mut(y_index).and_then(|row| row.get_mut(x_index)) {
                *pixel = RGB8::new(color.r(), color.g(), color.b());
            }
        }
        Ok(())
    }
}

/// The logical grid / device buffer: one color per cell, in wire order.
pub type WireFrame = Frame1d<PANEL_LEN>;

/// A row-major view of the panel, as it is seen and stored in snapshot slots.
pub type PanelFrame = Frame2d<PANEL_WIDTH, PANEL_HEIGHT>;

impl WireFrame {
    /// Color of one cell.
    #[must_use]
    pub fn cell(&self, cell: CellId) -> RGB8 {
        self.0.get(cell.index()).copied().unwrap_or(BLACK)
    }

    /// Set the color of one cell.
    pub fn set_cell(&mut self, cell: CellId, color: RGB8) {
        if let Some(led) = self.0.get_mut(cell.index()) {
            *led = color;
        }
    }

    /// Reorder a row-major frame into wire order.
    #[must_use]
    pub fn from_panel(panel: &PanelFrame) -> Self {
        let mut wire = Self::new();
        for (led, &(x, y)) in wire.0.iter_mut().zip(PANEL_LAYOUT.index_to_xy()) {
            *led = panel[(usize::from(x), usize::from(y))];
        }
        wire
    }

    /// Decode 192 RGB bytes laid out in wire order (`3k..3k+3` is LED `k`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameLength`] unless `bytes` is exactly 192 long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        rgb_triples(bytes).map(Self)
    }

    /// Encode as 192 RGB bytes in wire order.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; FRAME_BYTES] {
        to_rgb_bytes(self.0.iter())
    }
}

impl PanelFrame {
    /// Reorder a wire-order frame into row-major order.
    #[must_use]
    pub fn from_wire(wire: &WireFrame) -> Self {
        let mut panel = Self::new();
        for (&color, &(x, y)) in wire.0.iter().zip(PANEL_LAYOUT.index_to_xy()) {
            panel[(usize::from(x), usize::from(y))] = color;
        }
        panel
    }

    /// Decode 192 RGB bytes laid out row-major.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameLength`] unless `bytes` is exactly 192 long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let flat = rgb_triples(bytes)?;
        let mut panel = Self::new();
        for (pixel, color) in panel.0.iter_mut().flatten().zip(flat) {
            *pixel = color;
        }
        Ok(panel)
    }

    /// Encode as 192 RGB bytes, row-major.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; FRAME_BYTES] {
        to_rgb_bytes(self.0.iter().flatten())
    }
}

fn rgb_triples(bytes: &[u8]) -> Result<[RGB8; PANEL_LEN]> {
    if bytes.len() != FRAME_BYTES {
        return Err(Error::FrameLength { len: bytes.len() });
    }
    let mut colors = [BLACK; PANEL_LEN];
    for (color, triple) in colors.iter_mut().zip(bytes.chunks_exact(3)) {
        if let &[r, g, b] = triple {
            *color = RGB8::new(r, g, b);
        }
    }
    Ok(colors)
}

fn to_rgb_bytes<'a>(colors: impl Iterator<Item = &'a RGB8>) -> [u8; FRAME_BYTES] {
    let mut bytes = [0u8; FRAME_BYTES];
    for (triple, color) in bytes.chunks_exact_mut(3).zip(colors) {
        triple.copy_from_slice(&[color.r, color.g, color.b]);
    }
    bytes
}
