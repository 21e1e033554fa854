//! Compile-time description of panel wiring, and the 8×8 serpentine used by the panel.
//!
//! Three address spaces meet here:
//! - the **wire index** is a cell's position along the single LED strip,
//! - the **cell id** is the stable identity the UI hands out; it *is* the wire index,
//! - the **visual position** `(row, col)` is where the cell is drawn, top-left first.
//!
//! Because cell ids already follow wire order, outbound paint commands need no translation.
//! Anything row-major (rendering, snapshots) goes through [`to_visual`] / [`to_physical`].

use super::{CellId, PANEL_HEIGHT, PANEL_LEN, PANEL_WIDTH};
use crate::{Error, Result};

/// The panel's wiring: row 0 runs right-to-left, row 1 left-to-right, and so on.
///
/// ```text
/// 8×8 wire order (visual layout, top-left is (0, 0)):
///    7  6  5  4  3  2  1  0
///    8  9 10 11 12 13 14 15
///   23 22 21 20 19 18 17 16
///   ...
///   56 57 58 59 60 61 62 63
/// ```
pub const PANEL_LAYOUT: LedLayout<PANEL_LEN, PANEL_WIDTH, PANEL_HEIGHT> =
    LedLayout::serpentine_row_major().flip_h();

const LAST_COL: usize = PANEL_WIDTH - 1;

/// Wire index (cell id) of the cell drawn at `(row, col)`.
///
/// # Errors
///
/// Returns [`Error::PositionOutOfRange`] when `row` or `col` is not below 8.
///
/// ```rust
/// use pixel_link::panel::layout::{to_physical, to_visual};
///
/// let cell = to_physical(0, 0)?;
/// assert_eq!(cell.index(), 7);
/// assert_eq!(to_visual(cell), (0, 0));
/// # Ok::<(), pixel_link::Error>(())
/// ```
pub fn to_physical(row: u8, col: u8) -> Result<CellId> {
    let (row_index, col_index) = (usize::from(row), usize::from(col));
    if row_index >= PANEL_HEIGHT || col_index >= PANEL_WIDTH {
        return Err(Error::PositionOutOfRange { row, col });
    }
    let offset = if row_index % 2 == 0 {
        col_index.abs_diff(LAST_COL)
    } else {
        col_index
    };
    row_index
        .checked_mul(PANEL_WIDTH)
        .and_then(|row_start| row_start.checked_add(offset))
        .ok_or(Error::PositionOutOfRange { row, col })
        .and_then(CellId::try_from)
}

/// Visual `(row, col)` of a cell; the exact inverse of [`to_physical`].
#[must_use]
#[allow(clippy::cast_possible_truncation, reason = "row and col are below 8")]
pub const fn to_visual(cell: CellId) -> (u8, u8) {
    let index = cell.index();
    let row = index / PANEL_WIDTH;
    let within_row = index % PANEL_WIDTH;
    let col = if row % 2 == 0 {
        within_row.abs_diff(LAST_COL)
    } else {
        within_row
    };
    (row as u8, col as u8)
}

/// Compile-time description of panel geometry and wiring.
///
/// `LedLayout` maps each LED, in the order the strip is wired, to the `(x, y)` =
/// `(col, row)` position where it sits. `(0, 0)` is the top-left corner, `x` grows to the
/// right and `y` grows downward.
///
/// Layouts are validated when constructed (at compile time for `const` layouts): every
/// coordinate is in bounds and every cell appears exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedLayout<const N: usize, const W: usize, const H: usize> {
    map: [(u16, u16); N],
}

#[allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "const evaluation; a bad layout fails to compile"
)]
impl<const N: usize, const W: usize, const H: usize> LedLayout<N, W, H> {
    /// Return the array mapping LED wiring order to `(x, y)` coordinates.
    #[must_use]
    pub const fn index_to_xy(&self) -> &[(u16, u16); N] {
        &self.map
    }

    /// Number of columns in the layout.
    #[must_use]
    pub const fn width(&self) -> usize {
        W
    }

    /// Number of rows in the layout.
    #[must_use]
    pub const fn height(&self) -> usize {
        H
    }

    /// Total number of LEDs in the layout.
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// Always false; layouts cover `W * H > 0` cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Invert the layout: entry `y * W + x` holds the LED index wired at `(x, y)`.
    #[must_use]
    pub const fn xy_to_index(&self) -> [u16; N] {
        assert!(
            N <= u16::MAX as usize,
            "total LEDs must fit in u16 for xy_to_index"
        );

        let mut mapping = [0u16; N];
        let mut seen = [false; N];

        let mut led_index = 0;
        while led_index < N {
            let (col, row) = self.map[led_index];
            let target_index = row as usize * W + col as usize;
            assert!(
                !seen[target_index],
                "duplicate (col,row) in xy_to_index inversion"
            );
            seen[target_index] = true;
            mapping[target_index] = led_index as u16;
            led_index += 1;
        }

        mapping
    }

    /// Const equality helper.
    ///
    /// ```rust
    /// use pixel_link::panel::layout::LedLayout;
    ///
    /// const SNAKE: LedLayout<6, 3, 2> = LedLayout::serpentine_row_major();
    /// const MIRRORED: LedLayout<6, 3, 2> = SNAKE.flip_h();
    /// const _: () = assert!(SNAKE.equals(&SNAKE));
    /// const _: () = assert!(!SNAKE.equals(&MIRRORED));
    /// ```
    #[must_use]
    pub const fn equals(&self, other: &Self) -> bool {
        let mut i = 0;
        while i < N {
            if self.map[i].0 != other.map[i].0 || self.map[i].1 != other.map[i].1 {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Constructor: verifies the mapping covers every cell of the W×H panel exactly once.
    ///
    /// ```rust
    /// use pixel_link::panel::layout::LedLayout;
    ///
    /// // 3×2 panel, strip snakes right-to-left first.
    /// const MAP: LedLayout<6, 3, 2> =
    ///     LedLayout::new([(2, 0), (1, 0), (0, 0), (0, 1), (1, 1), (2, 1)]);
    /// const _: () = assert!(MAP.equals(&LedLayout::serpentine_row_major().flip_h()));
    /// ```
    #[must_use]
    pub const fn new(map: [(u16, u16); N]) -> Self {
        assert!(W > 0 && H > 0, "W and H must be positive");
        assert!(W * H == N, "W*H must equal N");

        let mut seen = [false; N];

        let mut i = 0;
        while i < N {
            let (c, r) = map[i];
            let c = c as usize;
            let r = r as usize;

            assert!(c < W, "column out of bounds");
            assert!(r < H, "row out of bounds");

            let cell = r * W + c;
            assert!(!seen[cell], "duplicate (col,row) in mapping");
            seen[cell] = true;

            i += 1;
        }

        Self { map }
    }

    /// Serpentine row-major mapping (alternating left-to-right and right-to-left across rows).
    ///
    /// ```text
    /// Strip snakes across rows (3×2 example):
    ///   LED0  LED1  LED2
    ///   LED5  LED4  LED3
    /// ```
    #[must_use]
    pub const fn serpentine_row_major() -> Self {
        assert!(W > 0 && H > 0, "W and H must be positive");
        assert!(W * H == N, "W*H must equal N");

        let mut mapping = [(0_u16, 0_u16); N];
        let mut y_index = 0;
        while y_index < H {
            let mut x_index = 0;
            while x_index < W {
                let led_index = if y_index % 2 == 0 {
                    y_index * W + x_index
                } else {
                    y_index * W + (W - 1 - x_index)
                };
                mapping[led_index] = (x_index as u16, y_index as u16);
                x_index += 1;
            }
            y_index += 1;
        }
        Self::new(mapping)
    }

    /// Flip horizontally (mirror columns).
    ///
    /// ```text
    /// Before (serpentine):   After:
    ///   LED0  LED1  LED2       LED2  LED1  LED0
    ///   LED5  LED4  LED3       LED3  LED4  LED5
    /// ```
    #[must_use]
    pub const fn flip_h(self) -> Self {
        let mut out = [(0u16, 0u16); N];
        let mut i = 0;
        while i < N {
            let (c, r) = self.map[i];
            let c = c as usize;
            out[i] = ((W - 1 - c) as u16, r);
            i += 1;
        }
        Self::new(out)
    }
}
