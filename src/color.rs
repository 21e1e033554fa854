//! Panel colors: the [`RGB8`] wire color, [`Rgb888`] interop, the fixed palette, and hex parsing.

use embedded_graphics::prelude::RgbColor;

use crate::{Error, Result};

/// Predefined RGB color constants from the `smart_leds` crate.
#[doc(inline)]
pub use smart_leds::colors;

/// 8-bit-per-channel RGB color from `embedded_graphics`.
#[doc(inline)]
pub use embedded_graphics::pixelcolor::Rgb888;

/// RGB color type stored in frames and sent in paint commands.
pub use smart_leds::RGB8;

/// Black, the color of a cleared cell.
pub const BLACK: RGB8 = RGB8::new(0, 0, 0);

/// The sixteen palette colors offered by the painting UI, in display order.
pub const PALETTE: [RGB8; 16] = [
    RGB8::new(0x00, 0x00, 0x00), // black
    RGB8::new(0xC0, 0xC0, 0xC0), // silver
    RGB8::new(0x80, 0x80, 0x80), // gray
    RGB8::new(0xFF, 0xFF, 0xFF), // white
    RGB8::new(0x80, 0x00, 0x00), // maroon
    RGB8::new(0xFF, 0x00, 0x00), // red
    RGB8::new(0x80, 0x00, 0x80), // purple
    RGB8::new(0xFF, 0x00, 0xFF), // fuchsia
    RGB8::new(0x00, 0x80, 0x00), // green
    RGB8::new(0x00, 0xFF, 0x00), // lime
    RGB8::new(0x00, 0x80, 0x80), // teal
    RGB8::new(0x00, 0xFF, 0xFF), // aqua
    RGB8::new(0x00, 0x00, 0x80), // navy
    RGB8::new(0x00, 0x00, 0xFF), // blue
    RGB8::new(0xFF, 0x80, 0x00), // orange
    RGB8::new(0xFF, 0xFF, 0x00), // yellow
];

/// Convert colors to [`RGB8`] for the panel.
///
/// # Example
///
/// ```rust
/// use pixel_link::color::{Rgb888, ToRgb8, RGB8};
///
/// let rgb8 = RGB8::new(16, 32, 48).to_rgb8();
/// let rgb888 = Rgb888::new(16, 32, 48);
/// let converted = rgb888.to_rgb8();
///
/// assert_eq!(rgb8, converted);
/// ```
pub trait ToRgb8 {
    /// Convert this color to [`RGB8`].
    #[must_use]
    fn to_rgb8(self) -> RGB8;
}

impl ToRgb8 for RGB8 {
    #[inline]
    fn to_rgb8(self) -> RGB8 {
        self
    }
}

impl ToRgb8 for Rgb888 {
    #[inline]
    fn to_rgb8(self) -> RGB8 {
        RGB8::new(self.r(), self.g(), self.b())
    }
}

/// Convert colors to [`Rgb888`] for embedded-graphics rendering.
pub trait ToRgb888 {
    /// Convert this color to [`Rgb888`].
    #[must_use]
    fn to_rgb888(self) -> Rgb888;
}

impl ToRgb888 for RGB8 {
    #[inline]
    fn to_rgb888(self) -> Rgb888 {
        Rgb888::new(self.r, self.g, self.b)
    }
}

impl ToRgb888 for Rgb888 {
    #[inline]
    fn to_rgb888(self) -> Rgb888 {
        self
    }
}

/// Pack a color into the 24-bit `0xRRGGBB` form used on the wire.
#[must_use]
pub const fn to_hex_u32(color: RGB8) -> u32 {
    ((color.r as u32) << 16) | ((color.g as u32) << 8) | color.b as u32
}

/// Unpack a 24-bit `0xRRGGBB` value. Bits above 24 are ignored.
#[must_use]
pub const fn from_hex_u32(value: u32) -> RGB8 {
    RGB8::new(
        ((value >> 16) & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        (value & 0xFF) as u8,
    )
}

/// Parse a color picker value such as `#ff8000`, `0xff8000`, or `ff8000`.
///
/// # Errors
///
/// Returns [`Error::InvalidColor`] unless the digits are exactly six hex characters.
///
/// ```rust
/// use pixel_link::color::{parse_hex_color, RGB8};
///
/// assert_eq!(parse_hex_color("#FF8000"), Ok(RGB8::new(0xff, 0x80, 0x00)));
/// assert!(parse_hex_color("#fff").is_err());
/// ```
pub fn parse_hex_color(text: &str) -> Result<RGB8> {
    let digits = text
        .strip_prefix('#')
        .or_else(|| text.strip_prefix("0x"))
        .unwrap_or(text);
    if digits.len() != 6 || !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return Err(Error::InvalidColor);
    }
    let value = u32::from_str_radix(digits, 16).map_err(|_| Error::InvalidColor)?;
    Ok(from_hex_u32(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips_through_u32() {
        let orange = RGB8::new(0xFF, 0x80, 0x00);
        assert_eq!(to_hex_u32(orange), 0x00FF_8000);
        assert_eq!(from_hex_u32(0x00FF_8000), orange);
    }

    #[test]
    fn parse_accepts_picker_and_wire_prefixes() {
        let teal = RGB8::new(0x00, 0x80, 0x80);
        assert_eq!(parse_hex_color("#008080"), Ok(teal));
        assert_eq!(parse_hex_color("0x008080"), Ok(teal));
        assert_eq!(parse_hex_color("008080"), Ok(teal));
    }

    #[test]
    fn parse_rejects_short_and_non_hex() {
        assert_eq!(parse_hex_color("#08080"), Err(Error::InvalidColor));
        assert_eq!(parse_hex_color("#00808g"), Err(Error::InvalidColor));
        assert_eq!(parse_hex_color("+08080"), Err(Error::InvalidColor));
    }

    #[test]
    fn palette_starts_black_and_ends_yellow() {
        assert_eq!(PALETTE[0], BLACK);
        assert_eq!(PALETTE[15], RGB8::new(0xFF, 0xFF, 0x00));
    }
}
