//! PNG encoding for premultiplied-alpha BGRA bitmaps.
//!
//! ```text
//! pixels (premultiplied BGRA u32)
//!   | unmultiply, reorder to RGBA   Color::from_premultiplied_bgra
//!   | filter type 0 per scanline
//!   | zlib                          flate2::write::ZlibEncoder
//!   | split into IDAT chunks        intermediate::ChunkedWriter
//!   v
//! signature, IHDR, pHYs, IDAT.., IEND
//! ```
//!
//! The output can be read back with [`parser::PngParser`].

use std::{
    fmt::{LowerHex, UpperHex},
    iter::FusedIterator,
};

pub mod encoder;
mod error;
pub mod intermediate;
pub mod parser;

pub use encoder::{encode, EncodeOptions, PngEncoder};
pub use error::{Error, Result};

/// 8 bit straight (not premultiplied) alpha RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(u8, u8, u8, u8);

impl Color {
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self(red, green, blue, alpha)
    }

    pub const fn new_opaque(red: u8, green: u8, blue: u8) -> Self {
        Self::new(red, green, blue, u8::MAX)
    }

    /// Converts a packed `0xAARRGGBB` pixel whose color channels are
    /// premultiplied by alpha.
    ///
    /// Each channel becomes `channel * ((255 << 8) / alpha) >> 8`, truncating.
    /// Zero alpha is treated as 1. Channels larger than alpha are not valid
    /// premultiplied input; their result wraps to the low 8 bits.
    pub const fn from_premultiplied_bgra(pixel: u32) -> Self {
        let alpha = (pixel >> 24) as u8;
        let divisor = if alpha == 0 { 1 } else { alpha as u32 };
        let factor = (255 << 8) / divisor;

        const fn unmultiply(channel: u32, factor: u32) -> u8 {
            // Keeps the low 8 bits
            (((channel & 0xff) * factor) >> 8) as u8
        }

        Self(
            unmultiply(pixel >> 16, factor),
            unmultiply(pixel >> 8, factor),
            unmultiply(pixel, factor),
            alpha,
        )
    }

    /// Red channel
    pub const fn red(self) -> u8 {
        self.0
    }
    /// Green channel
    pub const fn green(self) -> u8 {
        self.1
    }
    /// Blue channel
    pub const fn blue(self) -> u8 {
        self.2
    }
    /// Alpha channel
    pub const fn alpha(self) -> u8 {
        self.3
    }

    /// Bytes in PNG sample order
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.0, self.1, self.2, self.3]
    }
}

impl UpperHex for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Color(r, g, b, a) = self;
        write!(f, "{r:02X}{g:02X}{b:02X}{a:02X}")
    }
}

impl LowerHex for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Color(r, g, b, a) = self;
        write!(f, "{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

/// A decoded image. Contains no png-specific encoding information
#[derive(Debug, PartialEq)]
pub struct Png {
    height: u32,
    width: u32,
    pixels: Vec<Color>,
    dpi: Option<(f64, f64)>,
}

impl Png {
    pub fn new(height: u32, width: u32, pixels: Vec<Color>, dpi: Option<(f64, f64)>) -> Self {
        Self {
            height,
            width,
            pixels,
            dpi,
        }
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Horizontal and vertical resolution, when stored in metres
    pub fn dpi(&self) -> Option<(f64, f64)> {
        self.dpi
    }

    /// Pixels in row-major order
    pub fn pixels(
        &self,
    ) -> impl Iterator<Item = &Color> + FusedIterator + ExactSizeIterator + DoubleEndedIterator
    {
        self.pixels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_is_unchanged() {
        let c = Color::from_premultiplied_bgra(0xFF_12_34_56);
        assert_eq!(c, Color::new_opaque(0x12, 0x34, 0x56));
    }

    #[test]
    fn test_unmultiply() {
        // 50% green
        assert_eq!(
            Color::from_premultiplied_bgra(0x80_00_80_00),
            Color::new(0, 255, 0, 128)
        );
        // factor = 65280 / 64 = 1020, 32 * 1020 >> 8 = 127
        assert_eq!(
            Color::from_premultiplied_bgra(0x40_20_10_00),
            Color::new(127, 63, 0, 64)
        );
    }

    #[test]
    fn test_zero_alpha() {
        assert_eq!(Color::from_premultiplied_bgra(0), Color::new(0, 0, 0, 0));
        // Not valid premultiplied data, but must not panic:
        // 1 * 65280 >> 8 = 255, 2 * .. = 510, 3 * .. = 765
        assert_eq!(
            Color::from_premultiplied_bgra(0x00_01_02_03),
            Color::new(255, 254, 253, 0)
        );
    }

    #[test]
    fn test_channel_above_alpha_wraps() {
        // alpha 128: factor 510, 200 * 510 >> 8 = 398
        assert_eq!(
            Color::from_premultiplied_bgra(0x80_C8_00_00),
            Color::new((398 & 0xff) as u8, 0, 0, 128)
        );
    }

    #[test]
    fn test_channel_order() {
        let c = Color::from_premultiplied_bgra(0xFF_01_02_03);
        assert_eq!(c.to_rgba(), [1, 2, 3, 255]);
    }

    #[test]
    fn test_hex() {
        let c = Color::new(0x0a, 0xbc, 0x01, 0xff);
        assert_eq!(format!("{c:X}"), "0ABC01FF");
        assert_eq!(format!("{c:x}"), "0abc01ff");
    }
}
