use super::{chunk_kind, filter::FilterMethod, Chunk, ChunkKind};
use crate::{Error, Result};

/// Pixels per metre for one pixel per inch.
pub const INCHES_PER_METRE: f64 = 39.3700787;

const BIT_DEPTH: u8 = 8;
/// Truecolour with alpha
const COLOR_TYPE_RGBA: u8 = 6;
const UNIT_METRE: u8 = 1;

/// Byte buffer for fixed-layout chunk payloads. Multi-byte fields are
/// always big-endian.
#[derive(Debug, Default)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.0.push(value);
        self
    }

    pub fn write_u32_be(&mut self, value: u32) -> &mut Self {
        self.0.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Chunk kinds are always four ascii letters
    pub fn write_ascii4(&mut self, kind: ChunkKind) -> &mut Self {
        self.0.extend_from_slice(kind.as_bytes());
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_boxed_slice(self) -> Box<[u8]> {
        self.0.into_boxed_slice()
    }
}

fn read_u32_be(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Contents of IHDR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

impl ImageHeader {
    pub const LEN: usize = 13;

    /// 8 bits per channel RGBA, deflate, no interlacing.
    pub const fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bit_depth: BIT_DEPTH,
            color_type: COLOR_TYPE_RGBA,
            compression_method: 0,
            filter_method: FilterMethod::Zero as u8,
            interlace_method: 0,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != Self::LEN {
            return Err(Error::InvalidData("IHDR must be 13 bytes"));
        }
        Ok(Self {
            width: read_u32_be(data, 0),
            height: read_u32_be(data, 4),
            bit_depth: data[8],
            color_type: data[9],
            compression_method: data[10],
            filter_method: data[11],
            interlace_method: data[12],
        })
    }

    /// Checks that the header describes what [`rgba8`](Self::rgba8) produces.
    pub fn ensure_rgba8(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidData("zero image dimension"));
        }
        if self.bit_depth != BIT_DEPTH || self.color_type != COLOR_TYPE_RGBA {
            return Err(Error::Unsupported("only 8 bit RGBA images"));
        }
        if self.compression_method != 0 {
            return Err(Error::InvalidData("unknown compression method"));
        }
        FilterMethod::try_from(self.filter_method).map_err(Error::InvalidData)?;
        if self.interlace_method != 0 {
            return Err(Error::Unsupported("interlaced images"));
        }
        Ok(())
    }

    pub fn to_chunk(&self) -> Chunk {
        let mut payload = Payload::with_capacity(Self::LEN);
        payload
            .write_u32_be(self.width)
            .write_u32_be(self.height)
            .write_u8(self.bit_depth)
            .write_u8(self.color_type)
            .write_u8(self.compression_method)
            .write_u8(self.filter_method)
            .write_u8(self.interlace_method);
        Chunk::new(chunk_kind::IHDR, payload.into_boxed_slice())
    }
}

/// Contents of pHYs, in pixels per metre
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalDimensions {
    pub x_pixels_per_unit: u32,
    pub y_pixels_per_unit: u32,
    /// 1 for metres, 0 for an aspect ratio only
    pub unit: u8,
}

impl PhysicalDimensions {
    pub const LEN: usize = 9;

    /// Rounds to the nearest whole pixel per metre. Negative and NaN
    /// resolutions become 0.
    pub fn from_dpi(dpi_x: f64, dpi_y: f64) -> Self {
        Self {
            x_pixels_per_unit: (dpi_x * INCHES_PER_METRE).round() as u32,
            y_pixels_per_unit: (dpi_y * INCHES_PER_METRE).round() as u32,
            unit: UNIT_METRE,
        }
    }

    /// Resolution in dots per inch, if the unit is metres.
    pub fn dpi(&self) -> Option<(f64, f64)> {
        (self.unit == UNIT_METRE).then(|| {
            (
                self.x_pixels_per_unit as f64 / INCHES_PER_METRE,
                self.y_pixels_per_unit as f64 / INCHES_PER_METRE,
            )
        })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != Self::LEN {
            return Err(Error::InvalidData("pHYs must be 9 bytes"));
        }
        Ok(Self {
            x_pixels_per_unit: read_u32_be(data, 0),
            y_pixels_per_unit: read_u32_be(data, 4),
            unit: data[8],
        })
    }

    pub fn to_chunk(&self) -> Chunk {
        let mut payload = Payload::with_capacity(Self::LEN);
        payload
            .write_u32_be(self.x_pixels_per_unit)
            .write_u32_be(self.y_pixels_per_unit)
            .write_u8(self.unit);
        Chunk::new(chunk_kind::PHYS, payload.into_boxed_slice())
    }
}
