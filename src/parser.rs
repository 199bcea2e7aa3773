use std::io::{self, ErrorKind, Read};

use flate2::read::ZlibDecoder;
use log::warn;

use crate::{
    intermediate::{
        chunk_kind, filter::FilterKind, read_chunks, ImageHeader, PhysicalDimensions,
    },
    Color, Error, Png, Result,
};

/// Reads back the kind of PNG [`PngEncoder`](crate::PngEncoder) writes:
/// 8 bit RGBA, not interlaced, every scanline with filter type 0.
/// https://www.w3.org/TR/png-3
///
/// E           D
/// | filter    ^
/// | compress  |
/// v chunk     |
#[derive(Debug)]
pub struct PngParser {
    header: ImageHeader,
    phys: Option<PhysicalDimensions>,
    /// Concatenated IDAT payloads
    data: Vec<u8>,
}

impl PngParser {
    pub fn new(reader: impl Read) -> Result<Self> {
        let chunks = read_chunks(reader)?;
        let (first, rest) = chunks
            .split_first()
            .ok_or(Error::InvalidData("PNG has no chunks"))?;
        if first.kind() != chunk_kind::IHDR {
            return Err(Error::UnexpectedChunk(first.kind()));
        }
        let header = ImageHeader::from_bytes(first.data())?;
        header.ensure_rgba8()?;

        let mut phys = None;
        let mut data = Vec::new();
        for chunk in rest {
            match chunk.kind() {
                chunk_kind::IDAT => data.extend_from_slice(chunk.data()),
                chunk_kind::PHYS => phys = Some(PhysicalDimensions::from_bytes(chunk.data())?),
                chunk_kind::IEND => (),
                kind if kind.critical() => return Err(Error::UnexpectedChunk(kind)),
                kind => warn!("Throwing away {kind:?}"),
            }
        }
        if data.is_empty() {
            return Err(Error::InvalidData("PNG has no image data"));
        }

        Ok(Self { header, phys, data })
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    fn scanline_length(&self) -> Result<usize> {
        (self.header.width as usize)
            .checked_mul(4)
            .and_then(|len| len.checked_add(1))
            .ok_or(Error::InvalidData("scanline length overflows"))
    }

    /// Buffers grow with the inflated data, never with the dimensions the
    /// header claims.
    pub fn parse(self) -> Result<Png> {
        let line_len = self.scanline_length()?;
        (self.header.width as usize)
            .checked_mul(self.header.height as usize)
            .ok_or(Error::InvalidData("pixel count overflows"))?;

        let mut reader = ZlibDecoder::new(&self.data[..]);
        let mut pixels = Vec::new();
        let mut line = Vec::new();

        for _ in 0..self.header.height {
            line.clear();
            (&mut reader).take(line_len as u64).read_to_end(&mut line)?;
            if line.len() != line_len {
                let eof = io::Error::new(ErrorKind::UnexpectedEof, "image data ends early");
                return Err(eof.into());
            }
            let (filter_kind, data) = line
                .split_first()
                .ok_or(Error::InvalidData("empty scanline"))?;
            let filter_kind = FilterKind::try_from(*filter_kind).map_err(Error::InvalidData)?;
            if filter_kind != FilterKind::None {
                return Err(Error::Unsupported("scanline filters other than None"));
            }

            pixels.extend(
                data.chunks_exact(4)
                    .map(|px| Color::new(px[0], px[1], px[2], px[3])),
            );
        }

        Ok(Png::new(
            self.header.height,
            self.header.width,
            pixels,
            self.phys.and_then(|p| p.dpi()),
        ))
    }
}
