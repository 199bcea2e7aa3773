use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};
use log::debug;

use crate::{
    intermediate::{
        chunk_kind, filter::FilterKind, write_chunk, Chunk, ChunkedWriter, ImageHeader,
        PhysicalDimensions, MAX_CHUNK_LENGTH, PNG_SIG,
    },
    Color, Error, Result,
};

/// Largest IDAT payload written.
pub const MAX_IDAT_LEN: usize = 0xFFFF;

const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    /// Horizontal resolution, stored in pHYs
    pub dpi_x: f64,
    /// Vertical resolution, stored in pHYs
    pub dpi_y: f64,
    pub compression: Compression,
    /// IDAT payload size, clamped to `1..=MAX_IDAT_LEN`
    pub idat_size: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            dpi_x: 96.0,
            dpi_y: 96.0,
            compression: Compression::default(),
            idat_size: MAX_IDAT_LEN,
        }
    }
}

/// Writes a premultiplied BGRA bitmap as an 8 bit RGBA PNG.
///
/// E                     D
/// | unmultiply           ^
/// | filter (type 0)      |
/// | compress             |
/// v chunk                |
pub struct PngEncoder<W> {
    writer: W,
    options: EncodeOptions,
}

impl<W: Write> PngEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, EncodeOptions::default())
    }

    pub fn with_options(writer: W, options: EncodeOptions) -> Self {
        Self { writer, options }
    }

    pub fn with_dpi(mut self, dpi_x: f64, dpi_y: f64) -> Self {
        self.options.dpi_x = dpi_x;
        self.options.dpi_y = dpi_y;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.options.compression = compression;
        self
    }

    pub fn with_idat_size(mut self, idat_size: usize) -> Self {
        self.options.idat_size = idat_size;
        self
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Encodes `width * height` pixels, row by row from the top, and hands
    /// the writer back.
    ///
    /// `pixels` holds packed `0xAARRGGBB` values with color premultiplied by
    /// alpha. Pixels past `width * height` are ignored.
    ///
    /// Nothing is written if the dimensions or the pixel count are wrong.
    /// Any later failure leaves a truncated PNG in the writer.
    pub fn encode(mut self, pixels: &[u32], width: u32, height: u32) -> Result<W> {
        if width == 0 || height == 0 || width > MAX_CHUNK_LENGTH || height > MAX_CHUNK_LENGTH {
            return Err(Error::Dimensions { width, height });
        }
        let row_len = width as usize;
        let expected = row_len.checked_mul(height as usize).unwrap_or(usize::MAX);
        if pixels.len() < expected {
            return Err(Error::PixelCount {
                expected,
                actual: pixels.len(),
            });
        }

        let phys = PhysicalDimensions::from_dpi(self.options.dpi_x, self.options.dpi_y);
        let idat_size = self.options.idat_size.clamp(1, MAX_IDAT_LEN);
        debug!(
            "encoding {width}x{height}, {}x{} pixels per metre, compression {}",
            phys.x_pixels_per_unit,
            phys.y_pixels_per_unit,
            self.options.compression.level()
        );

        self.writer.write_all(&PNG_SIG)?;
        ImageHeader::rgba8(width, height)
            .to_chunk()
            .write(&mut self.writer)?;
        phys.to_chunk().write(&mut self.writer)?;

        let writer = &mut self.writer;
        let mut idat_bytes = 0;
        let chunked = ChunkedWriter::new(idat_size, |block: &[u8]| {
            idat_bytes += block.len();
            write_chunk(&mut *writer, chunk_kind::IDAT, block)
        });
        let mut zlib = ZlibEncoder::new(chunked, self.options.compression);

        let mut line = Vec::with_capacity(1 + row_len * BYTES_PER_PIXEL);
        for row in pixels[..expected].chunks_exact(row_len) {
            line.clear();
            line.push(FilterKind::None as u8);
            for &pixel in row {
                line.extend_from_slice(&Color::from_premultiplied_bgra(pixel).to_rgba());
            }
            zlib.write_all(&line)?;
        }

        // zlib trailer first, then the last partial IDAT
        let idat_chunks = zlib.finish()?.finish()?;
        debug!("wrote {idat_chunks} IDAT chunks, {idat_bytes} bytes compressed");

        Chunk::new(chunk_kind::IEND, Box::default()).write(&mut self.writer)?;
        Ok(self.writer)
    }
}

/// Encodes to `output` with the given resolution and default compression.
pub fn encode<W: Write>(
    pixels: &[u32],
    width: u32,
    height: u32,
    dpi_x: f64,
    dpi_y: f64,
    output: W,
) -> Result<()> {
    PngEncoder::new(output)
        .with_dpi(dpi_x, dpi_y)
        .encode(pixels, width, height)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{self, ErrorKind, Read};

    use flate2::read::ZlibDecoder;

    use super::*;
    use crate::intermediate::{crc, read_chunks, IDAT, IEND, IHDR, PHYS};

    fn idat_data(png: &[u8]) -> Vec<u8> {
        read_chunks(png)
            .unwrap()
            .iter()
            .filter(|c| c.kind() == IDAT)
            .flat_map(|c| c.data().iter().copied())
            .collect()
    }

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        ZlibDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    /// Deterministic noise that deflate can't shrink much
    fn noise(len: usize) -> Vec<u32> {
        let mut state = 0x2545_f491u32;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state | 0xff00_0000
            })
            .collect()
    }

    #[test]
    fn test_two_pixels() {
        let mut png = Vec::new();
        encode(&[0xFFFF0000, 0x80008000], 2, 1, 96.0, 96.0, &mut png).unwrap();

        assert_eq!(png[..8], PNG_SIG);
        let chunks = read_chunks(&png[..]).unwrap();
        let kinds: Vec<_> = chunks.iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, [IHDR, PHYS, IDAT, IEND]);

        assert_eq!(chunks[0].data(), [0, 0, 0, 2, 0, 0, 0, 1, 8, 6, 0, 0, 0]);
        assert_eq!(
            chunks[1].data(),
            [0, 0, 0x0e, 0xc4, 0, 0, 0x0e, 0xc4, 1]
        );
        assert_eq!(
            inflate(chunks[2].data()),
            [0, 255, 0, 0, 255, 0, 255, 0, 128]
        );
        assert!(chunks[3].is_empty());
        assert_eq!(chunks[3].crc(), crc::checksum(b"IEND"));
        assert_eq!(png[png.len() - 12..], [0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xae, 0x42, 0x60, 0x82]);
    }

    #[test]
    fn test_scanlines_are_tagged() {
        let pixels = noise(3 * 4);
        let png = PngEncoder::new(Vec::new()).encode(&pixels, 3, 4).unwrap();
        let raw = inflate(&idat_data(&png));

        assert_eq!(raw.len(), 4 * (1 + 3 * 4));
        for (row, line) in raw.chunks_exact(13).enumerate() {
            assert_eq!(line[0], 0);
            for (col, px) in line[1..].chunks_exact(4).enumerate() {
                let color = Color::from_premultiplied_bgra(pixels[row * 3 + col]);
                assert_eq!(px, color.to_rgba());
            }
        }
    }

    #[test]
    fn test_idat_split() {
        let pixels = noise(200 * 200);
        let png = PngEncoder::new(Vec::new())
            .with_compression(Compression::none())
            .encode(&pixels, 200, 200)
            .unwrap();

        let chunks = read_chunks(&png[..]).unwrap();
        let idats: Vec<_> = chunks.iter().filter(|c| c.kind() == IDAT).collect();
        assert!(idats.len() > 2);
        let (last, full) = idats.split_last().unwrap();
        assert!(full.iter().all(|c| c.len() == MAX_IDAT_LEN));
        assert!(!last.is_empty() && last.len() <= MAX_IDAT_LEN);
        assert_eq!(inflate(&idat_data(&png)).len(), 200 * (1 + 200 * 4));
    }

    #[test]
    fn test_exact_idat_multiple() {
        let pixels = noise(16 * 16);
        let encoder = || PngEncoder::new(Vec::new()).with_compression(Compression::fast());
        let total = idat_data(&encoder().encode(&pixels, 16, 16).unwrap()).len();

        let count_idats = |size: usize| {
            let png = encoder().with_idat_size(size).encode(&pixels, 16, 16).unwrap();
            read_chunks(&png[..])
                .unwrap()
                .iter()
                .filter(|c| c.kind() == IDAT)
                .map(|c| c.len())
                .collect::<Vec<_>>()
        };

        assert_eq!(count_idats(total), [total]);
        assert_eq!(count_idats(total - 1), [total - 1, 1]);
        if total % 2 == 0 {
            assert_eq!(count_idats(total / 2), [total / 2, total / 2]);
        }
    }

    #[test]
    fn test_deterministic() {
        let pixels = noise(37 * 11);
        let a = PngEncoder::new(Vec::new()).encode(&pixels, 37, 11).unwrap();
        let b = PngEncoder::new(Vec::new()).encode(&pixels, 37, 11).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut out = Vec::new();
        let result = PngEncoder::new(&mut out).encode(&[], 0, 5);
        assert!(matches!(result, Err(Error::Dimensions { width: 0, height: 5 })));

        let result = PngEncoder::new(&mut out).encode(&[0; 5], 2, 3);
        assert!(matches!(
            result,
            Err(Error::PixelCount {
                expected: 6,
                actual: 5
            })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_extra_pixels_ignored() {
        let a = PngEncoder::new(Vec::new()).encode(&[0xFF000000; 4], 2, 2).unwrap();
        let b = PngEncoder::new(Vec::new()).encode(&[0xFF000000; 9], 2, 2).unwrap();
        assert_eq!(a, b);
    }

    struct FailAfter(usize);

    impl Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.0 < buf.len() {
                return Err(io::Error::new(ErrorKind::StorageFull, "full"));
            }
            self.0 -= buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_io_error_passes_through() {
        for budget in [0, 8, 40, 60] {
            let result = PngEncoder::new(FailAfter(budget)).encode(&noise(64 * 64), 64, 64);
            match result {
                Err(Error::Io(e)) => assert_eq!(e.kind(), ErrorKind::StorageFull),
                Err(e) => panic!("budget {budget}: expected io error, got {e}"),
                Ok(_) => panic!("budget {budget}: expected io error"),
            }
        }
    }
}
