use std::io::{self, ErrorKind, Read, Write};

use log::trace;

use super::{crc, ChunkKind, Payload};
use crate::{Error, Result};

pub const MAX_CHUNK_LENGTH: u32 = 2u32.pow(31) - 1;

#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    kind: ChunkKind,
    data: Box<[u8]>,
}

impl Chunk {
    pub const fn new(kind: ChunkKind, data: Box<[u8]>) -> Self {
        Chunk { kind, data }
    }

    /// Reads one chunk and checks its crc.
    pub fn read(reader: &mut impl Read) -> Result<Self> {
        let mut len: [u8; 4] = [0; 4];
        reader.read_exact(&mut len)?;
        let len = u32::from_be_bytes(len);
        if len > MAX_CHUNK_LENGTH {
            return Err(Error::InvalidData("Chunk length too long"));
        }

        let mut kind: [u8; 4] = [0; 4];
        reader.read_exact(&mut kind)?;
        let kind = ChunkKind::try_from(&kind).map_err(Error::InvalidData)?;

        let mut data = vec![0; len as usize];
        reader.read_exact(&mut data[..])?;

        let mut stored = [0u8; 4];
        reader.read_exact(&mut stored)?;
        let stored = u32::from_be_bytes(stored);

        let chunk = Self {
            kind,
            data: data.into(),
        };

        let computed = chunk.crc();
        if computed != stored {
            return Err(Error::CrcMismatch {
                kind,
                stored,
                computed,
            });
        }

        Ok(chunk)
    }

    /// Serializes the chunk: length, kind, data, crc.
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        write_chunk(writer, self.kind, &self.data)
    }

    /// Raw data of the chunk
    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Length of the chunk data in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Chunk type
    pub fn kind(&self) -> ChunkKind {
        self.kind
    }

    /// Cyclic Redundancy Code over kind and data
    pub fn crc(&self) -> u32 {
        crc::update(crc::update(0, self.kind.as_bytes()), self.data())
    }
}

/// Writes a chunk straight from borrowed data, without building a [`Chunk`].
pub fn write_chunk<W: Write + ?Sized>(
    writer: &mut W,
    kind: ChunkKind,
    data: &[u8],
) -> io::Result<()> {
    let len = u32::try_from(data.len())
        .ok()
        .filter(|&len| len <= MAX_CHUNK_LENGTH)
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "Chunk length too long"))?;
    let crc = crc::update(crc::update(0, kind.as_bytes()), data);

    let mut head = Payload::with_capacity(8);
    head.write_u32_be(len).write_ascii4(kind);
    writer.write_all(head.as_bytes())?;
    writer.write_all(data)?;
    writer.write_all(&crc.to_be_bytes())?;

    trace!("wrote {kind:?} chunk, {len} bytes, crc {crc:#010x}");
    Ok(())
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {{\n    kind: {:?}\n    len: {}\n}}",
            self.kind,
            self.data.len()
        )
    }
}
