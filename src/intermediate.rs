//! Chunk-level building blocks of the PNG container.

pub mod chunk;
pub mod chunk_kind;
pub mod chunk_writer;
pub mod crc;
pub mod filter;
pub mod payload;

use std::io::Read;

pub use chunk::*;
pub use chunk_kind::*;
pub use chunk_writer::ChunkedWriter;
pub use payload::*;

use crate::{Error, Result};

pub const PNG_SIG: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Reads the signature and every chunk up to and including IEND, checking
/// each chunk's crc.
pub fn read_chunks(mut reader: impl Read) -> Result<Vec<Chunk>> {
    let mut sig = [0u8; 8];
    reader.read_exact(&mut sig)?;
    if sig != PNG_SIG {
        return Err(Error::MissingSignature);
    }

    let mut chunks = Vec::new();
    loop {
        let chunk = Chunk::read(&mut reader)?;
        let done = chunk.kind() == IEND;
        chunks.push(chunk);
        if done {
            return Ok(chunks);
        }
    }
}
