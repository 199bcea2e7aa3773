use std::io;

use crate::intermediate::ChunkKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failure of the output stream, the input stream or the zlib stream.
    /// Passed through untouched.
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("image dimensions {width}x{height} are outside 1..=2147483647")]
    Dimensions { width: u32, height: u32 },

    #[error("expected {expected} pixels, buffer holds {actual}")]
    PixelCount { expected: usize, actual: usize },

    #[error("PNG missing signature")]
    MissingSignature,

    #[error("mismatched crc in {kind:?} chunk: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        kind: ChunkKind,
        stored: u32,
        computed: u32,
    },

    #[error("unexpected {0:?} chunk")]
    UnexpectedChunk(ChunkKind),

    #[error("unsupported PNG feature: {0}")]
    Unsupported(&'static str),

    #[error("invalid PNG data: {0}")]
    InvalidData(&'static str),
}
