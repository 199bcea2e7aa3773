pub const IHDR: ChunkKind = ChunkKind(*b"IHDR");
pub const PHYS: ChunkKind = ChunkKind(*b"pHYs");
pub const IDAT: ChunkKind = ChunkKind(*b"IDAT");
pub const IEND: ChunkKind = ChunkKind(*b"IEND");

const SIG_BIT: u8 = 0b100000;

/// Specifies the type of chunk.
///
/// This crate writes IHDR, pHYs, IDAT and IEND. Any other well-formed kind
/// can still be read back and inspected.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkKind([u8; 4]);

impl ChunkKind {
    /// Returns a reference to the raw chunk type
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Indicates that this chunk is critical for the successful display of
    /// the png. If the decoder finds an unknown chunk that is critical, it
    /// should not display the image
    pub fn critical(&self) -> bool {
        self.0[0] & SIG_BIT == 0
    }
}

impl std::fmt::Debug for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only ascii letters get past TryFrom
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl TryFrom<&[u8; 4]> for ChunkKind {
    type Error = &'static str;

    fn try_from(value: &[u8; 4]) -> Result<Self, Self::Error> {
        if value.iter().all(u8::is_ascii_alphabetic) {
            Ok(Self(*value))
        } else {
            Err("Invalid chunk type")
        }
    }
}
