use std::{
    io::{self, ErrorKind, Read, Seek, SeekFrom, Write},
    mem,
};

use log::trace;

/// Write-only sink that regroups arbitrary writes into fixed-size blocks.
///
/// Every time `chunk_size` bytes have piled up they are handed to
/// `on_chunk`, in write order. Whatever is left when the writer is finished
/// (or dropped) goes out as one last, shorter block. An empty tail is never
/// emitted.
///
/// ```text
/// write(..) -> [ buffer ] -- chunk_size bytes --> on_chunk(block)
/// finish()  -> [ buffer ] -- 1..chunk_size bytes --> on_chunk(tail)
/// ```
pub struct ChunkedWriter<F>
where
    F: FnMut(&[u8]) -> io::Result<()>,
{
    chunk_size: usize,
    on_chunk: F,
    buffer: Vec<u8>,
    /// Blocks handed to `on_chunk` so far
    blocks: usize,
    finished: bool,
}

impl<F> ChunkedWriter<F>
where
    F: FnMut(&[u8]) -> io::Result<()>,
{
    /// # Panics
    /// If `chunk_size` is 0.
    pub fn new(chunk_size: usize, on_chunk: F) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            chunk_size,
            on_chunk,
            buffer: Vec::with_capacity(chunk_size),
            blocks: 0,
            finished: false,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Bytes written but not yet handed out
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Emits the remaining bytes, if any, and returns the total number of
    /// blocks emitted over the writer's lifetime.
    pub fn finish(mut self) -> io::Result<usize> {
        self.emit_tail()?;
        Ok(self.blocks)
    }

    fn emit_tail(&mut self) -> io::Result<()> {
        if mem::replace(&mut self.finished, true) {
            return Ok(());
        }
        let tail = mem::take(&mut self.buffer);
        if !tail.is_empty() {
            trace!("emitting final {} byte block", tail.len());
            self.blocks += 1;
            (self.on_chunk)(&tail)?;
        }
        Ok(())
    }
}

impl<F> Write for ChunkedWriter<F>
where
    F: FnMut(&[u8]) -> io::Result<()>,
{
    /// If `on_chunk` fails on the first block, nothing of `buf` is kept. If
    /// it fails later, the bytes already handed out count as written.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let held = self.buffer.len();
        self.buffer.extend_from_slice(buf);
        if self.buffer.len() < self.chunk_size {
            return Ok(buf.len());
        }

        let full = self.buffer.len() - self.buffer.len() % self.chunk_size;
        let mut emitted = 0;
        while emitted < full {
            let block = &self.buffer[emitted..emitted + self.chunk_size];
            trace!("emitting {} byte block", block.len());
            if let Err(e) = (self.on_chunk)(block) {
                if emitted == 0 {
                    self.buffer.truncate(held);
                    return Err(e);
                }
                // held < chunk_size <= emitted, so this is part of `buf`
                self.buffer.clear();
                return Ok(emitted - held);
            }
            emitted += self.chunk_size;
            self.blocks += 1;
        }
        self.buffer.drain(..full);

        Ok(buf.len())
    }

    /// Does not emit a partial block; only `finish` does that.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn unsupported(op: &str) -> io::Error {
    io::Error::new(
        ErrorKind::Unsupported,
        format!("ChunkedWriter is write-only, {op} is not supported"),
    )
}

impl<F> Read for ChunkedWriter<F>
where
    F: FnMut(&[u8]) -> io::Result<()>,
{
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(unsupported("read"))
    }
}

/// Covers length and position queries too, which go through `seek`.
impl<F> Seek for ChunkedWriter<F>
where
    F: FnMut(&[u8]) -> io::Result<()>,
{
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(unsupported("seek"))
    }
}

impl<F> Drop for ChunkedWriter<F>
where
    F: FnMut(&[u8]) -> io::Result<()>,
{
    fn drop(&mut self) {
        // Errors are only observable through `finish`
        let _ = self.emit_tail();
    }
}
