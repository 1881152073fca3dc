// sixela::chunk
//
// TOC
// - struct Chunk
// - impl Chunk

use crate::allocator::{default_allocator, SharedAllocator};
use crate::{SixelError, SixelResult};
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

const READ_STEP: usize = 4096;

/// A bounded, doubling in-memory buffer of bytes read from a file or stdin.
///
/// # Adaptation
/// - Derived from `sixel_chunk` in the `libsixel` C library: the read loop
///   doubles `buffer`'s capacity as needed and polls a cancel flag every
///   `READ_STEP` bytes, matching the original's cooperative-cancellation
///   contract.
#[derive(Debug)]
pub struct Chunk {
    buffer: Vec<u8>,
    allocator: SharedAllocator,
}

impl Chunk {
    /// Reads the entirety of `path` into a new chunk.
    ///
    /// The file handle is closed when this function returns (it is not
    /// kept open past the read, unlike [`Chunk::from_stdin`]).
    pub fn from_path(path: impl AsRef<Path>, cancel: &AtomicBool) -> SixelResult<Self> {
        let file = std::fs::File::open(path).map_err(SixelError::Io)?;
        Self::read_from(file, cancel)
    }

    /// Reads the entirety of stdin into a new chunk. Does not close stdin.
    pub fn from_stdin(cancel: &AtomicBool) -> SixelResult<Self> {
        Self::read_from(std::io::stdin(), cancel)
    }

    /// Fetches a chunk from a URL.
    ///
    /// Not implemented: this crate introduces no HTTP client dependency.
    pub fn from_url(_url: &str) -> SixelResult<Self> {
        Err(SixelError::NotImplemented("Chunk::from_url: HTTP fetching is out of scope for this crate"))
    }

    fn read_from(mut reader: impl Read, cancel: &AtomicBool) -> SixelResult<Self> {
        let allocator = default_allocator();
        let mut buffer = Vec::new();
        let mut step = vec![0u8; READ_STEP];
        loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(SixelError::Interrupted);
            }
            let n = reader.read(&mut step).map_err(SixelError::Io)?;
            if n == 0 {
                break;
            }
            buffer.extend_from_slice(&step[..n]);
        }
        Ok(Self { buffer, allocator })
    }

    /// Returns the loaded bytes.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the allocator this chunk was loaded with.
    #[inline]
    #[must_use]
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// `true` if the first bytes look like a SIXEL/DCS stream rather than
    /// another image format.
    ///
    /// # Adaptation
    /// - Derived from `chunk_is_sixel` in the `libsixel` C library, using
    ///   the corrected two-byte DCS-introducer check plus a bounded scan
    ///   for a `q` parameter terminator, rather than the legacy
    ///   uninitialized-pointer heuristic.
    #[must_use]
    pub fn looks_like_sixel(&self) -> bool {
        let b = &self.buffer;
        let starts_dcs = b.starts_with(b"\x1bP") || b.first() == Some(&0x90);
        if !starts_dcs {
            return false;
        }
        let window = &b[..b.len().min(64)];
        window.iter().take_while(|&&c| c != 0x1b && c != 0x9c).any(|&c| c == b'q')
    }

    /// Builds a chunk directly from an in-memory buffer, bypassing file/
    /// stdin I/O. Used by other modules' tests that need a `Chunk` without
    /// touching the filesystem.
    #[doc(hidden)]
    pub fn from_bytes_for_test(buffer: Vec<u8>) -> Self {
        Self { buffer, allocator: default_allocator() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_7bit_sixel_introducer() {
        let c = Chunk { buffer: b"\x1bP0;0;0q\"1;1;1;1".to_vec(), allocator: default_allocator() };
        assert!(c.looks_like_sixel());
    }

    #[test]
    fn rejects_png_signature() {
        let c = Chunk { buffer: vec![0x89, b'P', b'N', b'G'], allocator: default_allocator() };
        assert!(!c.looks_like_sixel());
    }

    #[test]
    fn from_stdin_respects_cancel_flag() {
        let cancel = AtomicBool::new(true);
        let err = Chunk::from_stdin(&cancel).unwrap_err();
        assert!(matches!(err, SixelError::Interrupted));
    }
}
