// sixela::loader
//
// TOC
// - enum LoopPolicy
// - enum SourceFormat
// - struct SixelFrames
// - fn load_frames
// - fn for_each_frame

use crate::chunk::Chunk;
use crate::decoder::{sixel_decode_parallel, sixel_decode_serial};
use crate::frame::Frame;
use crate::pixelformat::PixelFormat;
use crate::{SixelError, SixelResult};
use alloc::vec;
use devela::Vec;

/// Controls whether a decoded sequence is treated as looping animation.
///
/// # Adaptation
/// - Derived from `loopType` (`SIXEL_LOOP_*`) in the `libsixel` C library.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LoopPolicy {
    /// Loop if the source format says so (e.g. a GIF's loop count).
    #[default]
    Auto,
    /// Always loop, regardless of what the source says.
    Force,
    /// Never loop; play once and stop.
    Disable,
}

/// Coarse classification of a loaded [`Chunk`]'s contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// A DCS-enveloped SIXEL byte stream.
    Sixel,
    /// A binary PPM (`P6`) image.
    Pnm,
    /// Not recognized by this crate's minimal sniffing.
    Unknown,
}

/// Classifies `bytes` as [`SourceFormat::Sixel`], [`SourceFormat::Pnm`], or
/// [`SourceFormat::Unknown`].
///
/// This crate does not implement general image decoding; PNM support is
/// limited to the binary `P6` variant, sufficient for feeding already-raw
/// pixel data through the encoder without a full image-loading dependency.
#[must_use]
pub fn sniff_format(bytes: &[u8]) -> SourceFormat {
    if bytes.starts_with(b"\x1bP") || bytes.first() == Some(&0x90) {
        return SourceFormat::Sixel;
    }
    if bytes.starts_with(b"P6") {
        return SourceFormat::Pnm;
    }
    SourceFormat::Unknown
}

fn parse_pnm(bytes: &[u8]) -> SixelResult<Frame> {
    let text = core::str::from_utf8(bytes).unwrap_or_default();
    let mut tokens = text.split_whitespace();
    if tokens.next() != Some("P6") {
        return Err(SixelError::BadInput);
    }
    let width: i32 = tokens.next().and_then(|s| s.parse().ok()).ok_or(SixelError::BadInput)?;
    let height: i32 = tokens.next().and_then(|s| s.parse().ok()).ok_or(SixelError::BadInput)?;
    let _maxval: i32 = tokens.next().and_then(|s| s.parse().ok()).ok_or(SixelError::BadInput)?;

    // Re-find the single whitespace byte that terminates the header, since
    // we already consumed the header as UTF-8 text above.
    let mut header_bytes = 0usize;
    let mut seen = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b.is_ascii_whitespace() {
            seen += 1;
            if seen == 4 {
                header_bytes = i + 1;
                break;
            }
        }
    }
    if header_bytes == 0 {
        return Err(SixelError::BadInput);
    }
    let pixels = bytes[header_bytes..].to_vec();
    Frame::new(pixels, width, height, PixelFormat::RGB888)
}

/// A lazily-produced sequence of decoded frames.
///
/// For the formats this crate understands (SIXEL, binary PNM) there is
/// always exactly one frame; this is still modeled as an iterator, per the
/// iterator-first loader design, so callers that expect multi-frame
/// sequences (an animated SIXEL macro stream) are not forced to rewrite
/// their consumption loop later.
#[derive(Debug)]
pub struct SixelFrames {
    frames: Vec<Frame>,
    pos: usize,
    pub loop_policy: LoopPolicy,
}

impl Iterator for SixelFrames {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.pos >= self.frames.len() {
            if self.loop_policy == LoopPolicy::Disable || self.frames.is_empty() {
                return None;
            }
            self.pos = 0;
        }
        let frame = self.frames.get(self.pos).cloned();
        self.pos += 1;
        frame
    }
}

/// Decodes `chunk` into a [`SixelFrames`] sequence, dispatching on
/// [`sniff_format`]. `threads` selects between the serial and
/// prescan-parallel SIXEL decoders; `None` always decodes serially.
///
/// # Adaptation
/// - Derived from the format-dispatch step of `libsixel`'s `fromsixel.c`
///   loader.
pub fn load_frames(chunk: &Chunk, threads: Option<usize>, loop_policy: LoopPolicy) -> SixelResult<SixelFrames> {
    let bytes = chunk.bytes();
    let frame = match sniff_format(bytes) {
        SourceFormat::Sixel => {
            let surface = match threads {
                Some(n) if n > 1 => sixel_decode_parallel(bytes, Some(n))?,
                _ => sixel_decode_serial(bytes)?,
            };
            let rgb = surface.to_rgb888();
            Frame::new(rgb, surface.width, surface.height, PixelFormat::RGB888)?
        }
        SourceFormat::Pnm => parse_pnm(bytes)?,
        SourceFormat::Unknown => {
            return Err(SixelError::NotImplemented("load_frames: only SIXEL and binary PNM (P6) sources are supported"));
        }
    };

    Ok(SixelFrames { frames: vec![frame], pos: 0, loop_policy })
}

/// Calls `f` once per decoded frame, stopping early if `f` returns an
/// error. A thin callback-style adapter over the iterator-first
/// [`SixelFrames`] design.
pub fn for_each_frame(frames: SixelFrames, mut f: impl FnMut(&Frame) -> SixelResult<()>) -> SixelResult<()> {
    for frame in frames {
        f(&frame)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_sixel_by_dcs_introducer() {
        assert_eq!(sniff_format(b"\x1bPq"), SourceFormat::Sixel);
    }

    #[test]
    fn sniffs_binary_pnm() {
        assert_eq!(sniff_format(b"P6\n2 2\n255\n"), SourceFormat::Pnm);
    }

    #[test]
    fn unknown_format_is_not_implemented() {
        let chunk_bytes = b"garbage".to_vec();
        let chunk = Chunk::from_bytes_for_test(chunk_bytes);
        let err = load_frames(&chunk, None, LoopPolicy::Auto).unwrap_err();
        assert!(matches!(err, SixelError::NotImplemented(_)));
    }
}
