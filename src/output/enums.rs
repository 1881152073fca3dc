// sixela::output::enums
//
// TOC
// - enum PaletteType
// - enum EncodePolicy

pub use crate::pixelformat::PixelFormat;

/// Color system used when emitting DECGCI palette definitions.
///
/// # Adaptation
/// - Derived from `paletteType` in the `libsixel` C library.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteType {
    /// Choose RGB or HLS automatically from the dither's pixel format.
    #[default]
    Auto,
    /// Force `DECGCI` color-space selector 2 (RGB).
    Rgb,
    /// Force `DECGCI` color-space selector 1 (HLS).
    Hls,
}

/// Controls when the encoder prefers a filled run over a literal pixel run.
///
/// # Adaptation
/// - Derived from `methodForEncode` (`SIXEL_ENCODEPOLICY_*`) in the
///   `libsixel` C library.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodePolicy {
    /// Pick the smaller encoding per band automatically.
    #[default]
    Auto,
    /// Prefer byte-size minimization over decode-time affordance.
    Size,
    /// Prefer straightforward, most-compatible output.
    Fast,
}
