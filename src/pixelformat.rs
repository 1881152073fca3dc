// sixela::pixelformat
//
// TOC
// - enum PixelFormat
// - enum FormatType
// - fn sixel_helper_compute_depth
// - fn sixel_helper_normalize_pixelformat

use crate::{SixelError, SixelResult};
use alloc::vec;

/// Coarse classification of a [`PixelFormat`], matching the bit-packed
/// discriminant layout of the original `libsixel` `pixelFormat` enum.
///
/// # Adaptation
/// - Derived from `formatType` in the `libsixel` C library.
pub enum FormatType {
    /// Full-color formats (RGB/BGR/ARGB permutations).
    Color = 0,
    /// Grayscale formats, 1/2/4/8 bits per pixel.
    Grayscale = 1 << 6,
    /// Paletted formats, 1/2/4/8 bits per pixel.
    Palette = 1 << 7,
}

/// Pixel format of an input image buffer.
///
/// # Adaptation
/// - Derived from `pixelFormat` in the `libsixel` C library. The numeric
///   discriminants are kept stable for compatibility with that layout even
///   though nothing in this crate round-trips them through an FFI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PixelFormat {
    /// 15bpp RGB.
    RGB555 = 0x01,
    /// 16bpp RGB.
    RGB565 = 0x02,
    /// 24bpp RGB. Canonical format consumed by the quantizer and encoder.
    RGB888 = 0x03,
    /// 15bpp BGR.
    BGR555 = 0x04,
    /// 16bpp BGR.
    BGR565 = 0x05,
    /// 24bpp BGR.
    BGR888 = 0x06,
    /// 32bpp ARGB.
    ARGB8888 = 0x10,
    /// 32bpp RGBA.
    RGBA8888 = 0x11,
    /// 32bpp ABGR.
    ABGR8888 = 0x12,
    /// 32bpp BGRA.
    BGRA8888 = 0x13,
    /// 1bpp grayscale.
    G1 = (1 << 6),
    /// 2bpp grayscale.
    G2 = (1 << 6) | 0x01,
    /// 4bpp grayscale.
    G4 = (1 << 6) | 0x02,
    /// 8bpp grayscale.
    G8 = (1 << 6) | 0x03,
    /// 16bpp gray + alpha (alpha-major byte order).
    AG88 = (1 << 6) | 0x13,
    /// 16bpp gray + alpha (gray-major byte order).
    GA88 = (1 << 6) | 0x23,
    /// 1bpp paletted.
    PAL1 = (1 << 7),
    /// 2bpp paletted.
    PAL2 = (1 << 7) | 0x01,
    /// 4bpp paletted.
    PAL4 = (1 << 7) | 0x02,
    /// 8bpp paletted.
    PAL8 = (1 << 7) | 0x03,
}

impl PixelFormat {
    /// Number of color channels per pixel once normalized to RGB888.
    #[inline]
    #[must_use]
    pub fn depth(self) -> i32 {
        3
    }

    /// Number of bytes a single pixel occupies in this format's own packing,
    /// used to validate `Frame::pixel_bytes == width * height *
    /// bytes_per_pixel(format)`.
    #[must_use]
    pub fn bytes_per_pixel(self) -> f32 {
        match self {
            PixelFormat::RGB555 | PixelFormat::RGB565 | PixelFormat::BGR555 | PixelFormat::BGR565 => 2.0,
            PixelFormat::RGB888 | PixelFormat::BGR888 => 3.0,
            PixelFormat::ARGB8888 | PixelFormat::RGBA8888 | PixelFormat::ABGR8888 | PixelFormat::BGRA8888 => 4.0,
            PixelFormat::G1 => 0.125,
            PixelFormat::G2 | PixelFormat::PAL2 => 0.25,
            PixelFormat::G4 | PixelFormat::PAL4 => 0.5,
            PixelFormat::G8 | PixelFormat::PAL8 | PixelFormat::PAL1 => 1.0,
            PixelFormat::AG88 | PixelFormat::GA88 => 2.0,
        }
    }

    /// `true` if this format stores one byte-or-fewer palette index per
    /// pixel rather than direct color components.
    #[inline]
    #[must_use]
    pub fn is_paletted(self) -> bool {
        matches!(self, PixelFormat::PAL1 | PixelFormat::PAL2 | PixelFormat::PAL4 | PixelFormat::PAL8)
    }

    /// `true` if this format is grayscale (with or without alpha).
    #[inline]
    #[must_use]
    pub fn is_grayscale(self) -> bool {
        matches!(
            self,
            PixelFormat::G1 | PixelFormat::G2 | PixelFormat::G4 | PixelFormat::G8 | PixelFormat::AG88 | PixelFormat::GA88
        )
    }
}

/// Number of color channels the quantizer/encoder operate on for `format`.
///
/// # Adaptation
/// - Derived from `sixel_helper_compute_depth` in the `libsixel` C library.
#[must_use]
pub fn sixel_helper_compute_depth(format: PixelFormat) -> i32 {
    match format {
        PixelFormat::RGB555
        | PixelFormat::RGB565
        | PixelFormat::RGB888
        | PixelFormat::BGR555
        | PixelFormat::BGR565
        | PixelFormat::BGR888
        | PixelFormat::ARGB8888
        | PixelFormat::RGBA8888
        | PixelFormat::ABGR8888
        | PixelFormat::BGRA8888 => 3,
        PixelFormat::G1 | PixelFormat::G2 | PixelFormat::G4 | PixelFormat::G8 => 1,
        PixelFormat::AG88 | PixelFormat::GA88 => 2,
        PixelFormat::PAL1 | PixelFormat::PAL2 | PixelFormat::PAL4 | PixelFormat::PAL8 => 1,
    }
}

/// Normalizes any recognized pixel format into one of this crate's three
/// canonical forms and reports which one `dst` now holds.
///
/// `dst` must be sized at least `width * height * 3`, generous enough for
/// the largest (RGB888) case; grayscale/paletted sources only use the
/// leading `width * height` bytes of it.
///
/// - True-color formats (RGB/BGR/ARGB permutations) expand to packed
///   RGB888 triplets and report back [`PixelFormat::RGB888`].
/// - Sub-byte grayscale (`G1`/`G2`/`G4`) unpacks to one raw level byte
///   (`0..2^bits`) per pixel and reports [`PixelFormat::G8`].
/// - Sub-byte paletted (`PAL1`/`PAL2`/`PAL4`) unpacks to one raw index byte
///   per pixel and reports [`PixelFormat::PAL8`].
/// - `G8`/`PAL8` sources are already one byte per pixel and pass through
///   unchanged, reporting back the same format.
///
/// Grayscale/paletted outputs are index streams, not colors: the caller is
/// expected to pair them with a palette sized to match (a `2^bits`-entry
/// grayscale ramp, or the source's own palette) rather than treat `dst` as
/// RGB.
///
/// # Adaptation
/// - Derived from `sixel_helper_normalize_pixelformat` in the `libsixel` C
///   library.
pub fn sixel_helper_normalize_pixelformat(
    dst: &mut [u8],
    src: &[u8],
    format: PixelFormat,
    width: i32,
    height: i32,
) -> SixelResult<PixelFormat> {
    let npixels = (width as usize) * (height as usize);
    if dst.len() < npixels * 3 {
        return Err(SixelError::Logic("normalize_pixelformat: destination buffer too small"));
    }

    match format {
        PixelFormat::RGB888 => {
            dst[..npixels * 3].copy_from_slice(&src[..npixels * 3]);
        }
        PixelFormat::BGR888 => {
            for i in 0..npixels {
                dst[i * 3] = src[i * 3 + 2];
                dst[i * 3 + 1] = src[i * 3 + 1];
                dst[i * 3 + 2] = src[i * 3];
            }
        }
        PixelFormat::ARGB8888 => {
            for i in 0..npixels {
                dst[i * 3] = src[i * 4 + 1];
                dst[i * 3 + 1] = src[i * 4 + 2];
                dst[i * 3 + 2] = src[i * 4 + 3];
            }
        }
        PixelFormat::RGBA8888 => {
            for i in 0..npixels {
                dst[i * 3] = src[i * 4];
                dst[i * 3 + 1] = src[i * 4 + 1];
                dst[i * 3 + 2] = src[i * 4 + 2];
            }
        }
        PixelFormat::ABGR8888 => {
            for i in 0..npixels {
                dst[i * 3] = src[i * 4 + 3];
                dst[i * 3 + 1] = src[i * 4 + 2];
                dst[i * 3 + 2] = src[i * 4 + 1];
            }
        }
        PixelFormat::BGRA8888 => {
            for i in 0..npixels {
                dst[i * 3] = src[i * 4 + 2];
                dst[i * 3 + 1] = src[i * 4 + 1];
                dst[i * 3 + 2] = src[i * 4];
            }
        }
        PixelFormat::G1 | PixelFormat::G2 | PixelFormat::G4 => {
            unpack_bits(dst, src, bits_of(format), npixels);
            return Ok(PixelFormat::G8);
        }
        PixelFormat::PAL1 | PixelFormat::PAL2 | PixelFormat::PAL4 => {
            unpack_bits(dst, src, bits_of(format), npixels);
            return Ok(PixelFormat::PAL8);
        }
        PixelFormat::G8 | PixelFormat::PAL8 => {
            dst[..npixels].copy_from_slice(&src[..npixels]);
            return Ok(format);
        }
        PixelFormat::AG88 | PixelFormat::GA88 => {
            let gray_first = matches!(format, PixelFormat::GA88);
            for i in 0..npixels {
                let v = if gray_first { src[i * 2] } else { src[i * 2 + 1] };
                dst[i * 3] = v;
                dst[i * 3 + 1] = v;
                dst[i * 3 + 2] = v;
            }
        }
        PixelFormat::RGB555 | PixelFormat::RGB565 | PixelFormat::BGR555 | PixelFormat::BGR565 => {
            return Err(SixelError::NotImplemented("16/15bpp pixel formats"));
        }
    }
    Ok(PixelFormat::RGB888)
}

fn bits_of(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::G1 | PixelFormat::PAL1 => 1,
        PixelFormat::G2 | PixelFormat::PAL2 => 2,
        PixelFormat::G4 | PixelFormat::PAL4 => 4,
        _ => unreachable!(),
    }
}

/// Unpacks `bits`-per-pixel values from `src` into one raw byte per pixel
/// in `dst[..npixels]`, most-significant-bit-first within each source byte.
fn unpack_bits(dst: &mut [u8], src: &[u8], bits: u32, npixels: usize) {
    let per_byte = 8 / bits;
    let mask = ((1u16 << bits) - 1) as u8;
    for i in 0..npixels {
        let byte = src[i / per_byte as usize];
        let shift = 8 - bits * (i as u32 % per_byte + 1);
        dst[i] = (byte >> shift) & mask;
    }
}

/// Expands a paletted buffer into packed RGB888 triplets using `palette`
/// (tightly packed `ncolors * 3` bytes).
pub fn normalize_paletted(dst: &mut [u8], src: &[u8], format: PixelFormat, palette: &[u8], width: i32, height: i32) -> SixelResult<()> {
    if !format.is_paletted() {
        return Err(SixelError::Logic("normalize_paletted: format is not paletted"));
    }
    let npixels = (width as usize) * (height as usize);
    let bits = match format {
        PixelFormat::PAL1 => 1,
        PixelFormat::PAL2 => 2,
        PixelFormat::PAL4 => 4,
        PixelFormat::PAL8 => 8,
        _ => unreachable!(),
    };
    let per_byte = 8 / bits.max(1);
    let mask = if bits == 8 { 0xff } else { (1u8 << bits) - 1 };

    let mut out = vec![0u8; npixels * 3];
    for i in 0..npixels {
        let idx = if bits == 8 {
            src[i] as usize
        } else {
            let byte = src[i / per_byte];
            let shift = 8 - bits * (i % per_byte + 1);
            ((byte >> shift) & mask) as usize
        };
        out[i * 3] = palette[idx * 3];
        out[i * 3 + 1] = palette[idx * 3 + 1];
        out[i * 3 + 2] = palette[idx * 3 + 2];
    }
    dst[..npixels * 3].copy_from_slice(&out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_is_three_for_every_format() {
        assert_eq!(sixel_helper_compute_depth(PixelFormat::RGB888), 3);
        assert_eq!(sixel_helper_compute_depth(PixelFormat::G8), 1);
        assert_eq!(sixel_helper_compute_depth(PixelFormat::AG88), 2);
    }

    #[test]
    fn normalize_bgr_swaps_channels() {
        let src = [10u8, 20, 30];
        let mut dst = [0u8; 3];
        sixel_helper_normalize_pixelformat(&mut dst, &src, PixelFormat::BGR888, 1, 1).unwrap();
        assert_eq!(dst, [30, 20, 10]);
    }

    #[test]
    fn normalize_rgba_drops_alpha() {
        let src = [1u8, 2, 3, 255];
        let mut dst = [0u8; 3];
        sixel_helper_normalize_pixelformat(&mut dst, &src, PixelFormat::RGBA8888, 1, 1).unwrap();
        assert_eq!(dst, [1, 2, 3]);
    }

    #[test]
    fn normalize_pal2_unpacks_to_raw_indices_not_rgb() {
        // 0b00_01_10_11 packed 2bpp -> indices [0, 1, 2, 3]
        let src = [0b00_01_10_11u8];
        let mut dst = [0u8; 4 * 3];
        let out_fmt = sixel_helper_normalize_pixelformat(&mut dst, &src, PixelFormat::PAL2, 4, 1).unwrap();
        assert_eq!(out_fmt, PixelFormat::PAL8);
        assert_eq!(&dst[..4], &[0, 1, 2, 3]);
    }

    #[test]
    fn normalize_g1_unpacks_to_raw_levels() {
        let src = [0b1010_0000u8];
        let mut dst = [0u8; 4 * 3];
        let out_fmt = sixel_helper_normalize_pixelformat(&mut dst, &src, PixelFormat::G1, 4, 1).unwrap();
        assert_eq!(out_fmt, PixelFormat::G8);
        assert_eq!(&dst[..4], &[1, 0, 1, 0]);
    }

    #[test]
    fn paletted_round_trips_through_palette() {
        let palette = [0u8, 0, 0, 255, 255, 255];
        let src = [0u8, 1, 1, 0];
        let mut dst = [0u8; 12];
        normalize_paletted(&mut dst, &src, PixelFormat::PAL8, &palette, 4, 1).unwrap();
        assert_eq!(&dst[0..3], &[0, 0, 0]);
        assert_eq!(&dst[3..6], &[255, 255, 255]);
    }
}
