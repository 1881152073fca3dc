// sixela::output::dither_fns
//
// TOC
// - fn sixel_apply_15bpp_dither

use crate::dither::DiffusionMethod;
use crate::quant::{mask_a, mask_x};

/// Applies an in-place positional dither bias to the current pixel's RGB
/// channels before the caller truncates it to 5 bits per channel.
///
/// `pixels` must start at the current pixel's 3-byte RGB triplet.
///
/// # Adaptation
/// - Derived from `sixel_apply_15bpp_dither` in the `libsixel` C library,
///   reusing this crate's own `mask_a`/`mask_x` position hashes rather than
///   duplicating them.
pub(crate) fn sixel_apply_15bpp_dither(pixels: &mut [u8], x: i32, y: i32, _width: i32, _height: i32, method: DiffusionMethod) {
    let hasher = match method {
        DiffusionMethod::XDither => mask_x,
        _ => mask_a,
    };
    for c in 0..3 {
        let bias = hasher(x, y, c as i32) / 16;
        pixels[c] = (i32::from(pixels[c]) + bias).clamp(0, 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dither_keeps_channels_in_range() {
        let mut px = [250u8, 10, 128];
        sixel_apply_15bpp_dither(&mut px, 3, 7, 16, 16, DiffusionMethod::Auto);
        assert!(px.iter().all(|&v| v <= 255));
    }
}
