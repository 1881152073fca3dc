// sixela::dither
//
// TOC
// - struct DitherConf
// - impl DitherConf

use crate::{
    pixelformat::PixelFormat,
    quant::{sixel_quant_apply_palette, sixel_quant_make_palette},
    SixelError, SixelResult,
};
use alloc::vec;
use devela::Vec;

mod builder;
mod enums;
pub use {builder::*, enums::*};

/// Configuration and working state for mapping RGB pixels onto a bounded
/// color palette, shared by the quantizer and the SIXEL encoder.
///
/// # Adaptation
/// - Derived from `sixel_dither` struct in the `libsixel` C library.
#[derive(Debug, Clone)]
pub struct DitherConf {
    /// Number of colors actually present in `palette` after quantization.
    pub ncolors: i32,
    /// Number of colors requested by the caller.
    pub reqcolors: i32,
    /// Number of distinct colors found in the source image, pre-quantize.
    pub origcolors: i32,

    /// `true` once [`DitherConf::make_palette`] has produced a palette.
    pub optimized: bool,
    /// `true` to run median-cut automatically the first time
    /// [`DitherConf::apply_palette`] is called on an unoptimized palette,
    /// rather than requiring an explicit [`DitherConf::initialize`] call.
    pub auto_initialize: bool,
    /// `true` to renumber palette indices down to the distinct set actually
    /// used by the image, truncating `palette` to match.
    pub optimize_palette: bool,

    /// Skin-tone correction bias applied to the nearest-color metric.
    pub complexion: i32,

    /// Packed RGB888 palette, `ncolors * 3` bytes.
    pub palette: Vec<u8>,
    /// Cache table for the "fast" nearest-color lookup path.
    pub cachetable: Vec<u16>,

    /// Palette index treated as transparent; `-1` disables the key color.
    pub keycolor: i32,

    /// Axis-selection strategy for median-cut box splitting.
    pub method_for_largest: MethodForLargest,
    /// Representative-color strategy for median-cut box collapsing.
    pub method_for_rep: MethodForRep,
    /// Error-diffusion kernel used when applying the palette.
    pub method_for_diffuse: DiffusionMethod,
    /// Quantization quality/sampling trade-off.
    pub quality_mode: Quality,
    /// Pixel scan order used while applying error diffusion.
    pub scan_mode: ScanMode,
    /// Error-diffusion accumulation arithmetic.
    pub carry_mode: CarryMode,
    /// Bucket width of the histogram/fast-lookup color lattice.
    pub lut_policy: LutPolicy,

    /// Pixel format of the buffer passed to [`DitherConf::apply_palette`].
    pub pixelformat: PixelFormat,

    /// If `true`, [`crate::output::SixelOutput::encode_dither`] emits only
    /// the pixel body, skipping palette definitions.
    pub bodyonly: bool,
}

impl Default for DitherConf {
    fn default() -> Self {
        Self {
            ncolors: 2,
            reqcolors: 256,
            origcolors: -1,
            optimized: false,
            auto_initialize: true,
            optimize_palette: false,
            complexion: 1,
            palette: vec![0u8; 256 * 3],
            cachetable: Vec::new(),
            keycolor: -1,
            method_for_largest: MethodForLargest::Auto,
            method_for_rep: MethodForRep::Auto,
            method_for_diffuse: DiffusionMethod::Auto,
            quality_mode: Quality::Auto,
            scan_mode: ScanMode::Sequential,
            carry_mode: CarryMode::Disable,
            lut_policy: LutPolicy::Auto,
            pixelformat: PixelFormat::RGB888,
            bodyonly: false,
        }
    }
}

impl DitherConf {
    /// Build a dither context requesting up to `reqcolors` palette entries.
    #[must_use]
    pub fn new(reqcolors: i32) -> Self {
        Self { reqcolors, ..Default::default() }
    }

    /// Initializes `self.palette` by running the median-cut quantizer over
    /// `pixels` (`width * height * 3` RGB888 bytes).
    ///
    /// # Adaptation
    /// - Derived from `sixel_dither_initialize` in the `libsixel` C library.
    pub fn initialize(&mut self, pixels: &[u8], width: i32, height: i32) -> SixelResult<()> {
        let (palette, ncolors, origcolors) = sixel_quant_make_palette(
            pixels,
            width,
            height,
            PixelFormat::RGB888.depth(),
            self.reqcolors,
            self.method_for_largest,
            self.method_for_rep,
            self.quality_mode,
            self.lut_policy,
        )?;
        self.palette = palette;
        self.ncolors = ncolors;
        self.origcolors = origcolors;
        self.optimized = true;
        Ok(())
    }

    /// Sets the requested palette size.
    #[inline]
    pub fn set_reqcolors(&mut self, reqcolors: i32) {
        self.reqcolors = reqcolors;
    }

    /// Enables or disables automatic median-cut initialization on the
    /// first [`DitherConf::apply_palette`] call.
    #[inline]
    pub fn set_auto_initialize(&mut self, auto_initialize: bool) {
        self.auto_initialize = auto_initialize;
    }

    /// Enables or disables palette index renumbering (compaction to the
    /// distinct colors actually used).
    #[inline]
    pub fn set_optimize_palette(&mut self, optimize: bool) {
        self.optimize_palette = optimize;
    }

    /// Sets the pixel scan order used while applying error diffusion.
    #[inline]
    pub fn set_scan_mode(&mut self, mode: ScanMode) {
        self.scan_mode = mode;
    }

    /// Sets the error-diffusion accumulation arithmetic.
    #[inline]
    pub fn set_carry_mode(&mut self, mode: CarryMode) {
        self.carry_mode = mode;
    }

    /// Sets the bucket width of the histogram/fast-lookup color lattice.
    #[inline]
    pub fn set_lut_policy(&mut self, policy: LutPolicy) {
        self.lut_policy = policy;
    }

    /// Sets the largest-box axis-selection strategy.
    #[inline]
    pub fn set_method_for_largest(&mut self, method: MethodForLargest) {
        self.method_for_largest = method;
    }

    /// Sets the representative-color strategy.
    #[inline]
    pub fn set_method_for_rep(&mut self, method: MethodForRep) {
        self.method_for_rep = method;
    }

    /// Sets the error-diffusion kernel.
    #[inline]
    pub fn set_diffusion_type(&mut self, method: DiffusionMethod) {
        self.method_for_diffuse = method;
    }

    /// Sets the quantization quality/sampling trade-off.
    #[inline]
    pub fn set_quality_mode(&mut self, quality: Quality) {
        self.quality_mode = quality;
    }

    /// Sets the pixel format of buffers passed to [`DitherConf::apply_palette`].
    #[inline]
    pub fn set_pixelformat(&mut self, format: PixelFormat) {
        self.pixelformat = format;
    }

    /// Sets the transparent palette index, or `-1` to disable transparency.
    #[inline]
    pub fn set_keycolor(&mut self, keycolor: i32) {
        self.keycolor = keycolor;
    }

    /// Sets the complexion (skin-tone) correction bias.
    #[inline]
    pub fn set_complexion(&mut self, complexion: i32) {
        self.complexion = complexion;
    }

    /// Maps `pixels` (`width * height * depth` bytes in `self.pixelformat`)
    /// onto `self.palette`, returning one palette index per pixel.
    ///
    /// # Adaptation
    /// - Derived from `sixel_dither_apply_palette` in the `libsixel` C
    ///   library.
    pub fn apply_palette(&mut self, pixels: &[u8], width: i32, height: i32) -> SixelResult<Vec<u8>> {
        if !self.optimized && self.auto_initialize {
            self.initialize(pixels, width, height)?;
        }
        sixel_quant_apply_palette(
            &mut self.palette,
            pixels,
            width,
            height,
            self.pixelformat.depth(),
            &mut self.ncolors,
            self.method_for_diffuse,
            self.keycolor,
            self.complexion,
            &mut self.cachetable,
            self.scan_mode,
            self.carry_mode,
            self.lut_policy,
            self.optimize_palette,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_two_colors_and_no_keycolor() {
        let d = DitherConf::default();
        assert_eq!(d.ncolors, 2);
        assert_eq!(d.keycolor, -1);
    }

    #[test]
    fn new_sets_requested_color_count() {
        let d = DitherConf::new(64);
        assert_eq!(d.reqcolors, 64);
    }
}
