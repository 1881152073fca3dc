// sixela::dither::builder
//
// TOC
// - impl DitherConf (fluent setters)

use super::{CarryMode, DiffusionMethod, DitherConf, LutPolicy, MethodForLargest, MethodForRep, Quality, ScanMode};
use crate::pixelformat::PixelFormat;

impl DitherConf {
    /// Sets whether median-cut initialization runs automatically the first
    /// time [`DitherConf::apply_palette`] is called.
    #[inline]
    #[must_use]
    pub fn with_auto_initialize(mut self, auto_initialize: bool) -> Self {
        self.set_auto_initialize(auto_initialize);
        self
    }

    /// Sets whether palette indices are renumbered down to the distinct
    /// colors actually used.
    #[inline]
    #[must_use]
    pub fn with_optimize_palette(mut self, optimize: bool) -> Self {
        self.set_optimize_palette(optimize);
        self
    }

    /// Sets the pixel scan order used while applying error diffusion.
    #[inline]
    #[must_use]
    pub fn with_scan_mode(mut self, mode: ScanMode) -> Self {
        self.set_scan_mode(mode);
        self
    }

    /// Sets the error-diffusion accumulation arithmetic.
    #[inline]
    #[must_use]
    pub fn with_carry_mode(mut self, mode: CarryMode) -> Self {
        self.set_carry_mode(mode);
        self
    }

    /// Sets the bucket width of the histogram/fast-lookup color lattice.
    #[inline]
    #[must_use]
    pub fn with_lut_policy(mut self, policy: LutPolicy) -> Self {
        self.set_lut_policy(policy);
        self
    }

    /// Sets the largest-box axis-selection strategy.
    #[inline]
    #[must_use]
    pub fn with_method_for_largest(mut self, method: MethodForLargest) -> Self {
        self.set_method_for_largest(method);
        self
    }

    /// Sets the representative-color strategy.
    #[inline]
    #[must_use]
    pub fn with_method_for_rep(mut self, method: MethodForRep) -> Self {
        self.set_method_for_rep(method);
        self
    }

    /// Sets the error-diffusion kernel.
    #[inline]
    #[must_use]
    pub fn with_diffusion_type(mut self, method: DiffusionMethod) -> Self {
        self.set_diffusion_type(method);
        self
    }

    /// Sets the quantization quality/sampling trade-off.
    #[inline]
    #[must_use]
    pub fn with_quality_mode(mut self, quality: Quality) -> Self {
        self.set_quality_mode(quality);
        self
    }

    /// Sets the pixel format of buffers this context will dither.
    #[inline]
    #[must_use]
    pub fn with_pixelformat(mut self, format: PixelFormat) -> Self {
        self.set_pixelformat(format);
        self
    }

    /// Sets the transparent palette index, or `-1` to disable transparency.
    #[inline]
    #[must_use]
    pub fn with_keycolor(mut self, keycolor: i32) -> Self {
        self.set_keycolor(keycolor);
        self
    }

    /// Sets the complexion (skin-tone) correction bias.
    #[inline]
    #[must_use]
    pub fn with_complexion(mut self, complexion: i32) -> Self {
        self.set_complexion(complexion);
        self
    }
}
