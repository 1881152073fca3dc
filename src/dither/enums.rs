// sixela::dither::enums
//
// TOC
// - enum MethodForLargest
// - enum MethodForRep
// - enum DiffusionMethod
// - enum Quality
// - enum ScanMode
// - enum CarryMode
// - enum LutPolicy

/// Axis-selection strategy used when splitting a median-cut box.
///
/// # Adaptation
/// - Derived from `methodForLargest` in the `libsixel` C library.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodForLargest {
    /// Pick automatically (norm).
    #[default]
    Auto,
    /// Split on the axis with the largest raw channel range.
    Norm,
    /// Split on the axis with the largest luminosity-weighted range.
    Lum,
}

/// Representative-color strategy used when collapsing a median-cut box.
///
/// # Adaptation
/// - Derived from `methodForRep` in the `libsixel` C library.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodForRep {
    /// Pick automatically (average of pixels).
    #[default]
    Auto,
    /// Use the geometric center of the box.
    CenterBox,
    /// Average the *distinct colors* inside the box, unweighted by count.
    AverageColors,
    /// Average the *pixels* inside the box, weighted by count.
    AveragePixels,
}

/// Error-diffusion kernel applied when mapping pixels onto a fixed palette.
///
/// # Adaptation
/// - Derived from `methodForDiffuse` (`SIXEL_DIFFUSE_*`) in the `libsixel`
///   C library, extended with the `Lso1`/`Lso2`/`Lso3` variable-coefficient
///   kernels. Whether error accumulates in fixed-point carry rows is an
///   orthogonal choice; see [`CarryMode`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffusionMethod {
    /// Pick automatically (Floyd-Steinberg unless palette is tiny).
    #[default]
    Auto,
    /// No diffusion; nearest color only.
    None,
    /// Ordered dithering keyed on pixel position (hash A).
    Atkinson,
    /// Floyd-Steinberg.
    Fs,
    /// Jarvis, Judice & Ninke.
    JaJuNi,
    /// Stucki.
    Stucki,
    /// Burkes.
    Burkes,
    /// Ordered dithering keyed on pixel position (hash X).
    ADither,
    /// Ordered dithering keyed on pixel position, alternate hash.
    XDither,
    /// Variable-coefficient kernel, profile 1 (spec-only extension).
    Lso1,
    /// Variable-coefficient kernel, profile 2 (spec-only extension).
    Lso2,
    /// Variable-coefficient kernel, profile 3 (spec-only extension).
    Lso3,
}

/// Trade-off between quantization speed and histogram fidelity.
///
/// # Adaptation
/// - Derived from `methodForQuality` (`SIXEL_QUALITY_*`) in the `libsixel`
///   C library.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    /// Pick automatically from requested color count.
    #[default]
    Auto,
    /// Cap the histogram at a small sample size.
    Low,
    /// Sample the full image.
    High,
    /// Sample the full image with no decimation at all.
    Full,
    /// Skip the quantizer entirely and dither straight to a 15bpp palette.
    HighColor,
}

/// Pixel scan order used while applying error diffusion.
///
/// # Adaptation
/// - Derived from `scanline_params`'s serpentine branch in the `libsixel`
///   C library: odd rows are walked right-to-left, with every kernel tap's
///   horizontal offset mirrored to match, so error still propagates ahead
///   of the scan instead of behind it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanMode {
    /// Every row scanned left-to-right.
    #[default]
    Sequential,
    /// Alternating row direction (boustrophedon).
    Serpentine,
}

/// Arithmetic used to accumulate error-diffusion terms between pixels.
///
/// # Adaptation
/// - Derived from the carry-row (`apply_palette_variable`) vs. direct
///   (`apply_palette_fixed`) paths in the `libsixel` C library: `Enable`
///   accumulates error in Q20.12 fixed-point row buffers that rotate one
///   row forward instead of scattering it back into the pixel buffer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarryMode {
    /// Diffuse directly into the working pixel buffer.
    #[default]
    Disable,
    /// Diffuse into rotating Q20.12 fixed-point carry rows.
    Enable,
}

/// Bucket width of the coarse color lattice used by the histogram and the
/// "fast" nearest-color cache.
///
/// # Adaptation
/// - Derived from `histogram_control_make` in the `libsixel` C library:
///   the default lattice is 6 bits wide for 3-channel input, narrowing to
///   5 bits past `depth == 3`; `Five` forces the narrower lattice
///   regardless of depth.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LutPolicy {
    /// Depth-dependent default (6-bit for `depth <= 3`, else 5-bit).
    #[default]
    Auto,
    /// Force a 5-bit lattice.
    Five,
    /// Force the depth-dependent default explicitly.
    Six,
}
