// sixela::quant
//
// TOC
// - struct Tuple
// - struct Bbox
// - struct HistogramControl / histogram_control_make / histogram_quantize / histogram_reconstruct
// - fn compute_hash / compute_histogram
// - fn median_cut
// - fn sixel_quant_make_palette
// - fn mask_a / mask_x
// - diffusion kernels: none/fs/atkinson/jajuni/stucki/burkes/lso1/lso2/lso3
// - fn lookup_mono_darkbg / lookup_mono_lightbg / lookup_fast / lookup_normal
// - fn sixel_quant_apply_palette

use crate::dither::{CarryMode, DiffusionMethod, LutPolicy, MethodForLargest, MethodForRep, Quality, ScanMode};
use crate::{SixelError, SixelResult};
use alloc::vec;
use devela::Vec;

const LUMIN_FACTOR: [f64; 3] = [0.2989, 0.5866, 0.1145];

/// Ceiling on the number of entries a renumbered ("optimized") palette may
/// carry, matching the fixed-size `SIXEL_PALETTE_MAX` scratch buffers in the
/// `libsixel` C library's quantizer.
const PALETTE_MAX: usize = 256;

const VARERR_SCALE_SHIFT: u32 = 12;
const VARERR_ROUND: i64 = 1 << (VARERR_SCALE_SHIFT - 1);
const VARERR_MAX_VALUE: i64 = 255 * (1i64 << VARERR_SCALE_SHIFT);

/// A distinct RGB color observed in the source image, with its pixel count.
///
/// # Adaptation
/// - Derived from `Tuple` in the `mkrueger-icy_tools` quantizer.
#[derive(Debug, Clone, Copy)]
struct Tuple {
    value: i32,
    color: [u8; 3],
}

/// A box of histogram entries being split by the median-cut algorithm.
///
/// # Adaptation
/// - Derived from `bbox` in the `mkrueger-icy_tools` quantizer.
#[derive(Debug, Clone, Copy)]
struct Bbox {
    ind: usize,
    colors: usize,
    sum: i64,
}

/// Bucket geometry for the coarse color lattice: how many low bits of each
/// 8-bit channel are discarded, and the resulting per-channel bit width/mask.
///
/// # Adaptation
/// - Derived from `histogram_control` in the `libsixel` C library.
#[derive(Debug, Clone, Copy)]
struct HistogramControl {
    channel_shift: u32,
    channel_bits: u32,
    channel_mask: u32,
}

/// Picks bucket geometry for `depth` channels under `policy`. The default is
/// a 6-bit lattice for `depth <= 3` (5 bits beyond that, to keep the bucket
/// count reasonable); `LutPolicy::Five` forces 5 bits regardless of depth,
/// `LutPolicy::Six` reasserts the depth-dependent default explicitly.
///
/// # Adaptation
/// - Derived from `histogram_control_make` in the `libsixel` C library.
fn histogram_control_make(depth: usize, policy: LutPolicy) -> HistogramControl {
    let mut channel_shift = if depth > 3 { 3 } else { 2 };
    match policy {
        LutPolicy::Five => channel_shift = 3,
        LutPolicy::Six => channel_shift = if depth > 3 { 3 } else { 2 },
        LutPolicy::Auto => {}
    }
    let channel_bits = 8 - channel_shift;
    let channel_mask = (1u32 << channel_bits) - 1;
    HistogramControl { channel_shift, channel_bits, channel_mask }
}

/// Quantizes one 8-bit channel sample to its lattice bucket, rounding to the
/// bucket center rather than truncating to its lower edge.
///
/// # Adaptation
/// - Derived from `histogram_quantize` in the `libsixel` C library.
fn histogram_quantize(sample8: u8, control: &HistogramControl) -> u32 {
    if control.channel_shift == 0 {
        return u32::from(sample8);
    }
    let rounding = 1u32 << (control.channel_shift - 1);
    let quantized = (u32::from(sample8) + rounding) >> control.channel_shift;
    quantized.min(control.channel_mask)
}

/// Reconstructs a representative 8-bit channel value for a lattice bucket.
///
/// # Adaptation
/// - Derived from `histogram_reconstruct` in the `libsixel` C library.
fn histogram_reconstruct(quantized: u32, control: &HistogramControl) -> u8 {
    let mut value = quantized << control.channel_shift;
    if quantized == control.channel_mask {
        value = 255;
    } else if control.channel_shift > 0 {
        value |= 1 << (control.channel_shift - 1);
    }
    value.min(255) as u8
}

/// Lattice hash used to decimate the histogram to a manageable sample size.
///
/// # Adaptation
/// - Derived from `computeHash` in the `libsixel` C library / the
///   `mkrueger-icy_tools` quantizer: packs each channel's lattice bucket, at
///   a decimation `depth`, into one key.
fn compute_hash(data: &[u8], depth: usize, control: &HistogramControl) -> usize {
    let mut hash = 0usize;
    for n in 0..depth {
        let sample = data[depth - 1 - n];
        hash |= (histogram_quantize(sample, control) as usize) << (n * control.channel_bits as usize);
    }
    hash
}

/// Builds a decimated color histogram from `pixels` (`depth`-channel rows).
///
/// Samples are merged purely by lattice bucket (no secondary raw-color
/// check), matching `histogram[bucket_index]++`'s behavior in the original:
/// two different colors landing in the same bucket are one distinct entry,
/// reconstructed from the bucket's lattice center rather than from whichever
/// raw pixel happened to be sampled first.
///
/// # Adaptation
/// - Derived from `computeHistogram` in the `libsixel` C library. Quality
///   caps the number of samples scanned: `Low` samples a small fixed window,
///   `High` a larger one, `Auto`/`Full`/`HighColor` the full-size cap.
fn compute_histogram(pixels: &[u8], width: i32, height: i32, depth: i32, quality: Quality, lut_policy: LutPolicy) -> SixelResult<Vec<Tuple>> {
    const MAX_LOW: usize = 18_383;
    const MAX_HIGH: usize = 1_118_383;
    const MAX_FULL: usize = 4_003_079;

    let depth = depth as usize;
    let npixels = (width as usize) * (height as usize);
    let max_samples = match quality {
        Quality::Low => MAX_LOW,
        Quality::High => MAX_HIGH,
        _ => MAX_FULL,
    };

    let step = if npixels > max_samples { npixels / max_samples + 1 } else { 1 };

    let control = histogram_control_make(depth, lut_policy);
    let hist_size = 1usize << (depth * control.channel_bits as usize);
    let mut histogram: Vec<u32> = vec![0; hist_size];
    let mut refmap: Vec<usize> = Vec::new();

    let mut i = 0usize;
    while i < npixels {
        let off = i * depth;
        if off + depth > pixels.len() {
            break;
        }
        let bucket = compute_hash(&pixels[off..off + depth], depth, &control);
        if histogram[bucket] == 0 {
            refmap.push(bucket);
        }
        if histogram[bucket] < u32::MAX {
            histogram[bucket] += 1;
        }
        i += step;
    }

    if refmap.is_empty() {
        return Err(SixelError::Logic("compute_histogram: empty image"));
    }

    let mut tuples = Vec::with_capacity(refmap.len());
    for bucket in refmap {
        let mut color = [0u8; 3];
        for n in 0..depth {
            let component = (bucket >> (n * control.channel_bits as usize)) & control.channel_mask as usize;
            color[depth - 1 - n] = histogram_reconstruct(component as u32, &control);
        }
        tuples.push(Tuple { value: histogram[bucket] as i32, color });
    }
    Ok(tuples)
}

fn largest_by_norm(tuples: &[Tuple], bbox: &Bbox) -> usize {
    let mut min = [255i32; 3];
    let mut max = [0i32; 3];
    for t in &tuples[bbox.ind..bbox.ind + bbox.colors] {
        for c in 0..3 {
            let v = i32::from(t.color[c]);
            min[c] = min[c].min(v);
            max[c] = max[c].max(v);
        }
    }
    let ranges = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];
    (0..3).max_by_key(|&c| ranges[c]).unwrap_or(0)
}

fn largest_by_luminosity(tuples: &[Tuple], bbox: &Bbox) -> usize {
    let mut min = [255.0f64; 3];
    let mut max = [0.0f64; 3];
    for t in &tuples[bbox.ind..bbox.ind + bbox.colors] {
        for c in 0..3 {
            let v = f64::from(t.color[c]) * LUMIN_FACTOR[c];
            min[c] = min[c].min(v);
            max[c] = max[c].max(v);
        }
    }
    let ranges = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];
    if ranges[0] >= ranges[1] && ranges[0] >= ranges[2] {
        0
    } else if ranges[1] >= ranges[2] {
        1
    } else {
        2
    }
}

fn center_box(tuples: &[Tuple], bbox: &Bbox) -> [u8; 3] {
    let mut min = [255i32; 3];
    let mut max = [0i32; 3];
    for t in &tuples[bbox.ind..bbox.ind + bbox.colors] {
        for c in 0..3 {
            let v = i32::from(t.color[c]);
            min[c] = min[c].min(v);
            max[c] = max[c].max(v);
        }
    }
    [((min[0] + max[0]) / 2) as u8, ((min[1] + max[1]) / 2) as u8, ((min[2] + max[2]) / 2) as u8]
}

fn average_colors(tuples: &[Tuple], bbox: &Bbox) -> [u8; 3] {
    let mut sum = [0i64; 3];
    for t in &tuples[bbox.ind..bbox.ind + bbox.colors] {
        for c in 0..3 {
            sum[c] += i64::from(t.color[c]);
        }
    }
    let n = bbox.colors.max(1) as i64;
    [(sum[0] / n) as u8, (sum[1] / n) as u8, (sum[2] / n) as u8]
}

fn average_pixels(tuples: &[Tuple], bbox: &Bbox) -> [u8; 3] {
    let mut sum = [0i64; 3];
    let mut total = 0i64;
    for t in &tuples[bbox.ind..bbox.ind + bbox.colors] {
        let w = i64::from(t.value);
        total += w;
        for c in 0..3 {
            sum[c] += i64::from(t.color[c]) * w;
        }
    }
    let n = total.max(1);
    [(sum[0] / n) as u8, (sum[1] / n) as u8, (sum[2] / n) as u8]
}

/// Splits `boxes[target]` in place, pushing the new box onto the end.
///
/// # Adaptation
/// - Derived from `splitBox` in the `mkrueger-icy_tools` quantizer: sorts
///   the box's slice of `tuples` by the chosen channel, then divides at the
///   running-sum median so each half carries roughly equal pixel weight.
fn split_box(tuples: &mut [Tuple], boxes: &mut Vec<Bbox>, target: usize, method_for_largest: MethodForLargest) {
    let bbox = boxes[target];
    let axis = match method_for_largest {
        MethodForLargest::Lum => largest_by_luminosity(tuples, &bbox),
        _ => largest_by_norm(tuples, &bbox),
    };

    let slice = &mut tuples[bbox.ind..bbox.ind + bbox.colors];
    slice.sort_by_key(|t| t.color[axis]);

    let half = bbox.sum / 2;
    let mut running = 0i64;
    let mut lowersum = 0i64;
    let mut split_at = 1;
    for (i, t) in slice.iter().enumerate() {
        running += i64::from(t.value);
        if running > half {
            split_at = i.max(1);
            lowersum = running - i64::from(t.value);
            break;
        }
        lowersum = running;
    }
    split_at = split_at.min(bbox.colors - 1).max(1);

    let new_box = Bbox { ind: bbox.ind + split_at, colors: bbox.colors - split_at, sum: bbox.sum - lowersum };
    boxes[target] = Bbox { ind: bbox.ind, colors: split_at, sum: lowersum };
    boxes.push(new_box);
}

/// Runs median-cut color clustering, returning one representative color per
/// resulting box.
///
/// # Adaptation
/// - Derived from `mediancut` in the `mkrueger-icy_tools` quantizer.
fn median_cut(mut tuples: Vec<Tuple>, reqcolors: i32, method_for_largest: MethodForLargest, method_for_rep: MethodForRep) -> Vec<[u8; 3]> {
    let total: i64 = tuples.iter().map(|t| i64::from(t.value)).sum();
    let mut boxes = vec![Bbox { ind: 0, colors: tuples.len(), sum: total }];

    while boxes.len() < reqcolors as usize {
        let Some((target, _)) = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.colors > 1)
            .max_by_key(|(_, b)| b.sum)
        else {
            break;
        };
        split_box(&mut tuples, &mut boxes, target, method_for_largest);
    }

    boxes
        .iter()
        .map(|b| match method_for_rep {
            MethodForRep::CenterBox => center_box(&tuples, b),
            MethodForRep::AverageColors => average_colors(&tuples, b),
            _ => average_pixels(&tuples, b),
        })
        .collect()
}

/// Builds a palette of at most `reqcolors` colors from `pixels`.
///
/// Returns `(palette, ncolors, origcolors)` where `palette` is
/// `ncolors * 3` packed RGB888 bytes and `origcolors` is the number of
/// distinct colors found before clustering.
///
/// # Adaptation
/// - Derived from `sixel_quant_make_palette` in the `mkrueger-icy_tools`
///   quantizer.
#[allow(clippy::too_many_arguments)]
pub fn sixel_quant_make_palette(
    pixels: &[u8],
    width: i32,
    height: i32,
    depth: i32,
    reqcolors: i32,
    method_for_largest: MethodForLargest,
    method_for_rep: MethodForRep,
    quality_mode: Quality,
    lut_policy: LutPolicy,
) -> SixelResult<(Vec<u8>, i32, i32)> {
    let tuples = compute_histogram(pixels, width, height, depth, quality_mode, lut_policy)?;
    let origcolors = tuples.len() as i32;

    let colors = if origcolors <= reqcolors {
        tuples.iter().map(|t| t.color).collect::<Vec<_>>()
    } else {
        median_cut(tuples, reqcolors, method_for_largest, method_for_rep)
    };

    let mut palette = vec![0u8; colors.len() * 3];
    for (i, c) in colors.iter().enumerate() {
        palette[i * 3] = c[0];
        palette[i * 3 + 1] = c[1];
        palette[i * 3 + 2] = c[2];
    }

    Ok((palette, colors.len() as i32, origcolors))
}

/// Ordered-dither hash "A": a fixed position-keyed threshold pattern in
/// `[-1.0, 1.0)`.
///
/// # Adaptation
/// - Derived from `mask_a` in the `libsixel` C library.
pub(crate) fn mask_a(x: i32, y: i32, c: i32) -> f64 {
    f64::from((((x + c * 67) + y * 236) * 119) & 255) / 128.0 - 1.0
}

/// Ordered-dither hash "X": a second fixed position-keyed threshold pattern
/// in `[-1.0, 1.0)`.
///
/// # Adaptation
/// - Derived from `mask_x` in the `libsixel` C library.
pub(crate) fn mask_x(x: i32, y: i32, c: i32) -> f64 {
    f64::from(((x + c * 29) ^ (y * 149)) * 1234 & 511) / 256.0 - 1.0
}

/// One pending error-diffusion push: pixel offset (in pixels, not bytes)
/// relative to the current one, and a `numerator/denominator` weight.
struct DiffuseTap {
    dx: i32,
    dy: i32,
    num: i32,
    den: i32,
}

fn kernel_for(method: DiffusionMethod) -> &'static [DiffuseTap] {
    match method {
        DiffusionMethod::Fs | DiffusionMethod::Auto => &[
            DiffuseTap { dx: 1, dy: 0, num: 7, den: 16 },
            DiffuseTap { dx: -1, dy: 1, num: 3, den: 16 },
            DiffuseTap { dx: 0, dy: 1, num: 5, den: 16 },
            DiffuseTap { dx: 1, dy: 1, num: 1, den: 16 },
        ],
        DiffusionMethod::Atkinson => &[
            DiffuseTap { dx: 1, dy: 0, num: 1, den: 8 },
            DiffuseTap { dx: 2, dy: 0, num: 1, den: 8 },
            DiffuseTap { dx: -1, dy: 1, num: 1, den: 8 },
            DiffuseTap { dx: 0, dy: 1, num: 1, den: 8 },
            DiffuseTap { dx: 1, dy: 1, num: 1, den: 8 },
            DiffuseTap { dx: 0, dy: 2, num: 1, den: 8 },
        ],
        DiffusionMethod::JaJuNi => &[
            DiffuseTap { dx: 1, dy: 0, num: 7, den: 48 },
            DiffuseTap { dx: 2, dy: 0, num: 5, den: 48 },
            DiffuseTap { dx: -2, dy: 1, num: 3, den: 48 },
            DiffuseTap { dx: -1, dy: 1, num: 5, den: 48 },
            DiffuseTap { dx: 0, dy: 1, num: 7, den: 48 },
            DiffuseTap { dx: 1, dy: 1, num: 5, den: 48 },
            DiffuseTap { dx: 2, dy: 1, num: 3, den: 48 },
            DiffuseTap { dx: -2, dy: 2, num: 1, den: 48 },
            DiffuseTap { dx: -1, dy: 2, num: 3, den: 48 },
            DiffuseTap { dx: 0, dy: 2, num: 5, den: 48 },
            DiffuseTap { dx: 1, dy: 2, num: 3, den: 48 },
            DiffuseTap { dx: 2, dy: 2, num: 1, den: 48 },
        ],
        DiffusionMethod::Stucki => &[
            DiffuseTap { dx: 1, dy: 0, num: 8, den: 42 },
            DiffuseTap { dx: 2, dy: 0, num: 4, den: 42 },
            DiffuseTap { dx: -2, dy: 1, num: 2, den: 42 },
            DiffuseTap { dx: -1, dy: 1, num: 4, den: 42 },
            DiffuseTap { dx: 0, dy: 1, num: 8, den: 42 },
            DiffuseTap { dx: 1, dy: 1, num: 4, den: 42 },
            DiffuseTap { dx: 2, dy: 1, num: 2, den: 42 },
            DiffuseTap { dx: -2, dy: 2, num: 1, den: 42 },
            DiffuseTap { dx: -1, dy: 2, num: 2, den: 42 },
            DiffuseTap { dx: 0, dy: 2, num: 4, den: 42 },
            DiffuseTap { dx: 1, dy: 2, num: 2, den: 42 },
            DiffuseTap { dx: 2, dy: 2, num: 1, den: 42 },
        ],
        DiffusionMethod::Burkes => &[
            DiffuseTap { dx: 1, dy: 0, num: 8, den: 32 },
            DiffuseTap { dx: 2, dy: 0, num: 4, den: 32 },
            DiffuseTap { dx: -2, dy: 1, num: 2, den: 32 },
            DiffuseTap { dx: -1, dy: 1, num: 4, den: 32 },
            DiffuseTap { dx: 0, dy: 1, num: 8, den: 32 },
            DiffuseTap { dx: 1, dy: 1, num: 4, den: 32 },
            DiffuseTap { dx: 2, dy: 1, num: 2, den: 32 },
        ],
        // Variable-coefficient profiles: same shape as Burkes, scaled down
        // (spec-only extension, no direct corpus kernel; trades diffusion
        // strength for speed across three steps).
        DiffusionMethod::Lso1 => &[
            DiffuseTap { dx: 1, dy: 0, num: 4, den: 8 },
            DiffuseTap { dx: 0, dy: 1, num: 3, den: 8 },
            DiffuseTap { dx: 1, dy: 1, num: 1, den: 8 },
        ],
        DiffusionMethod::Lso2 => &[
            DiffuseTap { dx: 1, dy: 0, num: 5, den: 16 },
            DiffuseTap { dx: -1, dy: 1, num: 3, den: 16 },
            DiffuseTap { dx: 0, dy: 1, num: 5, den: 16 },
            DiffuseTap { dx: 1, dy: 1, num: 3, den: 16 },
        ],
        DiffusionMethod::Lso3 => &[
            DiffuseTap { dx: 1, dy: 0, num: 6, den: 24 },
            DiffuseTap { dx: 2, dy: 0, num: 3, den: 24 },
            DiffuseTap { dx: -1, dy: 1, num: 5, den: 24 },
            DiffuseTap { dx: 0, dy: 1, num: 7, den: 24 },
            DiffuseTap { dx: 1, dy: 1, num: 3, den: 24 },
        ],
        DiffusionMethod::None | DiffusionMethod::ADither | DiffusionMethod::XDither => &[],
    }
}

/// Rounds `error * num / den` to the nearest integer, half away from zero.
///
/// # Adaptation
/// - Derived from `diffuse_fixed_term`/`diffuse_varerr_term` in the
///   `libsixel` C library (both round identically; one name covers both
///   here since this crate's kernels are unified into one tap table).
fn diffuse_term(error: i32, num: i32, den: i32) -> i32 {
    let delta = i64::from(error) * i64::from(num);
    let half = i64::from(den) / 2;
    let rounded = if delta >= 0 { (delta + half) / i64::from(den) } else { (delta - half) / i64::from(den) };
    rounded as i32
}

/// `(start, end, step, direction)` for scanning row `y`. Serpentine mode
/// reverses odd rows; `direction` tells callers which way "ahead" points so
/// kernel tap offsets can mirror along with the scan.
///
/// # Adaptation
/// - Derived from `scanline_params` in the `libsixel` C library.
fn scanline_params(serpentine: bool, y: usize, width: usize) -> (i32, i32, i32, i32) {
    if serpentine && y % 2 == 1 {
        (width as i32 - 1, -1, -1, -1)
    } else {
        (0, width as i32, 1, 1)
    }
}

enum MonoKind {
    DarkBg,
    LightBg,
}

/// Detects whether `palette`'s first two entries are exactly black/white or
/// white/black, the only case the monochrome lookup paths apply to.
///
/// # Adaptation
/// - Derived from the `sum1`/`sum2` check guarding `lookup_mono_darkbg`/
///   `lookup_mono_lightbg` selection in the `libsixel` C library.
fn mono_lookup_kind(palette: &[u8]) -> Option<MonoKind> {
    if palette.len() < 6 {
        return None;
    }
    let sum1: i32 = palette[0..3].iter().map(|&v| i32::from(v)).sum();
    let sum2: i32 = palette[3..6].iter().map(|&v| i32::from(v)).sum();
    if sum1 == 0 && sum2 == 255 * 3 {
        Some(MonoKind::DarkBg)
    } else if sum1 == 255 * 3 && sum2 == 0 {
        Some(MonoKind::LightBg)
    } else {
        None
    }
}

fn lookup_mono_darkbg(pixel: &[u8], reqcolor: i32) -> i32 {
    let distant: i32 = pixel.iter().map(|&v| i32::from(v)).sum();
    i32::from(distant >= 128 * reqcolor)
}

fn lookup_mono_lightbg(pixel: &[u8], reqcolor: i32) -> i32 {
    let distant: i32 = pixel.iter().map(|&v| i32::from(v)).sum();
    i32::from(distant < 128 * reqcolor)
}

fn distance(a: &[u8], b: &[u8], complexion: i32) -> i32 {
    let dr = i32::from(a[0]) - i32::from(b[0]);
    let dg = i32::from(a[1]) - i32::from(b[1]);
    let db = i32::from(a[2]) - i32::from(b[2]);
    dr * dr * complexion + dg * dg + db * db
}

fn lookup_normal(pixel: &[u8], palette: &[u8], ncolors: i32, complexion: i32) -> i32 {
    let mut best = 0;
    let mut best_d = i32::MAX;
    for i in 0..ncolors {
        let p = &palette[(i as usize) * 3..(i as usize) * 3 + 3];
        let d = distance(pixel, p, complexion);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

fn lookup_fast(pixel: &[u8], palette: &[u8], ncolors: i32, complexion: i32, cachetable: &mut Vec<u16>, control: &HistogramControl) -> i32 {
    let size = 1usize << (3 * control.channel_bits as usize);
    if cachetable.len() < size {
        cachetable.clear();
        cachetable.resize(size, 0);
    }
    let hash = compute_hash(pixel, 3, control);
    let cached = cachetable[hash];
    if cached != 0 {
        return i32::from(cached) - 1;
    }
    let best = lookup_normal(pixel, palette, ncolors, complexion);
    cachetable[hash] = (best + 1) as u16;
    best
}

/// Maps `pixels` onto `*palette`, writing an index stream.
///
/// `*ncolors` is the palette size on entry; with `optimize_palette` set it
/// becomes the number of *distinct* indices actually used, and `*palette`
/// is truncated to match (first-appearance order). `keycolor` is a palette
/// index to treat as transparent (skip diffusion error from transparent
/// source pixels); `complexion` biases the nearest-color metric toward
/// preserving skin tones. `cachetable` is reused across calls to amortize
/// the "fast" lookup hash table.
///
/// In carry mode, diffusion error accumulates in three Q20.12 fixed-point
/// row buffers (current/next/two-rows-down) instead of mutating the pixel
/// buffer directly; the buffers rotate at the end of each row. Serpentine
/// scan reverses odd rows and mirrors every kernel tap's x offset to match.
///
/// # Adaptation
/// - Derived from `sixel_quant_apply_palette`/`apply_palette_fixed`/
///   `apply_palette_positional` in the `libsixel` C library, unified into
///   one loop since this crate's kernels are all tap tables (the
///   per-input-byte LSO2/LSO3 lookup tables are not reproduced; see
///   `kernel_for`).
#[allow(clippy::too_many_arguments)]
pub fn sixel_quant_apply_palette(
    palette: &mut Vec<u8>,
    pixels: &[u8],
    width: i32,
    height: i32,
    depth: i32,
    ncolors: &mut i32,
    method_for_diffuse: DiffusionMethod,
    keycolor: i32,
    complexion: i32,
    cachetable: &mut Vec<u16>,
    scan_mode: ScanMode,
    carry_mode: CarryMode,
    lut_policy: LutPolicy,
    optimize_palette: bool,
) -> SixelResult<Vec<u8>> {
    if depth != 3 {
        return Err(SixelError::NotImplemented("apply_palette: only 3-channel RGB input is supported"));
    }
    let w = width as usize;
    let h = height as usize;
    let reqcolor = *ncolors;
    let mut work: Vec<u8> = pixels[..w * h * 3].to_vec();
    let mut result = vec![0u8; w * h];

    let serpentine = matches!(scan_mode, ScanMode::Serpentine);
    let use_carry = matches!(carry_mode, CarryMode::Enable) && w > 0;
    let is_positional = matches!(method_for_diffuse, DiffusionMethod::ADither | DiffusionMethod::XDither);
    let control = histogram_control_make(3, lut_policy);
    let mono_kind = if reqcolor == 2 { mono_lookup_kind(palette) } else { None };
    let use_fast = reqcolor > 8;
    let taps = kernel_for(method_for_diffuse);

    let mut carry_curr = vec![0i32; if use_carry { w * 3 } else { 0 }];
    let mut carry_next = vec![0i32; if use_carry { w * 3 } else { 0 }];
    let mut carry_far = vec![0i32; if use_carry { w * 3 } else { 0 }];

    let mut migration_map = vec![0u16; PALETTE_MAX];
    let mut new_palette = vec![0u8; PALETTE_MAX * 3];
    let mut out_ncolors = 0i32;

    for y in 0..h {
        let (start, end, step, direction) = scanline_params(serpentine, y, w);
        let mut x = start;
        while x != end {
            let xu = x as usize;
            let pos = y * w + xu;
            let off = pos * 3;

            let mut px = [work[off], work[off + 1], work[off + 2]];
            let mut accum_scaled = [0i32; 3];

            if is_positional {
                let hasher = if matches!(method_for_diffuse, DiffusionMethod::ADither) { mask_a } else { mask_x };
                for (c, channel) in px.iter_mut().enumerate() {
                    let bias = (hasher(x, y as i32, c as i32) * 32.0) as i32;
                    *channel = (i32::from(*channel) + bias).clamp(0, 255) as u8;
                }
            } else if use_carry {
                for c in 0..3 {
                    let slot = &mut carry_curr[xu * 3 + c];
                    let accum = ((i64::from(px[c])) << VARERR_SCALE_SHIFT) + i64::from(*slot);
                    let accum = accum.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
                    *slot = 0;
                    let clamped = accum.clamp(0, VARERR_MAX_VALUE);
                    accum_scaled[c] = clamped as i32;
                    px[c] = ((clamped + VARERR_ROUND) >> VARERR_SCALE_SHIFT).clamp(0, 255) as u8;
                }
            }

            let color_index = if let Some(kind) = &mono_kind {
                match kind {
                    MonoKind::DarkBg => lookup_mono_darkbg(&px, reqcolor),
                    MonoKind::LightBg => lookup_mono_lightbg(&px, reqcolor),
                }
            } else if use_fast {
                lookup_fast(&px, palette, reqcolor, complexion, cachetable, &control)
            } else {
                lookup_normal(&px, palette, reqcolor, complexion)
            };

            let output_index = if optimize_palette {
                let ci = color_index as usize;
                if migration_map[ci] == 0 {
                    let oi = out_ncolors as usize;
                    new_palette[oi * 3..oi * 3 + 3].copy_from_slice(&palette[ci * 3..ci * 3 + 3]);
                    out_ncolors += 1;
                    migration_map[ci] = out_ncolors as u16;
                    oi as i32
                } else {
                    i32::from(migration_map[ci]) - 1
                }
            } else {
                color_index
            };
            result[pos] = output_index as u8;

            if !is_positional && color_index != keycolor && !taps.is_empty() {
                let chosen = if optimize_palette {
                    let oi = output_index as usize;
                    [new_palette[oi * 3], new_palette[oi * 3 + 1], new_palette[oi * 3 + 2]]
                } else {
                    let ci = color_index as usize;
                    [palette[ci * 3], palette[ci * 3 + 1], palette[ci * 3 + 2]]
                };

                let mut err = [0i32; 3];
                for c in 0..3 {
                    err[c] =
                        if use_carry { accum_scaled[c] - (i32::from(chosen[c]) << VARERR_SCALE_SHIFT) } else { i32::from(px[c]) - i32::from(chosen[c]) };
                }

                for tap in taps {
                    let eff_dx = tap.dx * direction;
                    let tx = x + eff_dx;
                    let ty = y as i32 + tap.dy;
                    if tx < 0 || tx as usize >= w || ty < 0 || ty as usize >= h {
                        continue;
                    }
                    let txu = tx as usize;
                    for c in 0..3 {
                        let term = diffuse_term(err[c], tap.num, tap.den);
                        if use_carry {
                            match tap.dy {
                                0 => carry_curr[txu * 3 + c] += term,
                                1 => carry_next[txu * 3 + c] += term,
                                _ => carry_far[txu * 3 + c] += term,
                            }
                        } else {
                            let noff = (ty as usize * w + txu) * 3 + c;
                            work[noff] = (i32::from(work[noff]) + term).clamp(0, 255) as u8;
                        }
                    }
                }
            }

            x += step;
        }

        if use_carry {
            core::mem::swap(&mut carry_curr, &mut carry_next);
            core::mem::swap(&mut carry_next, &mut carry_far);
            carry_far.iter_mut().for_each(|v| *v = 0);
        }
    }

    if optimize_palette {
        new_palette.truncate((out_ncolors as usize) * 3);
        *palette = new_palette;
        *ncolors = out_ncolors;
    } else {
        *ncolors = reqcolor;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_counts_distinct_colors() {
        let pixels = [0u8, 0, 0, 0, 0, 0, 255, 255, 255];
        let tuples = compute_histogram(&pixels, 3, 1, 3, Quality::Full, LutPolicy::Auto).unwrap();
        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples.iter().find(|t| t.color == [0, 0, 0]).unwrap().value, 2);
    }

    #[test]
    fn histogram_merges_colors_sharing_a_lattice_bucket_without_fragmenting() {
        // Two raw colors one unit apart still land in the same 6-bit bucket
        // ((value + 2) >> 2), so they must merge into a single entry instead
        // of fragmenting into two low-count tuples.
        let pixels = [10u8, 10, 10, 11, 11, 11, 11, 11, 11];
        let tuples = compute_histogram(&pixels, 3, 1, 3, Quality::Full, LutPolicy::Auto).unwrap();
        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0].value, 3);
    }

    #[test]
    fn five_bit_lut_policy_produces_a_coarser_lattice_than_six_bit() {
        let pixels = [10u8, 10, 10, 11, 11, 11];
        let six = compute_histogram(&pixels, 2, 1, 3, Quality::Full, LutPolicy::Six).unwrap();
        let five = compute_histogram(&pixels, 2, 1, 3, Quality::Full, LutPolicy::Five).unwrap();
        assert_eq!(six.len(), 1);
        assert_eq!(five.len(), 1);
        // A forced 5-bit bucket reconstructs a coarser (more rounded) color
        // than the default 6-bit bucket for the same raw samples.
        let control6 = histogram_control_make(3, LutPolicy::Six);
        let control5 = histogram_control_make(3, LutPolicy::Five);
        assert!(control5.channel_shift > control6.channel_shift);
    }

    #[test]
    fn make_palette_keeps_small_images_exact() {
        let pixels = [10u8, 20, 30, 40, 50, 60];
        let (palette, ncolors, origcolors) =
            sixel_quant_make_palette(&pixels, 2, 1, 3, 16, MethodForLargest::Norm, MethodForRep::AveragePixels, Quality::Full, LutPolicy::Auto).unwrap();
        assert_eq!(origcolors, 2);
        assert_eq!(ncolors, 2);
        assert_eq!(palette.len(), 6);
    }

    #[test]
    fn apply_palette_maps_exact_matches_with_zero_error() {
        let mut palette = vec![0u8, 0, 0, 255, 255, 255];
        let pixels = [0u8, 0, 0, 255, 255, 255];
        let mut cache = Vec::new();
        let mut ncolors = 2;
        let idx = sixel_quant_apply_palette(
            &mut palette,
            &pixels,
            2,
            1,
            3,
            &mut ncolors,
            DiffusionMethod::None,
            -1,
            1,
            &mut cache,
            ScanMode::Sequential,
            CarryMode::Disable,
            LutPolicy::Auto,
            false,
        )
        .unwrap();
        assert_eq!(idx, vec![0, 1]);
    }

    #[test]
    fn mono_lookup_only_applies_to_black_white_or_its_inverse() {
        // A 2-color red/blue palette is not black/white, so it must fall
        // through to nearest-color matching rather than luminance threshold.
        let mut palette = vec![255u8, 0, 0, 0, 0, 255];
        let pixels = [10u8, 10, 250, 250, 10, 10];
        let mut cache = Vec::new();
        let mut ncolors = 2;
        let idx = sixel_quant_apply_palette(
            &mut palette,
            &pixels,
            2,
            1,
            3,
            &mut ncolors,
            DiffusionMethod::None,
            -1,
            1,
            &mut cache,
            ScanMode::Sequential,
            CarryMode::Disable,
            LutPolicy::Auto,
            false,
        )
        .unwrap();
        // first pixel (near blue) maps to palette index 1, second (near red) to 0
        assert_eq!(idx, vec![1, 0]);
    }

    #[test]
    fn mono_lightbg_is_reachable_and_inverts_darkbg() {
        let mut palette = vec![255u8, 255, 255, 0, 0, 0];
        let pixels = [0u8, 0, 0, 255, 255, 255];
        let mut cache = Vec::new();
        let mut ncolors = 2;
        let idx = sixel_quant_apply_palette(
            &mut palette,
            &pixels,
            2,
            1,
            3,
            &mut ncolors,
            DiffusionMethod::None,
            -1,
            1,
            &mut cache,
            ScanMode::Sequential,
            CarryMode::Disable,
            LutPolicy::Auto,
            false,
        )
        .unwrap();
        assert_eq!(idx, vec![1, 0]);
    }

    #[test]
    fn optimize_palette_renumbers_to_a_dense_trimmed_palette() {
        let mut palette = vec![10u8, 10, 10, 20, 20, 20, 30, 30, 30, 40, 40, 40];
        // pixels only ever reference palette entries 2 and 0 (in that order)
        let pixels = [30u8, 30, 30, 30, 30, 30, 10, 10, 10];
        let mut cache = Vec::new();
        let mut ncolors = 4;
        let idx = sixel_quant_apply_palette(
            &mut palette,
            &pixels,
            3,
            1,
            3,
            &mut ncolors,
            DiffusionMethod::None,
            -1,
            1,
            &mut cache,
            ScanMode::Sequential,
            CarryMode::Disable,
            LutPolicy::Auto,
            true,
        )
        .unwrap();
        assert_eq!(ncolors, 2);
        assert_eq!(palette.len(), 6);
        assert_eq!(idx, vec![0, 0, 1]);
        assert_eq!(&palette[0..3], &[30, 30, 30]);
        assert_eq!(&palette[3..6], &[10, 10, 10]);
    }

    #[test]
    fn carry_mode_diffuses_error_across_a_row() {
        let mut palette = vec![0u8, 0, 0, 255, 255, 255];
        // a mid-gray row should not collapse to all-black or all-white under
        // Floyd-Steinberg carry diffusion; some pixels must land on each end
        let pixels = vec![128u8; 8 * 3];
        let mut cache = Vec::new();
        let mut ncolors = 2;
        let idx = sixel_quant_apply_palette(
            &mut palette,
            &pixels,
            8,
            1,
            3,
            &mut ncolors,
            DiffusionMethod::Fs,
            -1,
            1,
            &mut cache,
            ScanMode::Sequential,
            CarryMode::Enable,
            LutPolicy::Auto,
            false,
        )
        .unwrap();
        assert!(idx.iter().any(|&i| i == 0));
        assert!(idx.iter().any(|&i| i == 1));
    }

    #[test]
    fn serpentine_scan_mirrors_kernel_offsets_on_odd_rows() {
        let mut palette = vec![0u8, 0, 0, 255, 255, 255];
        let mut cache = Vec::new();
        let mut ncolors = 2;
        // a checkerboard-ish gradient wide enough that sequential vs.
        // serpentine Floyd-Steinberg produce different index streams
        let mut pixels = Vec::new();
        for y in 0..4u8 {
            for x in 0..6u8 {
                let v = ((x as u16 + y as u16 * 3) * 17 % 256) as u8;
                pixels.extend_from_slice(&[v, v, v]);
            }
        }

        let sequential = sixel_quant_apply_palette(
            &mut palette.clone(),
            &pixels,
            6,
            4,
            3,
            &mut ncolors,
            DiffusionMethod::Fs,
            -1,
            1,
            &mut cache,
            ScanMode::Sequential,
            CarryMode::Disable,
            LutPolicy::Auto,
            false,
        )
        .unwrap();

        let mut cache2 = Vec::new();
        let mut ncolors2 = 2;
        let serpentine = sixel_quant_apply_palette(
            &mut palette,
            &pixels,
            6,
            4,
            3,
            &mut ncolors2,
            DiffusionMethod::Fs,
            -1,
            1,
            &mut cache2,
            ScanMode::Serpentine,
            CarryMode::Disable,
            LutPolicy::Auto,
            false,
        )
        .unwrap();

        assert_ne!(sequential, serpentine);
    }

    #[test]
    fn nearest_color_picks_closer_palette_entry() {
        let palette = [0u8, 0, 0, 100, 100, 100, 255, 255, 255];
        let idx = lookup_normal(&[90, 90, 90], &palette, 3, 1);
        assert_eq!(idx, 1);
    }
}
