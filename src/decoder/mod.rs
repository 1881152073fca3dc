// sixela::decoder
//
// TOC
// - struct Palette
// - struct Surface
// - fn hls_to_rgb
// - mod prescan / serial / parallel

use alloc::vec;
use devela::Vec;

mod parallel;
mod prescan;
mod serial;

pub use parallel::sixel_decode_parallel;
pub use prescan::{prescan, PrescanBand, PrescanFlags};
pub use serial::sixel_decode_serial;

/// Parses the `P1;P2;P3` parameter list between a DCS introducer and its
/// terminating `q`, returning an empty list if `data` does not start with a
/// recognized DCS introducer.
///
/// # Adaptation
/// - Derived from the `q`-transition parameter read in spec.md's decoder
///   state machine: `P1` selects the pixel aspect ratio via
///   [`aspect_ratio_for`], `P2 == 1` requests "don't fill" background
///   disposition.
pub(crate) fn dcs_intro_params(data: &[u8]) -> Vec<i32> {
    let start = if data.starts_with(b"\x1bP") {
        2
    } else if data.first() == Some(&0x90) {
        1
    } else {
        return Vec::new();
    };
    let (params, _) = serial::parse_params(&data[start..]);
    params
}

/// VT340-style default 16-color startup palette, matching the values the
/// original hardware's ROM table used before any DECGCI redefinition.
///
/// # Adaptation
/// - Derived from the `DEFAULT_PALETTE` table in
///   `mkrueger-icy_sixel::decoder`.
pub(crate) const DEFAULT_PALETTE: [[u8; 3]; 16] = [
    [0, 0, 0],
    [51, 51, 204],
    [204, 33, 33],
    [51, 204, 51],
    [204, 51, 204],
    [51, 204, 204],
    [204, 204, 51],
    [135, 135, 135],
    [66, 66, 66],
    [84, 84, 255],
    [255, 84, 84],
    [84, 255, 84],
    [255, 84, 255],
    [84, 255, 255],
    [255, 255, 84],
    [255, 255, 255],
];

/// A mutable 256-entry RGB palette, addressable by DECGCI color-register
/// index.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Default for Palette {
    fn default() -> Self {
        let mut colors = vec![[0u8, 0, 0]; 256];
        colors[..16].copy_from_slice(&DEFAULT_PALETTE);
        Self { colors }
    }
}

impl Palette {
    /// Sets color register `n` from DECGCI percentage-scale RGB (0-100).
    pub fn set_rgb_percent(&mut self, n: usize, r: i32, g: i32, b: i32) {
        if n < self.colors.len() {
            self.colors[n] = [scale_percent(r), scale_percent(g), scale_percent(b)];
        }
    }

    /// Sets color register `n` from a DECGCI HLS triplet (hue 0-360,
    /// lum/sat 0-100). DEC's hue origin sits 240° from the standard HLS
    /// wheel's red point, so the hue is rotated before conversion.
    pub fn set_hls(&mut self, n: usize, h: i32, l: i32, s: i32) {
        if n < self.colors.len() {
            self.colors[n] = hls_to_rgb(h + 240, l, s);
        }
    }

    /// Returns the RGB triplet for color register `n`.
    #[must_use]
    pub fn get(&self, n: usize) -> [u8; 3] {
        self.colors.get(n).copied().unwrap_or([0, 0, 0])
    }

    /// Returns the full palette as packed RGB888 bytes, `n * 3` long.
    #[must_use]
    pub fn packed(&self, n: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(n * 3);
        for c in self.colors.iter().take(n) {
            out.extend_from_slice(c);
        }
        out
    }
}

fn scale_percent(v: i32) -> u8 {
    ((v.clamp(0, 100) * 255 + 50) / 100) as u8
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

/// Converts DEC HLS (hue 0-360, lightness/saturation 0-100) to RGB888.
///
/// # Adaptation
/// - Derived from `hls_to_rgb`/`hue_to_rgb` in `mkrueger-icy_sixel::decoder`.
pub(crate) fn hls_to_rgb(h: i32, l: i32, s: i32) -> [u8; 3] {
    let h = (h.rem_euclid(360)) as f64 / 360.0;
    let l = f64::from(l.clamp(0, 100)) / 100.0;
    let s = f64::from(s.clamp(0, 100)) / 100.0;

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return [v, v, v];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);
    [(r * 255.0).round() as u8, (g * 255.0).round() as u8, (b * 255.0).round() as u8]
}

/// The DEC pixel-aspect-ratio code from a raster-attributes command,
/// expressed as `(pixels_per_ratio_unit)`.
///
/// # Adaptation
/// - Derived from the aspect-ratio lookup table in
///   `mkrueger-icy_sixel::decoder`.
#[must_use]
pub(crate) fn aspect_ratio_for(pad: i32) -> i32 {
    match pad {
        0 | 1 => 2,
        2 => 5,
        3 | 4 => 4,
        5 | 6 => 3,
        7 | 8 => 2,
        9 => 1,
        _ => 1,
    }
}

/// A decoded indexed-color surface: one palette index per pixel plus the
/// palette it indexes into.
#[derive(Debug, Clone)]
pub struct Surface {
    /// Palette index per pixel, row-major.
    pub indices: Vec<u8>,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Color registers actually referenced, packed RGB888.
    pub palette: Vec<u8>,
    /// Number of colors in `palette`.
    pub ncolors: i32,
    /// Pixel aspect ratio numerator from the DCS intro's `P1`, looked up
    /// through [`aspect_ratio_for`]. The denominator is always 1.
    pub aspect_ratio: i32,
    /// `false` if the DCS intro's `P2` requested "don't fill" (value `1`):
    /// unset pixels should be left transparent rather than painted with
    /// color register 0.
    pub fill_background: bool,
}

impl Surface {
    /// Expands this indexed surface into packed RGB888 bytes.
    #[must_use]
    pub fn to_rgb888(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.indices.len() * 3);
        for &idx in &self.indices {
            let off = idx as usize * 3;
            if off + 3 <= self.palette.len() {
                out.extend_from_slice(&self.palette[off..off + 3]);
            } else {
                out.extend_from_slice(&[0, 0, 0]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_matches_vt340_black_and_white() {
        let p = Palette::default();
        assert_eq!(p.get(0), [0, 0, 0]);
        assert_eq!(p.get(15), [255, 255, 255]);
    }

    #[test]
    fn hls_black_and_white_round_trip() {
        assert_eq!(hls_to_rgb(0, 0, 0), [0, 0, 0]);
        assert_eq!(hls_to_rgb(0, 100, 0), [255, 255, 255]);
    }

    #[test]
    fn palette_set_hls_applies_dec_hue_offset() {
        let mut p = Palette::default();
        p.set_hls(2, 0, 50, 100);
        assert_eq!(p.get(2), hls_to_rgb(240, 50, 100));
    }

    #[test]
    fn dcs_intro_params_reads_p1_p2_before_q() {
        assert_eq!(dcs_intro_params(b"\x1bP7;1;0q..."), vec![7, 1, 0]);
        assert_eq!(dcs_intro_params(b"not a dcs stream"), Vec::<i32>::new());
    }

    #[test]
    fn aspect_ratio_table_matches_spec_values() {
        assert_eq!(aspect_ratio_for(0), 2);
        assert_eq!(aspect_ratio_for(2), 5);
        assert_eq!(aspect_ratio_for(9), 1);
    }
}
