// sixela::decoder::prescan
//
// TOC
// - struct PrescanBand
// - fn prescan

use super::serial::{parse_params, Cursor};
use super::Palette;
use devela::Vec;

/// One DECGNL-delimited band of a sixel body: the byte range that makes up
/// the band, the pixel row its first scan line starts at, and a snapshot
/// of parser state (palette plus active color register) valid at the
/// start of the range.
///
/// # Adaptation
/// - Derived from the prescan/snapshot contract in `libsixel`'s
///   `decoder-prescan.c`: a forward pass records enough state at each band
///   boundary that later bands can be replayed independently of earlier
///   ones.
#[derive(Debug, Clone)]
pub struct PrescanBand {
    /// `body[start..end]` byte range for this band.
    pub range: (usize, usize),
    /// Pixel row offset (`band_index * 6`) this band's sixel bytes target.
    pub y0: i32,
    /// Palette state (as mutated by `#`-commands seen so far).
    pub palette: Palette,
    /// Active color register carried into this band.
    pub cursor: Cursor,
}

/// Reasons the prescan found that parallel replay would be unsafe, plus the
/// raster-attributed geometry (if any `"` command was seen), used by the
/// parallel decoder's eligibility guard.
///
/// # Adaptation
/// - Derived from spec.md §4.8's "flags mask with reasons parallel decoding
///   must be inhibited": geometry changed mid-stream after any drawing, or
///   a color register index reached 256 or beyond.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrescanFlags {
    /// A `"` (DECGRA) raster-attribute command requested a larger `ph`/`pv`
    /// after pixels had already been drawn.
    pub unsafe_geometry: bool,
    /// A `#` (DECGCI) command addressed color register 256 or higher.
    pub color_index_overflow: bool,
    /// `(ph, pv)` from the last `"` command seen, if any.
    pub attributed_dims: Option<(i32, i32)>,
}

impl PrescanFlags {
    /// `true` if neither inhibiting condition was found.
    #[must_use]
    pub fn is_empty(self) -> bool {
        !self.unsafe_geometry && !self.color_index_overflow
    }
}

/// Scans `body` for DECGNL (`-`) band boundaries without plotting pixels,
/// recording one [`PrescanBand`] per band along with the parser state at
/// its start, plus the [`PrescanFlags`] summary used by the parallel
/// decoder's eligibility guard.
#[must_use]
pub fn prescan(body: &[u8]) -> (Vec<PrescanBand>, PrescanFlags) {
    let mut bands = Vec::new();
    let mut palette = Palette::default();
    let mut cursor = Cursor::default();
    let mut band_start = 0usize;
    let mut y0 = 0i32;
    let mut flags = PrescanFlags::default();
    let mut has_drawn = false;

    let mut i = 0usize;
    while i < body.len() {
        match body[i] {
            b'#' => {
                let (params, consumed) = parse_params(&body[i + 1..]);
                if let Some(&reg) = params.first() {
                    if reg >= 256 {
                        flags.color_index_overflow = true;
                    }
                    cursor.current_color = reg.max(0) as usize;
                    if params.len() >= 5 {
                        let system = params[1];
                        let (a, b, d) = (params[2], params[3], params[4]);
                        if system == 1 {
                            palette.set_hls(reg.max(0) as usize, a, b, d);
                        } else if system == 2 {
                            palette.set_rgb_percent(reg.max(0) as usize, a, b, d);
                        }
                    }
                }
                i += 1 + consumed;
            }
            b'"' => {
                let (params, consumed) = parse_params(&body[i + 1..]);
                if params.len() >= 4 {
                    let (ph, pv) = (params[2], params[3]);
                    if has_drawn {
                        if let Some((prev_ph, prev_pv)) = flags.attributed_dims {
                            if ph > prev_ph || pv > prev_pv {
                                flags.unsafe_geometry = true;
                            }
                        }
                    }
                    flags.attributed_dims = Some((ph, pv));
                }
                i += 1 + consumed;
            }
            b'!' => {
                let (_params, consumed) = parse_params(&body[i + 1..]);
                i += 1 + consumed;
                // skip the repeated sixel byte itself
                if i < body.len() {
                    has_drawn = true;
                    i += 1;
                }
            }
            0x3f..=0x7e => {
                has_drawn = true;
                i += 1;
            }
            b'-' => {
                bands.push(PrescanBand { range: (band_start, i), y0, palette: palette.clone(), cursor });
                band_start = i + 1;
                y0 += 6;
                i += 1;
            }
            _ => i += 1,
        }
    }
    bands.push(PrescanBand { range: (band_start, body.len()), y0, palette: palette.clone(), cursor });
    (bands, flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_two_bands_at_decgnl() {
        let body = b"#0;2;0;0;0??-#1;2;100;0;0??";
        let (bands, flags) = prescan(body);
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].y0, 0);
        assert_eq!(bands[1].y0, 6);
        assert!(flags.is_empty());
    }

    #[test]
    fn single_band_when_no_decgnl() {
        let body = b"#0;2;0;0;0??";
        let (bands, _flags) = prescan(body);
        assert_eq!(bands.len(), 1);
    }

    #[test]
    fn flags_color_index_overflow_at_256() {
        let body = b"#256;2;0;0;0?";
        let (_bands, flags) = prescan(body);
        assert!(flags.color_index_overflow);
    }

    #[test]
    fn flags_unsafe_geometry_when_ph_grows_after_drawing() {
        let body = b"\"1;1;4;4?\"1;1;8;8?";
        let (_bands, flags) = prescan(body);
        assert!(flags.unsafe_geometry);
    }

    #[test]
    fn no_unsafe_geometry_when_raster_attrs_precede_all_drawing() {
        let body = b"\"1;1;8;8????";
        let (_bands, flags) = prescan(body);
        assert!(!flags.unsafe_geometry);
        assert_eq!(flags.attributed_dims, Some((8, 8)));
    }
}
