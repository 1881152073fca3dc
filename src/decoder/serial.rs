// sixela::decoder::serial
//
// TOC
// - struct Canvas
// - struct Cursor
// - fn run_sixel_body
// - fn sixel_decode_serial

use super::{aspect_ratio_for, dcs_intro_params, Palette, Surface};
use crate::{SixelError, SixelResult};
use alloc::vec;
use devela::Vec;

/// Growable row-major indexed canvas: rows are added on demand as the
/// decoder advances past band boundaries, columns are widened on demand as
/// sixel bytes are plotted past the current row length.
///
/// # Adaptation
/// - Derived from the growable RGBA `Canvas` in
///   `mkrueger-icy_sixel::decoder`, narrowed to store one palette index per
///   pixel instead of expanded RGBA (kept until the caller asks for
///   [`Surface::to_rgb888`]).
#[derive(Debug, Default)]
pub(crate) struct Canvas {
    rows: Vec<Vec<u8>>,
    max_x: i32,
}

impl Canvas {
    fn ensure_row(&mut self, y: i32) {
        let y = y as usize;
        if self.rows.len() <= y {
            self.rows.resize_with(y + 1, Vec::new);
        }
    }

    fn plot(&mut self, x: i32, y: i32, color: u8) {
        self.ensure_row(y);
        let row = &mut self.rows[y as usize];
        if (row.len() as i32) <= x {
            row.resize((x + 1) as usize, 0);
        }
        row[x as usize] = color;
        self.max_x = self.max_x.max(x + 1);
    }

    fn into_indices(self, target_width: Option<i32>, target_height: Option<i32>) -> (Vec<u8>, i32, i32) {
        let width = target_width.unwrap_or(self.max_x).max(self.max_x).max(1);
        let height = target_height.unwrap_or(self.rows.len() as i32).max(self.rows.len() as i32).max(1);
        let mut out = vec![0u8; (width * height) as usize];
        for (y, row) in self.rows.into_iter().enumerate() {
            if y as i32 >= height {
                break;
            }
            let n = row.len().min(width as usize);
            out[y * width as usize..y * width as usize + n].copy_from_slice(&row[..n]);
        }
        (out, width, height)
    }

    /// Consumes the canvas, returning its raw rows and the widest column
    /// touched. Used by the parallel decoder to merge per-band canvases.
    pub(crate) fn into_rows(self) -> (Vec<Vec<u8>>, i32) {
        (self.rows, self.max_x)
    }
}

/// Parser position within the sixel body: pen coordinates and the active
/// color register.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cursor {
    pub pos_x: i32,
    pub pos_y: i32,
    pub current_color: usize,
}

/// Executes DECSIXEL body tokens (`?`-`~` sixel bytes, `!`/`#`/`"`/`$`/`-`)
/// against `canvas`/`palette`, starting from and updating `cursor` in
/// place. Does not consume the DCS envelope or the final `q` introducer;
/// the caller hands it only the body bytes.
///
/// # Adaptation
/// - Derived from the token-dispatch loop in
///   `mkrueger-icy_sixel::decoder::SixelDecoder::process`, split out so the
///   same routine can replay a single prescanned band (parallel decode) or
///   the whole stream (serial decode).
pub(crate) fn run_sixel_body(data: &[u8], canvas: &mut Canvas, palette: &mut Palette, cursor: &mut Cursor, band_y0: i32) -> SixelResult<Option<(i32, i32)>> {
    let mut i = 0;
    let mut target: Option<(i32, i32)> = None;

    while i < data.len() {
        let c = data[i];
        match c {
            b'"' => {
                // DECGRA: "Pan;Pad;Ph;Pv
                let (params, consumed) = parse_params(&data[i + 1..]);
                i += 1 + consumed;
                if params.len() >= 2 {
                    let _pan = params[0];
                    let _pad = params[1];
                }
                if params.len() >= 4 {
                    target = Some((params[2], params[3]));
                }
                continue;
            }
            b'#' => {
                // DECGCI: #Pc;Pu;Px;Py;Pz
                let (params, consumed) = parse_params(&data[i + 1..]);
                i += 1 + consumed;
                if let Some(&reg) = params.first() {
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
                continue;
            }
            b'!' => {
                // DECGRI: !Pn Ch
                let (params, consumed) = parse_params(&data[i + 1..]);
                i += 1 + consumed;
                let repeat = params.first().copied().unwrap_or(1).max(1);
                if i < data.len() {
                    let sixel_byte = data[i];
                    i += 1;
                    for _ in 0..repeat {
                        plot_sixel_byte(canvas, cursor, band_y0, sixel_byte);
                        cursor.pos_x += 1;
                    }
                }
                continue;
            }
            b'$' => {
                cursor.pos_x = 0;
                i += 1;
                continue;
            }
            b'-' => {
                cursor.pos_x = 0;
                cursor.pos_y += 6;
                i += 1;
                continue;
            }
            0x3f..=0x7e => {
                plot_sixel_byte(canvas, cursor, band_y0, c);
                cursor.pos_x += 1;
                i += 1;
                continue;
            }
            _ => {
                i += 1;
                continue;
            }
        }
    }

    Ok(target)
}

fn plot_sixel_byte(canvas: &mut Canvas, cursor: &Cursor, band_y0: i32, byte: u8) {
    let bits = byte.wrapping_sub(b'?');
    for k in 0..6 {
        if bits & (1 << k) != 0 {
            canvas.plot(cursor.pos_x, band_y0 + cursor.pos_y + k, cursor.current_color as u8);
        }
    }
}

/// Parses a `;`-separated run of decimal integers starting at `data[0]`,
/// stopping at the first byte that is not a digit or separator. Returns
/// the parsed values and the number of bytes consumed.
pub(crate) fn parse_params(data: &[u8]) -> (Vec<i32>, usize) {
    let mut params = Vec::new();
    let mut cur: i32 = 0;
    let mut has_digits = false;
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'0'..=b'9' => {
                cur = cur * 10 + i32::from(data[i] - b'0');
                has_digits = true;
            }
            b';' => {
                params.push(cur);
                cur = 0;
                has_digits = false;
            }
            _ => break,
        }
        i += 1;
    }
    if has_digits || !params.is_empty() {
        params.push(cur);
    }
    (params, i)
}

/// Finds the DECSIXEL body inside a DCS-enveloped byte stream: the bytes
/// between the terminating `q` of the DCS header and the closing
/// `ESC \` / `0x9c`.
pub(crate) fn find_body(data: &[u8]) -> SixelResult<&[u8]> {
    let start = if data.starts_with(b"\x1bP") {
        2
    } else if data.first() == Some(&0x90) {
        1
    } else {
        return Err(SixelError::BadInput);
    };
    let q_pos = data[start..].iter().position(|&b| b == b'q').ok_or(SixelError::BadInput)?;
    let body_start = start + q_pos + 1;
    let end = data[body_start..]
        .windows(2)
        .position(|w| w == [0x1b, b'\\'])
        .map(|p| body_start + p)
        .or_else(|| data[body_start..].iter().position(|&b| b == 0x9c).map(|p| body_start + p))
        .unwrap_or(data.len());
    Ok(&data[body_start..end])
}

/// Decodes a full DCS-enveloped SIXEL byte stream into an indexed
/// [`Surface`], single-threaded.
///
/// # Adaptation
/// - Derived from `mkrueger-icy_sixel::decoder::sixel_decode`, restructured
///   around [`run_sixel_body`] so serial and per-band parallel decode share
///   one token-dispatch routine.
pub fn sixel_decode_serial(data: &[u8]) -> SixelResult<Surface> {
    let body = find_body(data)?;
    let mut canvas = Canvas::default();
    let mut palette = Palette::default();
    let mut cursor = Cursor::default();

    let target = run_sixel_body(body, &mut canvas, &mut palette, &mut cursor, 0)?;

    let intro = dcs_intro_params(data);
    let aspect_ratio = aspect_ratio_for(intro.first().copied().unwrap_or(0));
    let fill_background = intro.get(1).copied().unwrap_or(0) != 1;

    let max_index_used = {
        let mut max = 0usize;
        for row in &canvas.rows {
            for &v in row {
                max = max.max(v as usize);
            }
        }
        max
    };
    let ncolors = max_index_used + 1;

    let (indices, width, height) = canvas.into_indices(target.map(|t| t.0), target.map(|t| t.1));
    let packed_palette = palette.packed(ncolors);

    Ok(Surface { indices, width, height, palette: packed_palette, ncolors: ncolors as i32, aspect_ratio, fill_background })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_single_pixel_sixel() {
        // one band, color 0 set, raster attrs 1:1, 1x1
        let data = b"\x1bP0;0;0q\"1;1;1;1#0;2;0;0;0?\x1b\\";
        let surface = sixel_decode_serial(data).unwrap();
        assert_eq!(surface.width, 1);
        assert_eq!(surface.height, 1);
    }

    #[test]
    fn repeat_introducer_replicates_pixel_column() {
        let data = b"\x1bPq#0;2;100;0;0!3~\x1b\\";
        let surface = sixel_decode_serial(data).unwrap();
        assert_eq!(surface.width, 3);
        assert!(surface.indices.iter().all(|&i| i == 0));
    }

    #[test]
    fn rejects_non_dcs_input() {
        let data = b"not a sixel stream";
        assert!(matches!(sixel_decode_serial(data), Err(SixelError::BadInput)));
    }
}
