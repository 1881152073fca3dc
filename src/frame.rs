// sixela::frame
//
// TOC
// - enum ResizeMethod
// - enum Colorspace
// - struct Frame
// - impl Frame

use crate::pixelformat::{normalize_paletted, sixel_helper_normalize_pixelformat, PixelFormat};
use crate::{SixelError, SixelResult};
use alloc::vec;
use devela::Vec;

/// Resampling filter used by [`Frame::resize`].
///
/// # Adaptation
/// - Derived from `method_for_resampling` (`RES_*`) in the `libsixel` C
///   library; only the two most common filters are implemented here, the
///   rest of that enum (Gaussian/Hanning/Hamming/Welsh/bicubic/Lanczos)
///   being out of scope for this crate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeMethod {
    /// Sample the closest source pixel.
    Nearest,
    /// Bilinear interpolation of the four nearest source pixels.
    #[default]
    Bilinear,
}

/// Target encoding for [`Frame::ensure_colorspace`].
///
/// # Adaptation
/// - Derived from the linear/gamma colorspace conversion named in the
///   original `sixel_frame` API; this crate applies the standard sRGB
///   transfer function.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Colorspace {
    /// Gamma-encoded sRGB, the format every other operation expects.
    #[default]
    Srgb,
    /// Linear-light RGB.
    Linear,
}

fn srgb_to_linear(v: u8) -> f64 {
    let c = f64::from(v) / 255.0;
    if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
}

fn linear_to_srgb(c: f64) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let v = if c <= 0.003_130_8 { c * 12.92 } else { 1.055 * c.powf(1.0 / 2.4) - 0.055 };
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// An owned pixel buffer plus the metadata needed to encode or re-decode it.
///
/// One [`Frame`] corresponds to a single still image, or a single frame of
/// an animated SIXEL/GIF-style sequence.
///
/// # Adaptation
/// - Derived from the image-buffer shape shared by `dropbox-dTOOL`'s
///   `sixel::mod` canvas and `mkrueger-icy_sixel`'s `SixelImage`, widened to
///   carry an arbitrary [`PixelFormat`] rather than being RGBA-only.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Packed pixel bytes in `pixelformat`.
    pub pixels: Vec<u8>,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Pixel format `pixels` is packed in.
    pub pixelformat: PixelFormat,
    /// Palette for paletted formats, `ncolors * 3` packed RGB888 bytes.
    pub palette: Vec<u8>,
    /// Display delay in hundredths of a second, for animated sequences.
    pub delay: i32,
    /// Zero-based index of this frame within its containing sequence.
    pub frame_no: i32,
    /// `true` if `pixels` carries a usable alpha/transparency channel.
    pub has_transparency: bool,
    /// Colorspace `pixels` is currently encoded in.
    pub colorspace: Colorspace,
}

impl Frame {
    /// Builds a frame from raw `pixels`, validating the buffer is sized
    /// exactly `width * height * bytes_per_pixel(pixelformat)`.
    pub fn new(pixels: Vec<u8>, width: i32, height: i32, pixelformat: PixelFormat) -> SixelResult<Self> {
        if width < 1 || height < 1 {
            return Err(SixelError::BadArgument);
        }
        let expected = (width as f64) * (height as f64) * f64::from(pixelformat.bytes_per_pixel());
        if (pixels.len() as f64) < expected {
            return Err(SixelError::BadArgument);
        }
        Ok(Self {
            pixels,
            width,
            height,
            pixelformat,
            palette: Vec::new(),
            delay: 0,
            frame_no: 0,
            has_transparency: false,
            colorspace: Colorspace::Srgb,
        })
    }

    /// Returns a new frame with `pixels` re-expressed as packed RGB888,
    /// expanding grayscale/paletted sources.
    ///
    /// Paletted sources are unpacked to index bytes and then mapped through
    /// `self.palette`; grayscale sources are unpacked and rescaled from
    /// their native bit depth up to full 0..255 gray levels. True-color
    /// sources go through [`sixel_helper_normalize_pixelformat`] directly.
    pub fn ensure_rgb888(&self) -> SixelResult<Frame> {
        if matches!(self.pixelformat, PixelFormat::RGB888) {
            return Ok(self.clone());
        }
        let npixels = (self.width * self.height) as usize;

        if self.pixelformat.is_paletted() {
            let mut indices = vec![0u8; npixels * 3];
            sixel_helper_normalize_pixelformat(&mut indices, &self.pixels, self.pixelformat, self.width, self.height)?;
            let mut rgb = vec![0u8; npixels * 3];
            normalize_paletted(&mut rgb, &indices[..npixels], PixelFormat::PAL8, &self.palette, self.width, self.height)?;
            return Ok(self.with_rgb888(rgb));
        }

        if self.pixelformat.is_grayscale() && !matches!(self.pixelformat, PixelFormat::AG88 | PixelFormat::GA88) {
            let bits = match self.pixelformat {
                PixelFormat::G1 => 1,
                PixelFormat::G2 => 2,
                PixelFormat::G4 => 4,
                _ => 8,
            };
            let mut levels = vec![0u8; npixels * 3];
            sixel_helper_normalize_pixelformat(&mut levels, &self.pixels, self.pixelformat, self.width, self.height)?;
            let scale = 255 / ((1u32 << bits) - 1).max(1);
            let mut rgb = vec![0u8; npixels * 3];
            for i in 0..npixels {
                let v = ((levels[i] as u32) * scale).min(255) as u8;
                rgb[i * 3] = v;
                rgb[i * 3 + 1] = v;
                rgb[i * 3 + 2] = v;
            }
            return Ok(self.with_rgb888(rgb));
        }

        let mut rgb = vec![0u8; npixels * 3];
        let format = sixel_helper_normalize_pixelformat(&mut rgb, &self.pixels, self.pixelformat, self.width, self.height)?;
        let _ = format;
        Ok(self.with_rgb888(rgb))
    }

    fn with_rgb888(&self, pixels: Vec<u8>) -> Frame {
        Frame {
            pixels,
            width: self.width,
            height: self.height,
            pixelformat: PixelFormat::RGB888,
            palette: Vec::new(),
            delay: self.delay,
            frame_no: self.frame_no,
            has_transparency: self.has_transparency,
            colorspace: self.colorspace,
        }
    }

    /// Crops to the rectangle `(x, y, w, h)`, clamped to the frame bounds.
    pub fn clip(&self, x: i32, y: i32, w: i32, h: i32) -> SixelResult<Frame> {
        if !matches!(self.pixelformat, PixelFormat::RGB888) {
            return Err(SixelError::NotImplemented("clip: only RGB888 frames are supported"));
        }
        let x = x.clamp(0, self.width);
        let y = y.clamp(0, self.height);
        let w = w.min(self.width - x).max(0);
        let h = h.min(self.height - y).max(0);

        let mut out = vec![0u8; (w * h * 3) as usize];
        for row in 0..h {
            let src_off = (((y + row) * self.width + x) * 3) as usize;
            let dst_off = (row * w * 3) as usize;
            out[dst_off..dst_off + (w * 3) as usize].copy_from_slice(&self.pixels[src_off..src_off + (w * 3) as usize]);
        }
        Ok(Frame {
            pixels: out,
            width: w,
            height: h,
            pixelformat: PixelFormat::RGB888,
            palette: Vec::new(),
            delay: self.delay,
            frame_no: self.frame_no,
            has_transparency: self.has_transparency,
            colorspace: self.colorspace,
        })
    }

    /// Drops the alpha channel from an `RGBA8888`/`ARGB8888` frame,
    /// compositing each pixel over `bgcolor` (packed RGB888) first.
    ///
    /// Frames without an alpha channel pass through
    /// [`sixel_helper_normalize_pixelformat`] unchanged, since there is
    /// nothing to composite.
    pub fn strip_alpha(&self, bgcolor: [u8; 3]) -> SixelResult<Frame> {
        let npixels = (self.width * self.height) as usize;
        let alpha_major = match self.pixelformat {
            PixelFormat::ARGB8888 => Some(true),
            PixelFormat::RGBA8888 | PixelFormat::ABGR8888 | PixelFormat::BGRA8888 => Some(false),
            _ => None,
        };

        let mut rgb = vec![0u8; npixels * 3];
        let format = sixel_helper_normalize_pixelformat(&mut rgb, &self.pixels, self.pixelformat, self.width, self.height)?;

        if let Some(alpha_first) = alpha_major {
            for i in 0..npixels {
                let a = i32::from(if alpha_first { self.pixels[i * 4] } else { self.pixels[i * 4 + 3] });
                for c in 0..3 {
                    let fg = i32::from(rgb[i * 3 + c]);
                    let bg = i32::from(bgcolor[c]);
                    rgb[i * 3 + c] = ((fg * a + bg * (255 - a)) / 255) as u8;
                }
            }
        }

        Ok(Frame {
            pixels: rgb,
            width: self.width,
            height: self.height,
            pixelformat: format,
            palette: Vec::new(),
            delay: self.delay,
            frame_no: self.frame_no,
            has_transparency: false,
            colorspace: self.colorspace,
        })
    }

    /// Resizes to `(w, h)` using `method`, requiring an RGB888 source.
    pub fn resize(&self, w: i32, h: i32, method: ResizeMethod) -> SixelResult<Frame> {
        if !matches!(self.pixelformat, PixelFormat::RGB888) {
            return Err(SixelError::NotImplemented("resize: only RGB888 frames are supported"));
        }
        if w < 1 || h < 1 {
            return Err(SixelError::BadArgument);
        }

        let (sw, sh) = (self.width as f64, self.height as f64);
        let mut out = vec![0u8; (w * h * 3) as usize];

        match method {
            ResizeMethod::Nearest => {
                for dy in 0..h {
                    let sy = ((f64::from(dy) * sh) / f64::from(h)) as i32;
                    let sy = sy.clamp(0, self.height - 1);
                    for dx in 0..w {
                        let sx = ((f64::from(dx) * sw) / f64::from(w)) as i32;
                        let sx = sx.clamp(0, self.width - 1);
                        let src_off = ((sy * self.width + sx) * 3) as usize;
                        let dst_off = ((dy * w + dx) * 3) as usize;
                        out[dst_off..dst_off + 3].copy_from_slice(&self.pixels[src_off..src_off + 3]);
                    }
                }
            }
            ResizeMethod::Bilinear => {
                for dy in 0..h {
                    let fy = ((f64::from(dy) + 0.5) * sh / f64::from(h) - 0.5).clamp(0.0, sh - 1.0);
                    let y0 = fy.floor() as i32;
                    let y1 = (y0 + 1).min(self.height - 1);
                    let ty = fy - f64::from(y0);
                    for dx in 0..w {
                        let fx = ((f64::from(dx) + 0.5) * sw / f64::from(w) - 0.5).clamp(0.0, sw - 1.0);
                        let x0 = fx.floor() as i32;
                        let x1 = (x0 + 1).min(self.width - 1);
                        let tx = fx - f64::from(x0);
                        let dst_off = ((dy * w + dx) * 3) as usize;
                        for c in 0..3 {
                            let p00 = f64::from(self.pixels[((y0 * self.width + x0) * 3) as usize + c]);
                            let p10 = f64::from(self.pixels[((y0 * self.width + x1) * 3) as usize + c]);
                            let p01 = f64::from(self.pixels[((y1 * self.width + x0) * 3) as usize + c]);
                            let p11 = f64::from(self.pixels[((y1 * self.width + x1) * 3) as usize + c]);
                            let top = p00 * (1.0 - tx) + p10 * tx;
                            let bottom = p01 * (1.0 - tx) + p11 * tx;
                            out[dst_off + c] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
                        }
                    }
                }
            }
        }

        Ok(Frame {
            pixels: out,
            width: w,
            height: h,
            pixelformat: PixelFormat::RGB888,
            palette: Vec::new(),
            delay: self.delay,
            frame_no: self.frame_no,
            has_transparency: self.has_transparency,
            colorspace: self.colorspace,
        })
    }

    /// Converts between linear-light and gamma-encoded (sRGB) RGB888,
    /// returning a clone unchanged if already in `target`.
    pub fn ensure_colorspace(&self, target: Colorspace) -> SixelResult<Frame> {
        if !matches!(self.pixelformat, PixelFormat::RGB888) {
            return Err(SixelError::NotImplemented("ensure_colorspace: only RGB888 frames are supported"));
        }
        if self.colorspace == target {
            return Ok(self.clone());
        }

        let mut pixels = self.pixels.clone();
        match target {
            Colorspace::Linear => {
                for v in pixels.iter_mut() {
                    *v = (srgb_to_linear(*v) * 255.0).round().clamp(0.0, 255.0) as u8;
                }
            }
            Colorspace::Srgb => {
                for v in pixels.iter_mut() {
                    *v = linear_to_srgb(f64::from(*v) / 255.0);
                }
            }
        }

        Ok(Frame {
            pixels,
            width: self.width,
            height: self.height,
            pixelformat: self.pixelformat,
            palette: self.palette.clone(),
            delay: self.delay,
            frame_no: self.frame_no,
            has_transparency: self.has_transparency,
            colorspace: target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_undersized_buffers() {
        let pixels = vec![0u8; 2];
        assert!(matches!(Frame::new(pixels, 2, 2, PixelFormat::RGB888), Err(SixelError::BadArgument)));
    }

    #[test]
    fn ensure_rgb888_maps_paletted_frame_through_its_palette() {
        let mut frame = Frame::new(vec![0u8, 1, 1, 0], 4, 1, PixelFormat::PAL8).unwrap();
        frame.palette = vec![10, 20, 30, 40, 50, 60];
        let rgb = frame.ensure_rgb888().unwrap();
        assert_eq!(rgb.pixels, vec![10, 20, 30, 40, 50, 60, 40, 50, 60, 10, 20, 30]);
    }

    #[test]
    fn ensure_rgb888_rescales_g1_to_full_range() {
        let frame = Frame::new(vec![0b1010_0000u8], 4, 1, PixelFormat::G1).unwrap();
        let rgb = frame.ensure_rgb888().unwrap();
        assert_eq!(rgb.pixels, vec![255, 255, 255, 0, 0, 0, 255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn strip_alpha_composites_transparent_pixels_over_bgcolor() {
        let frame = Frame::new(vec![200u8, 50, 50, 255, 255, 255, 255, 0], 2, 1, PixelFormat::RGBA8888).unwrap();
        let rgb = frame.strip_alpha([10, 10, 10]).unwrap();
        assert_eq!(&rgb.pixels[0..3], &[200, 50, 50]);
        assert_eq!(&rgb.pixels[3..6], &[10, 10, 10]);
    }

    #[test]
    fn resize_nearest_to_half_size_samples_even_pixels() {
        let pixels = vec![
            1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4, //
            5, 5, 5, 6, 6, 6, 7, 7, 7, 8, 8, 8, //
        ];
        let frame = Frame::new(pixels, 4, 2, PixelFormat::RGB888).unwrap();
        let resized = frame.resize(2, 1, ResizeMethod::Nearest).unwrap();
        assert_eq!(resized.width, 2);
        assert_eq!(resized.height, 1);
        assert_eq!(resized.pixels.len(), 6);
    }

    #[test]
    fn ensure_colorspace_round_trips_through_linear() {
        let frame = Frame::new(vec![128u8, 128, 128], 1, 1, PixelFormat::RGB888).unwrap();
        let linear = frame.ensure_colorspace(Colorspace::Linear).unwrap();
        assert_eq!(linear.colorspace, Colorspace::Linear);
        let back = linear.ensure_colorspace(Colorspace::Srgb).unwrap();
        assert_eq!(back.colorspace, Colorspace::Srgb);
        assert!((i32::from(back.pixels[0]) - 128).abs() <= 1);
    }

    #[test]
    fn clip_extracts_subrectangle() {
        let pixels = vec![
            1, 1, 1, 2, 2, 2, 3, 3, 3, //
            4, 4, 4, 5, 5, 5, 6, 6, 6, //
        ];
        let frame = Frame::new(pixels, 3, 2, PixelFormat::RGB888).unwrap();
        let clipped = frame.clip(1, 0, 2, 2).unwrap();
        assert_eq!(clipped.width, 2);
        assert_eq!(clipped.pixels, vec![2, 2, 2, 3, 3, 3, 5, 5, 5, 6, 6, 6]);
    }
}
