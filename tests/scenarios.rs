// Black-box encode/decode scenarios, grounded on spec.md's "concrete
// scenarios" list (encode a small known image, decode a hand-written
// SIXEL stream, compare parallel decode against serial across thread
// counts).

use sixela::{sixel_decode_parallel, sixel_decode_serial, DiffusionMethod, DitherConf, ScanMode, SixelOutput};
use std::collections::HashSet;

#[test]
fn four_pixel_image_quantizes_to_four_exact_colors() {
    let pixels = [255u8, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
    let mut dither = DitherConf::new(4);
    dither.set_diffusion_type(DiffusionMethod::None);

    let indices = dither.apply_palette(&pixels, 4, 1).unwrap();
    assert_eq!(dither.ncolors, 4);

    let mut colors: Vec<[u8; 3]> = (0..dither.ncolors as usize)
        .map(|i| [dither.palette[i * 3], dither.palette[i * 3 + 1], dither.palette[i * 3 + 2]])
        .collect();
    colors.sort_unstable();
    let mut expected = vec![[255, 0, 0], [0, 255, 0], [0, 0, 255], [255, 255, 255]];
    expected.sort_unstable();
    assert_eq!(colors, expected);

    let distinct: HashSet<u8> = indices.iter().copied().collect();
    assert_eq!(distinct.len(), 4, "each of the four pixels must land on a distinct palette entry");
}

#[test]
fn serpentine_scan_with_fs_diffusion_still_decodes_to_a_valid_image() {
    // diffusion FS, scan SERPENTINE: a wide gradient strip should still
    // round-trip through encode/decode with every pixel landing on one of
    // the two quantized colors, and produce a different index stream than
    // sequential scanning would (serpentine mirrors kernel taps on odd rows).
    let width = 16;
    let height = 4;
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let v = (((x + y * 7) * 17) % 256) as u8;
            let off = ((y * width + x) * 3) as usize;
            pixels[off] = v;
            pixels[off + 1] = v;
            pixels[off + 2] = v;
        }
    }

    let mut dither = DitherConf::new(2).with_diffusion_type(DiffusionMethod::Fs).with_scan_mode(ScanMode::Serpentine);
    let indices = dither.apply_palette(&pixels, width, height).unwrap();
    assert_eq!(indices.len(), (width * height) as usize);
    assert!(indices.iter().all(|&i| i < dither.ncolors as u8));

    let mut sequential = DitherConf::new(2).with_diffusion_type(DiffusionMethod::Fs);
    let seq_indices = sequential.apply_palette(&pixels, width, height).unwrap();
    assert_ne!(indices, seq_indices, "serpentine scan must mirror kernel taps on odd rows, changing the result");
}

#[test]
fn all_black_image_round_trips_to_all_zero_indices() {
    let mut pixels = vec![0u8; 8 * 6 * 3];
    let mut dither = DitherConf::new(2);

    let mut output = SixelOutput::new(Vec::<u8>::new());
    output.encode(&mut pixels, 8, 6, 3, &mut dither).unwrap();
    assert_eq!(dither.ncolors, 1, "a uniform image optimizes down to a single palette entry");

    let stream = output.fn_write;
    let surface = sixel_decode_serial(&stream).unwrap();
    assert_eq!(surface.width, 8);
    assert_eq!(surface.height, 6);
    assert!(surface.indices.iter().all(|&i| i == 0));
    assert!(surface.to_rgb888().iter().all(|&c| c == 0));
}

#[test]
fn two_color_stream_decodes_top_band_red_bottom_band_green() {
    let data = b"\x1bP0;0;0q\"1;1;4;2#0;2;100;0;0#1;2;0;100;0#0!4~-#1!4~\x1b\\";
    let surface = sixel_decode_serial(data).unwrap();

    assert_eq!(surface.width, 4);
    assert!(surface.height >= 12, "two six-row bands were drawn, widening past the declared pv=2 hint");

    for y in 0..6 {
        for x in 0..4 {
            assert_eq!(surface.indices[y * surface.width as usize + x], 0);
        }
    }
    for y in 6..12 {
        for x in 0..4 {
            assert_eq!(surface.indices[y * surface.width as usize + x], 1);
        }
    }

    let rgb = surface.to_rgb888();
    let stride = surface.width as usize * 3;
    assert_eq!(&rgb[0..3], &[255, 0, 0]);
    assert_eq!(&rgb[6 * stride..6 * stride + 3], &[0, 255, 0]);
}

/// Builds a synthetic multi-band stream: `bands` six-row bands, each
/// `width` pixels wide, alternating between two color registers.
fn build_banded_stream(bands: usize, width: usize) -> Vec<u8> {
    let height = bands * 6;
    let mut body = String::new();
    body.push_str(&format!("\"1;1;{width};{height}"));
    body.push_str("#0;2;100;0;0#1;2;0;100;0");
    for b in 0..bands {
        body.push_str(&format!("#{}", b % 2));
        for _ in 0..3 {
            body.push_str(&"~".repeat(width));
            body.push('$');
        }
        if b + 1 < bands {
            body.push('-');
        }
    }
    let mut data = Vec::new();
    data.extend_from_slice(b"\x1bP0;0;0q");
    data.extend_from_slice(body.as_bytes());
    data.extend_from_slice(b"\x1b\\");
    data
}

#[test]
fn parallel_decode_matches_serial_across_thread_counts() {
    let data = build_banded_stream(64, 200);
    let baseline = sixel_decode_serial(&data).unwrap();

    for threads in [Some(1), Some(4), None] {
        let surface = sixel_decode_parallel(&data, threads).unwrap();
        assert_eq!(surface.width, baseline.width);
        assert_eq!(surface.height, baseline.height);
        assert_eq!(surface.indices, baseline.indices);
        assert_eq!(surface.palette, baseline.palette);
    }
}

#[test]
fn unsafe_geometry_forces_parallel_fallback_but_stays_correct() {
    // a second `"` raster attribute growing ph/pv after drawing has
    // started trips PrescanFlags::unsafe_geometry; the parallel decoder
    // must still decode correctly by falling back to the serial path.
    let data = b"\x1bP0;0;0q\"1;1;2;2#0;2;100;0;0?-\"1;1;4;4#1;2;0;100;0??\x1b\\";
    let serial = sixel_decode_serial(data).unwrap();
    let parallel = sixel_decode_parallel(data, Some(4)).unwrap();
    assert_eq!(parallel.indices, serial.indices);
    assert_eq!(parallel.width, serial.width);
    assert_eq!(parallel.height, serial.height);
}
