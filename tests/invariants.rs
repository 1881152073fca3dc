// Black-box tests for the universal invariants listed in spec.md's
// "TESTABLE PROPERTIES" section, beyond the concrete scenarios covered
// in tests/scenarios.rs.

use sixela::{DitherConf, Quality, SixelError, ThreadPool};

fn gradient_pixels(width: i32, height: i32) -> Vec<u8> {
    let mut out = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            out.push(((x * 16) % 256) as u8);
            out.push(((y * 20) % 256) as u8);
            out.push(128);
        }
    }
    out
}

#[test]
fn quantizer_never_exceeds_requested_color_count() {
    let pixels = gradient_pixels(16, 12);
    for reqcolors in [2, 4, 16, 64, 256] {
        let mut dither = DitherConf::new(reqcolors);
        dither.set_quality_mode(Quality::Full);
        dither.initialize(&pixels, 16, 12).unwrap();
        assert!(dither.ncolors <= reqcolors, "reqcolors={reqcolors} produced ncolors={}", dither.ncolors);
        assert!(dither.ncolors >= 1);
    }
}

#[test]
fn reconstructed_palette_channels_stay_in_byte_range_and_keep_pure_extremes() {
    let pixels = gradient_pixels(16, 12);
    let mut dither = DitherConf::new(16);
    dither.initialize(&pixels, 16, 12).unwrap();
    assert_eq!(dither.palette.len(), dither.ncolors as usize * 3);
    // every channel is a valid byte by construction (Vec<u8>), so the
    // property under test is that a pixel already at a pure extreme
    // reconstructs losslessly through the quantizer+apply_palette pipeline.
    let pure = [0u8, 0, 0, 255, 255, 255];
    let mut solid = DitherConf::new(2);
    let indices = solid.apply_palette(&pure, 2, 1).unwrap();
    let mut seen_black = false;
    let mut seen_white = false;
    for (i, &idx) in indices.iter().enumerate() {
        let c = &solid.palette[idx as usize * 3..idx as usize * 3 + 3];
        if i == 0 {
            assert_eq!(c, &[0, 0, 0]);
            seen_black = true;
        } else {
            assert_eq!(c, &[255, 255, 255]);
            seen_white = true;
        }
    }
    assert!(seen_black && seen_white);
}

#[test]
fn thread_pool_latches_first_error_and_drains_all_jobs() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let completed = Arc::new(AtomicUsize::new(0));
    let pool = ThreadPool::new(4, 8);
    for i in 0..8 {
        let completed = Arc::clone(&completed);
        pool.submit(move || {
            completed.fetch_add(1, Ordering::SeqCst);
            if i == 3 {
                Err(SixelError::BadInput)
            } else {
                Ok(())
            }
        });
    }
    let err = pool.join();
    assert_eq!(completed.load(Ordering::SeqCst), 8, "every submitted job must run to completion");
    assert!(matches!(err, Some(SixelError::BadInput)));
}

#[test]
fn thread_pool_reports_no_error_when_all_jobs_succeed() {
    let pool = ThreadPool::new(2, 4);
    for _ in 0..4 {
        pool.submit(|| Ok(()));
    }
    assert!(pool.join().is_none());
}
