// sixela::bin::img2sixel
//
// A thin CLI driver over the `sixela` library: loads an image (PNM or an
// already-sixel stream), quantizes/dithers it, and writes SIXEL to stdout
// or decodes a SIXEL stream back to PNM.
//
// # Adaptation
// - Derived from `img2sixel`'s flag surface in the `libsixel` C library,
//   reimplemented with `clap::Parser` (as `bczhc-wplace-tools` and
//   `master-g-dvine-rs` do for their own CLIs) instead of hand-rolled
//   `getopt` parsing.

use clap::Parser;
use sixela::{
    for_each_frame, load_frames, Chunk, DiffusionMethod, DitherConf, EncodePolicy, LoopPolicy, MethodForLargest, MethodForRep, PaletteType,
    PixelFormat, Quality, SixelOutput, SixelResult,
};
use std::io::Write;
use std::sync::atomic::AtomicBool;

/// Converts images to and from DEC SIXEL terminal graphics.
#[derive(Debug, Parser)]
#[command(name = "img2sixel", version, about)]
struct Cli {
    /// Input file path; reads stdin when omitted.
    input: Option<String>,

    /// Number of colors to quantize to.
    #[arg(short = 'p', long, default_value_t = 256)]
    colors: i32,

    /// Axis-selection strategy for median-cut box splitting.
    #[arg(long, value_enum, default_value_t = LargestArg::Auto)]
    method_for_largest: LargestArg,

    /// Representative-color strategy for median-cut box collapsing.
    #[arg(long, value_enum, default_value_t = RepArg::Auto)]
    method_for_rep: RepArg,

    /// Error-diffusion kernel.
    #[arg(short = 'd', long, value_enum, default_value_t = DiffuseArg::Auto)]
    diffusion: DiffuseArg,

    /// Quantization quality/sampling trade-off.
    #[arg(long, value_enum, default_value_t = QualityArg::Auto)]
    quality: QualityArg,

    /// Run-length encoding policy.
    #[arg(long, value_enum, default_value_t = PolicyArg::Auto)]
    encode_policy: PolicyArg,

    /// Decode the input as SIXEL and write binary PNM instead of encoding.
    #[arg(long)]
    decode: bool,

    /// Worker-thread count for parallel decode; 1 disables parallelism.
    #[arg(long)]
    threads: Option<usize>,

    /// Transparent palette index, or omit to disable transparency.
    #[arg(long)]
    keycolor: Option<i32>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LargestArg {
    Auto,
    Norm,
    Lum,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum RepArg {
    Auto,
    CenterBox,
    AverageColors,
    AveragePixels,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum DiffuseArg {
    Auto,
    None,
    Fs,
    Atkinson,
    JaJuNi,
    Stucki,
    Burkes,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum QualityArg {
    Auto,
    Low,
    High,
    Full,
    HighColor,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PolicyArg {
    Auto,
    Size,
    Fast,
}

fn main() -> SixelResult<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cancel = AtomicBool::new(false);

    let chunk = match &cli.input {
        Some(path) => Chunk::from_path(path, &cancel)?,
        None => Chunk::from_stdin(&cancel)?,
    };

    if cli.decode {
        return run_decode(&cli, &chunk);
    }
    run_encode(&cli, &chunk)
}

fn run_decode(cli: &Cli, chunk: &Chunk) -> SixelResult<()> {
    let frames = load_frames(chunk, cli.threads, LoopPolicy::Auto)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for_each_frame(frames, |frame| {
        let _ = write!(out, "P6\n{} {}\n255\n", frame.width, frame.height);
        let _ = out.write_all(&frame.pixels);
        Ok(())
    })
}

fn run_encode(cli: &Cli, chunk: &Chunk) -> SixelResult<()> {
    let bytes = chunk.bytes();
    if !bytes.starts_with(b"P6") {
        return Err(sixela::SixelError::NotImplemented("img2sixel: only binary PNM (P6) input is supported for encoding"));
    }

    let text_prefix_len = bytes.iter().position(|&b| b == b'\n').map(|p| p + 1).unwrap_or(2);
    let header = core::str::from_utf8(&bytes[..bytes.len().min(64)]).unwrap_or_default();
    let mut tokens = header.split_whitespace();
    tokens.next();
    let width: i32 = tokens.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let height: i32 = tokens.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let _ = text_prefix_len;

    let mut header_bytes = 0usize;
    let mut seen = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b.is_ascii_whitespace() {
            seen += 1;
            if seen == 4 {
                header_bytes = i + 1;
                break;
            }
        }
    }
    let mut pixels = bytes[header_bytes..].to_vec();

    let mut dither = DitherConf::new(cli.colors)
        .with_pixelformat(PixelFormat::RGB888)
        .with_method_for_largest(match cli.method_for_largest {
            LargestArg::Auto => MethodForLargest::Auto,
            LargestArg::Norm => MethodForLargest::Norm,
            LargestArg::Lum => MethodForLargest::Lum,
        })
        .with_method_for_rep(match cli.method_for_rep {
            RepArg::Auto => MethodForRep::Auto,
            RepArg::CenterBox => MethodForRep::CenterBox,
            RepArg::AverageColors => MethodForRep::AverageColors,
            RepArg::AveragePixels => MethodForRep::AveragePixels,
        })
        .with_diffusion_type(match cli.diffusion {
            DiffuseArg::Auto => DiffusionMethod::Auto,
            DiffuseArg::None => DiffusionMethod::None,
            DiffuseArg::Fs => DiffusionMethod::Fs,
            DiffuseArg::Atkinson => DiffusionMethod::Atkinson,
            DiffuseArg::JaJuNi => DiffusionMethod::JaJuNi,
            DiffuseArg::Stucki => DiffusionMethod::Stucki,
            DiffuseArg::Burkes => DiffusionMethod::Burkes,
        })
        .with_quality_mode(match cli.quality {
            QualityArg::Auto => Quality::Auto,
            QualityArg::Low => Quality::Low,
            QualityArg::High => Quality::High,
            QualityArg::Full => Quality::Full,
            QualityArg::HighColor => Quality::HighColor,
        })
        .with_keycolor(cli.keycolor.unwrap_or(-1));

    let stdout = std::io::stdout();
    let mut output = SixelOutput::new(stdout.lock()).with_palette_type(PaletteType::Auto).with_encode_policy(match cli.encode_policy {
        PolicyArg::Auto => EncodePolicy::Auto,
        PolicyArg::Size => EncodePolicy::Size,
        PolicyArg::Fast => EncodePolicy::Fast,
    });

    output.encode(&mut pixels, width, height, 3, &mut dither)
}
