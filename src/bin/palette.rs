use anyhow::{Context, Result};
use clap::Parser;
use image_to_palette_wasm::{
    AlgorithmId, ColorFormat, ExtractOptions, PreprocessOptions, extract_palette_bytes, format_color, from_hex,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Extract color palettes from images using the Rust WASM library (native wrapper).
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Extraction algorithm: dominant-swatch, average, kmeans, weighted-kmeans,
    /// median-cut, octree, perceptual or combined
    #[arg(short, long, default_value_t = AlgorithmId::Perceptual)]
    algorithm: AlgorithmId,

    /// Number of colors in the palette
    #[arg(short = 'k', long, default_value_t = 6)]
    count: u32,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Keep full resolution instead of capping the longest side at 800px
    #[arg(long)]
    no_resize: bool,

    /// Gaussian blur before extraction
    #[arg(long)]
    blur: bool,

    /// Boost contrast before extraction
    #[arg(long)]
    contrast: bool,

    /// Color notation for text output: hex, rgb or hsl
    #[arg(short, long, default_value_t = ColorFormat::Hex)]
    format: ColorFormat,

    /// Print one JSON object per image instead of text
    #[arg(long)]
    json: bool,

    /// Log debug diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut options = ExtractOptions::default().with_target_count(args.count);
    if let Some(seed) = args.seed {
        options = options.with_seed(seed);
    }
    let preprocessing = PreprocessOptions {
        resize: !args.no_resize,
        blur: args.blur,
        contrast: args.contrast,
    };

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let outcome = extract_palette_bytes(&bytes, args.algorithm, &options, &preprocessing)
            .with_context(|| format!("palette extraction failed for {}", input.display()))?;

        if args.json {
            println!("{}", serde_json::to_string(&outcome)?);
            continue;
        }

        println!("{} ({})", input.display(), outcome.algorithm);
        for hex in &outcome.palette {
            println!("  {}", format_color(from_hex(hex)?, args.format));
        }
        let analysis = &outcome.analysis;
        let temperature = if analysis.is_grayscale {
            "grayscale"
        } else if analysis.is_warm {
            "warm"
        } else if analysis.is_cool {
            "cool"
        } else {
            "neutral"
        };
        println!(
            "  {temperature}, avg saturation {}%, avg lightness {}%",
            analysis.average_saturation, analysis.average_lightness
        );
    }

    Ok(())
}
