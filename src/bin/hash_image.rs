//! Hash images and print their hex fingerprints, optionally ranking them against a query image.
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use image_phash::matcher::{HeapMatcher, ImageMatcher};
use image_phash::{
    DctAlg, FilterType, HasherConfig, ImageHash, LumaSource, ResizeAlg, TrailingNibble,
};
use log::{error, info};
use rayon::prelude::*;

// Usage example
// cargo run --release --bin hash_image -- photos/*.jpg
// cargo run --release --bin hash_image -- --query photos/cat.png --top 3 photos/*.jpg

#[derive(Parser)]
#[command(
    name = "hash_image",
    version,
    about = "Calculates perceptual hashes of images and finds the closest matches"
)]
struct Cli {
    /// Image files to calculate hashes over
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Side length of the low-frequency block, the hash holds its square in bits
    #[arg(long, default_value_t = 8)]
    hash_size: u32,

    /// Multiplier from hash size to the resolution the DCT runs on
    #[arg(long, default_value_t = 4)]
    factor: u32,

    /// Resampling filter
    #[arg(long, value_enum, default_value_t = Filter::Lanczos)]
    filter: Filter,

    /// Pixel intensity the DCT reads
    #[arg(long, value_enum, default_value_t = Luma::Red)]
    luma: Luma,

    /// Use the fast separable DCT, which may flip bits near the median
    #[arg(long)]
    separable: bool,

    /// Always emit the trailing partial nibble for odd bit counts
    #[arg(long)]
    pad_nibble: bool,

    /// Rank the images by similarity to this one
    #[arg(short, long, value_name = "QUERY")]
    query: Option<PathBuf>,

    /// Number of matches to print with --query
    #[arg(short, long, default_value_t = 5)]
    top: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    /// Direct Lanczos kernel, compatible with existing hashes
    Lanczos,
    CatmullRom,
    Gaussian,
    Triangle,
    Nearest,
}

impl Filter {
    fn resize_alg(self) -> ResizeAlg {
        match self {
            Filter::Lanczos => ResizeAlg::default(),
            Filter::CatmullRom => ResizeAlg::Smooth(FilterType::CatmullRom),
            Filter::Gaussian => ResizeAlg::Smooth(FilterType::Gaussian),
            Filter::Triangle => ResizeAlg::Smooth(FilterType::Triangle),
            Filter::Nearest => ResizeAlg::Smooth(FilterType::Nearest),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Luma {
    Red,
    Rec601,
}

fn main() -> Result<(), String> {
    handsome_logger::init().map_err(|e| format!("failed to initialize logger: {e}"))?;

    let args = Cli::parse();

    let config = HasherConfig::new()
        .hash_size(args.hash_size)
        .highfreq_factor(args.factor)
        .resize_alg(args.filter.resize_alg())
        .luma(match args.luma {
            Luma::Red => LumaSource::Red,
            Luma::Rec601 => LumaSource::Rec601,
        })
        .dct_alg(if args.separable {
            DctAlg::Separable
        } else {
            DctAlg::Direct
        })
        .trailing_nibble(if args.pad_nibble {
            TrailingNibble::Pad
        } else {
            TrailingNibble::DropZero
        });
    let hasher = config.to_hasher().map_err(|e| e.to_string())?;

    info!("Hashing {} files", args.images.len());

    let results: Vec<_> = args
        .images
        .par_iter()
        .map(|path| hasher.hash_path(path))
        .collect();

    let mut hashed: Vec<(&PathBuf, ImageHash)> = Vec::with_capacity(results.len());
    let mut failures = 0;
    for (path, result) in args.images.iter().zip(results) {
        match result {
            Ok(hash) => {
                println!("{}: {hash}", path.display());
                hashed.push((path, hash));
            }
            Err(e) => {
                error!("Failed to hash {}: {e}", path.display());
                failures += 1;
            }
        }
    }

    if let Some(query) = &args.query {
        let target = hasher
            .hash_path(query)
            .map_err(|e| format!("failed to hash {}: {e}", query.display()))?;
        let candidates: Vec<&str> = hashed.iter().map(|(_, hash)| hash.as_str()).collect();
        let best = HeapMatcher
            .find_top_x_most_similar(target.as_str(), &candidates, args.top)
            .map_err(|e| e.to_string())?;

        println!("Closest to {} ({target}):", query.display());
        for (rank, result) in best.iter().enumerate() {
            println!(
                "{:>3}. {} (distance {})",
                rank + 1,
                hashed[result.index()].0.display(),
                result.distance()
            );
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {} images failed", args.images.len()));
    }
    Ok(())
}
