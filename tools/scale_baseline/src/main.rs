use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use clap::Parser;
use image::DynamicImage;
use image_phash::{Hasher, HasherConfig, Image, Result};
use log::{error, info};
use rayon::prelude::*;

const SCALES: &[(f64, &str)] = &[(0.5, "half"), (2.0, "double")];

// Usage example
// Report every image whose scaled copies land more than 8 bits away from the original:
// cargo run --release -- -i ~/Pictures -d 8
// And keep the offending copies around to look at:
// cargo run --release -- -i ~/Pictures -d 8 -o /tmp/scale_baseline

#[derive(Parser)]
#[command(
    name = "Scale baseline",
    version = "1.0",
    about = "Hashes images together with scaled copies of them and reports the distances"
)]
struct Cli {
    /// Sets the input folder
    #[arg(short, long, value_name = "INPUT")]
    input: String,

    /// Sets the output folder, where scaled copies over the limit are saved
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<String>,

    /// Sets diff, that is the maximum distance between an image and its scaled copy
    #[arg(short, long, value_name = "DIFF", default_value_t = 10)]
    diff: u32,
}

fn main() {
    if let Err(e) = handsome_logger::init() {
        eprintln!("Failed to initialize logger: {e}");
    }

    let args = Cli::parse();

    let files = collect_files(&args.input);
    info!("Found {} files", files.len());

    if let Some(output) = &args.output {
        if let Err(e) = std::fs::create_dir_all(output) {
            error!("Cannot create {output}: {e}");
            return;
        }
    }

    let hasher = match HasherConfig::new().to_hasher() {
        Ok(hasher) => hasher,
        Err(e) => {
            error!("Invalid hasher configuration: {e}");
            return;
        }
    };

    let worst = AtomicU32::new(0);
    let over_limit = AtomicU32::new(0);
    let total = AtomicU32::new(0);

    files.par_iter().for_each(|file| {
        match test_image_scaling(&hasher, file, args.output.as_deref(), args.diff) {
            Ok(distances) => {
                total.fetch_add(1, Ordering::Relaxed);
                for distance in distances {
                    worst.fetch_max(distance, Ordering::Relaxed);
                    if distance > args.diff {
                        over_limit.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            Err(e) => error!("Error while processing {}: {e}", file.display()),
        }
    });

    info!(
        "Checked {} images, {} scaled copies over {}, worst distance {}",
        total.into_inner(),
        over_limit.into_inner(),
        args.diff,
        worst.into_inner()
    );
}

fn collect_files(input: &str) -> Vec<PathBuf> {
    let mut paths = vec![];
    for file in jwalk::WalkDir::new(input)
        .max_depth(1000)
        .into_iter()
        .flatten()
    {
        let path_str = file.file_name.to_string_lossy();
        if path_str.ends_with(".jpg") || path_str.ends_with(".png") || path_str.ends_with(".webp") {
            paths.push(file.path());
        }
    }
    paths
}

/// Distance from the image at `file` to each of its scaled copies.
fn test_image_scaling(
    hasher: &Hasher,
    file: &Path,
    output: Option<&str>,
    max_diff: u32,
) -> Result<Vec<u32>> {
    let base_image = image::open(file)?;
    let grid = base_image.to_grid()?;
    let base_hash = hasher.hash_image(&*grid)?;

    let mut distances = Vec::with_capacity(SCALES.len());
    for &(scale, name) in SCALES {
        let width = ((f64::from(grid.width()) * scale).round() as u32).max(1);
        let height = ((f64::from(grid.height()) * scale).round() as u32).max(1);

        let scaled = hasher.resize(&grid, width, height)?;
        let scaled_hash = hasher.hash_image(&scaled)?;
        let distance = base_hash.dist(&scaled_hash)?;

        if distance > max_diff {
            info!(
                "File {} - {name} copy at distance {distance} ({base_hash} vs {scaled_hash})",
                file.display()
            );
            if let Some(output) = output {
                let stem = file.file_stem().unwrap_or_default().to_string_lossy();
                let target = format!("{output}/{stem}_{name}_diff_{distance}.png");
                if let Err(e) = DynamicImage::ImageRgb8(scaled.into_inner()).save(&target) {
                    error!("Cannot save {target}: {e}");
                }
            }
        }
        distances.push(distance);
    }

    info!("File {} - {base_hash}, distances {distances:?}", file.display());
    Ok(distances)
}
