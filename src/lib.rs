//! DCT-based perceptual hashing of images, and ranking of the resulting hashes by similarity.
//! Accepts images opened with the [image] crate from Piston, raw encoded bytes, or readers.
//!
//! Visually similar images, such as resized or recompressed copies of the same picture, hash
//! to strings at a small [distance](matcher::distance) from each other, while unrelated images
//! land far apart.
//!
//! ```rust,no_run
//!
//! use image_phash::HasherConfig;
//! use image_phash::matcher::{HeapMatcher, ImageMatcher};
//!
//! let image1 = image::open("image1.png").unwrap();
//! let image2 = image::open("image2.png").unwrap();
//!
//! let hasher = HasherConfig::new().to_hasher().unwrap();
//!
//! let hash1 = hasher.hash_image(&image1).unwrap();
//! let hash2 = hasher.hash_image(&image2).unwrap();
//!
//! println!("Image1 hash: {hash1}");
//! println!("Image2 hash: {hash2}");
//!
//! println!("Distance: {}", hash1.dist(&hash2).unwrap());
//!
//! let best = HeapMatcher.find_top_x_most_similar(hash1.as_str(), &[hash1.clone(), hash2], 1).unwrap();
//! assert_eq!(best[0].index(), 0);
//! ```
//! [image]: https://github.com/PistonDevelopers/image
#![deny(missing_docs)]

use std::io::{BufRead, Seek};
use std::path::Path;

use image::ImageReader;
use log::{debug, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use alg::{ImageHash, TrailingNibble};
pub use dct::{transform, CoefficientMatrix, DctAlg};
use dct::DctCtxt;
pub use error::{HashError, Result};
pub use grid::PixelGrid;
pub use luma::LumaSource;
pub use resize::{FilterType, Lanczos, ResizeAlg, Smooth};
#[cfg(feature = "fast_resize")]
pub use resize::Fast;
pub use traits::{Image, Resize};

mod alg;
mod dct;
mod error;
mod grid;
mod luma;
pub mod matcher;
mod resize;
mod traits;

/// **Start here**. Configuration builder for [`Hasher`].
///
/// The defaults reproduce the reference fingerprint exactly: an 8 x 8 low-frequency block
/// (64 bits, 16 hex characters) taken from the DCT of a 32 x 32 Lanczos-resampled grid, reading
/// the red channel.
///
/// ```rust
/// use image_phash::HasherConfig;
///
/// let hasher = HasherConfig::new().to_hasher().unwrap();
/// // hasher.hash_image(&image);
/// ```
///
/// # Configuration Options
/// Every option changes hash values. Hashes made with different configurations must not be
/// compared with each other; keep one configuration per collection of hashes.
///
/// ### Hash Size
/// Setter: [`.hash_size()`](#method.hash_size)
///
/// Side length of the low-frequency block, so a hash holds `hash_size²` bits.
///
/// ### High Frequency Factor
/// Setter: [`.highfreq_factor()`](#method.highfreq_factor)
///
/// The image is resampled to `hash_size * highfreq_factor` pixels square before the DCT.
/// Larger factors keep more detail around for the transform to discard.
///
/// ### Resampler, Luminance Source, DCT Algorithm, Trailing Nibble
/// See [`ResizeAlg`], [`LumaSource`], [`DctAlg`] and [`TrailingNibble`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasherConfig {
    hash_size: u32,
    highfreq_factor: u32,
    resize_alg: ResizeAlg,
    luma: LumaSource,
    dct_alg: DctAlg,
    trailing_nibble: TrailingNibble,
}

impl HasherConfig {
    /// Construct a new hasher config with the defaults existing hashes were made with.
    pub fn new() -> Self {
        HasherConfig {
            hash_size: 8,
            highfreq_factor: 4,
            resize_alg: ResizeAlg::default(),
            luma: LumaSource::default(),
            dct_alg: DctAlg::default(),
            trailing_nibble: TrailingNibble::default(),
        }
    }

    /// Set the side length of the low-frequency block; the hash holds `hash_size²` bits.
    ///
    /// With [`TrailingNibble::Pad`] a hash is `ceil(hash_size² / 4)` hex characters long.
    #[must_use]
    pub fn hash_size(self, hash_size: u32) -> Self {
        Self { hash_size, ..self }
    }

    /// Set the multiplier from hash size to the working resolution the DCT runs on.
    #[must_use]
    pub fn highfreq_factor(self, highfreq_factor: u32) -> Self {
        Self {
            highfreq_factor,
            ..self
        }
    }

    /// Set the resampler used to reach the working resolution.
    #[must_use]
    pub fn resize_alg(self, resize_alg: ResizeAlg) -> Self {
        Self { resize_alg, ..self }
    }

    /// Set which intensity each pixel contributes to the DCT.
    #[must_use]
    pub fn luma(self, luma: LumaSource) -> Self {
        Self { luma, ..self }
    }

    /// Set how the DCT is computed.
    #[must_use]
    pub fn dct_alg(self, dct_alg: DctAlg) -> Self {
        Self { dct_alg, ..self }
    }

    /// Set how a trailing partial nibble is encoded.
    #[must_use]
    pub fn trailing_nibble(self, trailing_nibble: TrailingNibble) -> Self {
        Self {
            trailing_nibble,
            ..self
        }
    }

    /// Create a [`Hasher`] from this config which can be used to hash images.
    ///
    /// ## Errors
    /// `InvalidDimension` (reported as `hash_size x highfreq_factor`) if either is zero or the
    /// working resolution overflows. `InvalidRadius` if the configured Lanczos window is larger
    /// than [`Lanczos::MAX_RADIUS`].
    pub fn to_hasher(&self) -> Result<Hasher> {
        self.resize_alg.validate()?;
        self.to_hasher_with(self.resize_alg)
    }

    /// Like [`to_hasher()`](#method.to_hasher), but resampling with `resizer` instead of the
    /// configured [`ResizeAlg`].
    ///
    /// ## Errors
    /// `InvalidDimension` as for [`to_hasher()`](#method.to_hasher). The configured
    /// [`ResizeAlg`] is not used, so it is not validated either.
    pub fn to_hasher_with<R: Resize>(&self, resizer: R) -> Result<Hasher<R>> {
        let Self {
            hash_size,
            highfreq_factor,
            luma,
            dct_alg,
            trailing_nibble,
            ..
        } = *self;

        let working = hash_size
            .checked_mul(highfreq_factor)
            .filter(|&size| size > 0)
            .ok_or(HashError::InvalidDimension {
                width: hash_size,
                height: highfreq_factor,
            })?;

        debug!(
            "{hash_size}x{hash_size} hash over a {working}x{working} grid ({dct_alg:?} DCT, {luma:?})"
        );

        Ok(Hasher {
            ctxt: HashCtxt {
                dct_ctxt: DctCtxt::new(working as usize, working as usize, dct_alg),
                hash_size: hash_size as usize,
                luma,
                trailing_nibble,
            },
            resizer,
        })
    }
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates hashes for images.
///
/// Constructed via [`HasherConfig::to_hasher()`]. A hasher holds no per-image state and can be
/// shared freely between threads.
#[derive(Debug)]
pub struct Hasher<R = ResizeAlg> {
    ctxt: HashCtxt,
    resizer: R,
}

impl<R> Hasher<R>
where
    R: Resize,
{
    /// Calculate a hash for the given image with the configured options.
    ///
    /// ## Errors
    /// `InvalidDimension` if the image is empty.
    pub fn hash_image<I: Image + ?Sized>(&self, img: &I) -> Result<ImageHash> {
        let coeffs = self.coefficients(img)?;
        Ok(ImageHash::from_coefficients(
            &coeffs,
            self.ctxt.hash_size,
            self.ctxt.trailing_nibble,
        ))
    }

    /// Decode an encoded image (PNG, JPEG or WebP) and hash it.
    ///
    /// ## Errors
    /// `Decode` if the bytes are not a supported image.
    pub fn hash_bytes(&self, bytes: &[u8]) -> Result<ImageHash> {
        let img = image::load_from_memory(bytes)?;
        self.hash_image(&img)
    }

    /// Decode an image from `reader`, guessing its format from the content, and hash it.
    ///
    /// ## Errors
    /// `Io` if reading fails, `Decode` if the data is not a supported image.
    pub fn hash_reader<Rd: BufRead + Seek>(&self, reader: Rd) -> Result<ImageHash> {
        let img = ImageReader::new(reader).with_guessed_format()?.decode()?;
        self.hash_image(&img)
    }

    /// Open and decode the image file at `path`, and hash it.
    ///
    /// ## Errors
    /// `Io` if the file cannot be read, `Decode` if it is not a supported image.
    pub fn hash_path<P: AsRef<Path>>(&self, path: P) -> Result<ImageHash> {
        let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        self.hash_image(&img)
    }

    /// The full DCT of the image at working resolution, before cropping and thresholding.
    ///
    /// ## Errors
    /// `InvalidDimension` if the image is empty.
    pub fn coefficients<I: Image + ?Sized>(&self, img: &I) -> Result<CoefficientMatrix> {
        let grid = img.to_grid()?;
        let (width, height) = self.working_size();
        let resized = self.resizer.resize(&grid, width, height)?;
        trace!(
            "resized {}x{} to {width}x{height}",
            grid.width(),
            grid.height()
        );
        Ok(self.ctxt.dct_ctxt.dct_2d(&dct::samples(&resized, self.ctxt.luma)))
    }

    /// Resample `grid` with this hasher's resampler.
    ///
    /// Useful to produce scaled copies that hash close to the original.
    ///
    /// ## Errors
    /// `InvalidDimension` if `width` or `height` is zero.
    pub fn resize(&self, grid: &PixelGrid, width: u32, height: u32) -> Result<PixelGrid> {
        self.resizer.resize(grid, width, height)
    }

    /// The resolution images are resampled to before the DCT.
    pub fn working_size(&self) -> (u32, u32) {
        (
            self.ctxt.dct_ctxt.width() as u32,
            self.ctxt.dct_ctxt.height() as u32,
        )
    }
}

impl<R> Hasher<R>
where
    R: Resize + Sync,
{
    /// Hash every image in `images` in parallel. Results are in input order.
    pub fn hash_all<I: Image + Sync>(&self, images: &[I]) -> Vec<Result<ImageHash>> {
        images.par_iter().map(|img| self.hash_image(img)).collect()
    }
}

#[derive(Debug)]
struct HashCtxt {
    dct_ctxt: DctCtxt,
    hash_size: usize,
    luma: LumaSource,
    trailing_nibble: TrailingNibble,
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;
    use std::io::Cursor;

    use image::codecs::jpeg::JpegEncoder;
    use image::codecs::webp::WebPEncoder;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
    use rand::rngs::SmallRng;
    use rand::{RngCore, SeedableRng};

    use super::{
        transform, DctAlg, FilterType, HashError, HasherConfig, ImageHash, Lanczos, LumaSource,
        PixelGrid, ResizeAlg, Smooth, TrailingNibble,
    };
    use crate::matcher::{distance, HeapMatcher, ImageMatcher};

    type RgbaBuf = ImageBuffer<Rgba<u8>, Vec<u8>>;

    fn gen_test_img(width: u32, height: u32) -> RgbaBuf {
        let mut buf = vec![0; (width * height * 4) as usize];
        let mut rng = SmallRng::seed_from_u64(0xc0ffee);
        rng.fill_bytes(&mut buf);

        ImageBuffer::from_raw(width, height, buf).unwrap()
    }

    /// 64x48 image with a formula per channel; hashes below were computed independently.
    fn fixture() -> PixelGrid {
        PixelGrid::from_fn(64, 48, |x, y| {
            Rgb([
                ((x * x + 3 * x * y + 7 * y + 11) % 256) as u8,
                ((x * 5 + y * 3) % 256) as u8,
                (((x ^ y) * 4) % 256) as u8,
            ])
        })
        .unwrap()
    }

    /// Bilinear interpolation of an 9x9 lattice of xorshift values: smooth, and different for
    /// every seed.
    fn smooth_image(seed: u64, width: u32, height: u32) -> PixelGrid {
        const CELLS: usize = 8;

        let mut state = seed;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            f64::from((state >> 24) as u8)
        };
        let lattice: Vec<[f64; 3]> = (0..(CELLS + 1) * (CELLS + 1))
            .map(|_| [next(), next(), next()])
            .collect();
        let at = |i: usize, j: usize| lattice[j * (CELLS + 1) + i];

        PixelGrid::from_fn(width, height, |x, y| {
            let fx = f64::from(x) * CELLS as f64 / f64::from(width - 1);
            let fy = f64::from(y) * CELLS as f64 / f64::from(height - 1);
            let (cx, cy) = ((fx as usize).min(CELLS - 1), (fy as usize).min(CELLS - 1));
            let (tx, ty) = (fx - cx as f64, fy - cy as f64);

            let mut px = [0u8; 3];
            for (c, out) in px.iter_mut().enumerate() {
                let top = at(cx, cy)[c] * (1.0 - tx) + at(cx + 1, cy)[c] * tx;
                let bottom = at(cx, cy + 1)[c] * (1.0 - tx) + at(cx + 1, cy + 1)[c] * tx;
                *out = (top * (1.0 - ty) + bottom * ty).round() as u8;
            }
            Rgb(px)
        })
        .unwrap()
    }

    macro_rules! test_hash_equality {
        ($fnname:ident, $size:expr, $dct:ident) => {
            #[test]
            fn $fnname() {
                // square, powers of two
                test_hash_equality!(1024, 1024, $size, $dct);
                // rectangular, powers of two
                test_hash_equality!(512, 256, $size, $dct);
                // odd size, square
                test_hash_equality!(967, 967, $size, $dct);
                // odd size, rectangular
                test_hash_equality!(967, 1023, $size, $dct);
            }
        };
        ($width:expr, $height:expr, $size:expr, $dct:ident) => {{
            let test_img = gen_test_img($width, $height);
            let hasher = HasherConfig::new()
                .hash_size($size)
                .dct_alg(DctAlg::$dct)
                .to_hasher()
                .unwrap();
            let hash1 = hasher.hash_image(&test_img).unwrap();
            let hash2 = hasher.hash_image(&test_img).unwrap();
            assert_eq!(hash1, hash2);
            assert_eq!(hash1.len(), ($size * $size / 4) as usize);
        }};
    }

    test_hash_equality!(hash_eq_8, 8, Direct);
    test_hash_equality!(hash_eq_16, 16, Direct);
    test_hash_equality!(hash_eq_8_separable, 8, Separable);
    test_hash_equality!(hash_eq_16_separable, 16, Separable);

    #[test]
    fn pinned_fixture() {
        let grid = fixture();

        let hasher = HasherConfig::new().to_hasher().unwrap();
        assert_eq!(hasher.hash_image(&grid).unwrap().as_str(), "8b5212538e977356");

        let hasher = HasherConfig::new()
            .dct_alg(DctAlg::Separable)
            .to_hasher()
            .unwrap();
        assert_eq!(hasher.hash_image(&grid).unwrap().as_str(), "8b5212538e977356");

        let hasher = HasherConfig::new()
            .luma(LumaSource::Rec601)
            .to_hasher()
            .unwrap();
        assert_eq!(hasher.hash_image(&grid).unwrap().as_str(), "8b842e6bc217e34b");

        let smooth = smooth_image(3, 256, 192);
        let hasher = HasherConfig::new().to_hasher().unwrap();
        assert_eq!(hasher.hash_image(&smooth).unwrap().as_str(), "e739fe8c03580cd4");
    }

    #[test]
    fn odd_hash_sizes() {
        let grid = fixture();
        let hash = |size: u32, trailing: TrailingNibble| {
            HasherConfig::new()
                .hash_size(size)
                .trailing_nibble(trailing)
                .to_hasher()
                .unwrap()
                .hash_image(&grid)
                .unwrap()
                .into_string()
        };

        // 9 bits, the last one clear
        assert_eq!(hash(3, TrailingNibble::DropZero), "e1");
        assert_eq!(hash(3, TrailingNibble::Pad), "e10");
        // 25 and 49 bits, the last one set
        assert_eq!(hash(5, TrailingNibble::DropZero), "acb2d01");
        assert_eq!(hash(5, TrailingNibble::Pad), "acb2d01");
        assert_eq!(hash(7, TrailingNibble::Pad), "92ac4ebde1411");
        // 36 bits is a whole number of nibbles
        assert_eq!(hash(6, TrailingNibble::DropZero), "9b68951b2");
    }

    #[test]
    fn padded_length_is_fixed() {
        let img = gen_test_img(300, 200);
        for size in 1..=9u32 {
            let hash = HasherConfig::new()
                .hash_size(size)
                .trailing_nibble(TrailingNibble::Pad)
                .to_hasher()
                .unwrap()
                .hash_image(&img)
                .unwrap();
            assert_eq!(hash.len(), ((size * size + 3) / 4) as usize);
        }
    }

    #[test]
    fn invalid_config() {
        assert!(matches!(
            HasherConfig::new().hash_size(0).to_hasher(),
            Err(HashError::InvalidDimension {
                width: 0,
                height: 4
            })
        ));
        assert!(HasherConfig::new().highfreq_factor(0).to_hasher().is_err());
        assert!(HasherConfig::new()
            .hash_size(u32::MAX)
            .highfreq_factor(2)
            .to_hasher()
            .is_err());

        let oversized = HasherConfig::new().resize_alg(ResizeAlg::Lanczos { radius: u32::MAX });
        let json = serde_json::to_string(&oversized).unwrap();
        let decoded: HasherConfig = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            decoded.to_hasher(),
            Err(HashError::InvalidRadius(u32::MAX))
        ));
    }

    #[test]
    fn working_size() {
        let hasher = HasherConfig::new().to_hasher().unwrap();
        assert_eq!(hasher.working_size(), (32, 32));
        let hasher = HasherConfig::new()
            .hash_size(5)
            .highfreq_factor(3)
            .to_hasher()
            .unwrap();
        assert_eq!(hasher.working_size(), (15, 15));
    }

    #[test]
    fn scaled_copies_stay_close() {
        let hasher = HasherConfig::new().to_hasher().unwrap();
        for seed in 1..=7 {
            let grid = smooth_image(seed, 256, 192);
            let hash = hasher.hash_image(&grid).unwrap();

            let half = hasher.resize(&grid, 128, 96).unwrap();
            let half_hash = hasher.hash_image(&half).unwrap();
            let d = hash.dist(&half_hash).unwrap();
            assert!(d < 10, "seed {seed}: 0.5x distance {d} ({hash} vs {half_hash})");

            if seed <= 3 {
                let double = hasher.resize(&grid, 512, 384).unwrap();
                let double_hash = hasher.hash_image(&double).unwrap();
                let d = hash.dist(&double_hash).unwrap();
                assert!(d < 10, "seed {seed}: 2x distance {d}");
            }
        }
    }

    #[test]
    fn unrelated_images_are_far_apart() {
        let hasher = HasherConfig::new().to_hasher().unwrap();
        let mut hashes: Vec<_> = (1..=6)
            .map(|seed| hasher.hash_image(&smooth_image(seed, 256, 192)).unwrap())
            .collect();
        // the seventh image only exists as a copy saved at half scale
        let reduced = hasher.resize(&smooth_image(7, 256, 192), 128, 96).unwrap();
        hashes.push(hasher.hash_image(&reduced).unwrap());

        let unique: HashSet<_> = hashes.iter().collect();
        assert_eq!(unique.len(), 7);

        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                let d = a.dist(b).unwrap();
                assert!(d >= 20, "{a} vs {b}: {d}");
            }
        }
    }

    #[test]
    fn the_best_match() {
        let hasher = HasherConfig::new().to_hasher().unwrap();
        let images: Vec<_> = (1..=7).map(|seed| smooth_image(seed, 256, 192)).collect();
        let hashes: Vec<_> = hasher
            .hash_all(&images)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        let index = 3;
        let resized = hasher.resize(&images[index], 128, 96).unwrap();
        let resized_hash = hasher.hash_image(&resized).unwrap();

        let result = HeapMatcher
            .find_top_x_most_similar(resized_hash.as_str(), &hashes, 5)
            .unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(result[0].index(), index);
    }

    #[test]
    fn hash_all_matches_sequential() {
        let hasher = HasherConfig::new().to_hasher().unwrap();
        let images: Vec<_> = (1..=4).map(|seed| smooth_image(seed, 40, 30)).collect();
        let parallel = hasher.hash_all(&images);
        for (img, hash) in images.iter().zip(parallel) {
            assert_eq!(hash.unwrap(), hasher.hash_image(img).unwrap());
        }
    }

    #[test]
    fn every_input_path_agrees() {
        let grid = fixture();
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(grid.as_rgb_image().clone())
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let hasher = HasherConfig::new().to_hasher().unwrap();
        let expected = hasher.hash_image(&grid).unwrap();

        assert_eq!(hasher.hash_bytes(&png).unwrap(), expected);
        assert_eq!(hasher.hash_reader(Cursor::new(&png)).unwrap(), expected);
        assert_eq!(
            hasher
                .hash_image(&DynamicImage::ImageRgb8(grid.clone().into_inner()))
                .unwrap(),
            expected
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.png");
        std::fs::write(&path, &png).unwrap();
        assert_eq!(hasher.hash_path(&path).unwrap(), expected);
    }

    #[test]
    fn lossy_and_lossless_codecs() {
        let grid = smooth_image(3, 256, 192);
        let hasher = HasherConfig::new().to_hasher().unwrap();

        let mut jpeg = Vec::new();
        grid.as_rgb_image()
            .write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, 90))
            .unwrap();
        let jpeg_hash = hasher.hash_bytes(&jpeg).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(jpeg_hash, hasher.hash_image(&decoded).unwrap());
        assert_eq!(hasher.hash_reader(Cursor::new(&jpeg)).unwrap(), jpeg_hash);
        // compression noise stays well inside every coefficient's distance to the median
        assert_eq!(jpeg_hash.as_str(), "e739fe8c03580cd4");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smooth.jpg");
        std::fs::write(&path, &jpeg).unwrap();
        assert_eq!(hasher.hash_path(&path).unwrap(), jpeg_hash);

        let mut webp = Vec::new();
        grid.as_rgb_image()
            .write_with_encoder(WebPEncoder::new_lossless(&mut webp))
            .unwrap();
        assert_eq!(
            hasher.hash_bytes(&webp).unwrap(),
            hasher.hash_image(&grid).unwrap()
        );
    }

    #[test]
    fn encode_after_transform() {
        let grid = fixture();
        for (luma, alg, trailing, size) in [
            (LumaSource::Red, DctAlg::Direct, TrailingNibble::DropZero, 8),
            (LumaSource::Rec601, DctAlg::Separable, TrailingNibble::DropZero, 8),
            (LumaSource::Red, DctAlg::Direct, TrailingNibble::Pad, 3),
        ] {
            let hasher = HasherConfig::new()
                .hash_size(size)
                .luma(luma)
                .dct_alg(alg)
                .trailing_nibble(trailing)
                .to_hasher()
                .unwrap();
            let (width, height) = hasher.working_size();
            let resized = hasher.resize(&grid, width, height).unwrap();

            let coeffs = transform(&resized, luma, alg);
            let hash = ImageHash::from_coefficients(&coeffs, size as usize, trailing);
            assert_eq!(hash, hasher.hash_image(&grid).unwrap());
            assert_eq!(coeffs, hasher.coefficients(&grid).unwrap());
        }

        let coeffs = transform(&fixture(), LumaSource::Red, DctAlg::Direct);
        // clamped to the 64 x 48 matrix
        assert_eq!(
            ImageHash::from_coefficients(&coeffs, 100, TrailingNibble::Pad).len(),
            64 * 48 / 4
        );
    }

    #[test]
    fn decode_failures_propagate() {
        let hasher = HasherConfig::new().to_hasher().unwrap();
        assert!(matches!(
            hasher.hash_bytes(b"definitely not an image"),
            Err(HashError::Decode(_))
        ));
        assert!(matches!(
            hasher.hash_path("/nonexistent/image.png"),
            Err(HashError::Io(_))
        ));
        assert!(matches!(
            hasher.hash_image(&DynamicImage::new_rgb8(0, 10)),
            Err(HashError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn resamplers_are_pluggable() {
        let grid = smooth_image(5, 200, 150);
        let config = HasherConfig::new();

        let default = config.to_hasher().unwrap().hash_image(&grid).unwrap();
        let injected = config
            .to_hasher_with(Lanczos::default())
            .unwrap()
            .hash_image(&grid)
            .unwrap();
        assert_eq!(default, injected);

        let smooth = config
            .clone()
            .resize_alg(ResizeAlg::Smooth(FilterType::CatmullRom))
            .to_hasher()
            .unwrap()
            .hash_image(&grid)
            .unwrap();
        let boxed: Box<dyn crate::Resize> = Box::new(Smooth(FilterType::CatmullRom));
        let injected = config
            .to_hasher_with(boxed)
            .unwrap()
            .hash_image(&grid)
            .unwrap();
        assert_eq!(smooth, injected);
        assert_eq!(smooth.len(), 16);
    }

    #[test]
    fn distance_properties_on_real_hashes() {
        let hasher = HasherConfig::new().to_hasher().unwrap();
        let a = hasher.hash_image(&smooth_image(1, 64, 64)).unwrap();
        let b = hasher.hash_image(&smooth_image(2, 64, 64)).unwrap();
        assert_eq!(a.dist(&a).unwrap(), 0);
        assert_eq!(a.dist(&b).unwrap(), b.dist(&a).unwrap());
        assert_eq!(a.dist(&b).unwrap(), distance(a.as_str(), b.as_str()).unwrap());

        let short = HasherConfig::new()
            .hash_size(4)
            .to_hasher()
            .unwrap()
            .hash_image(&smooth_image(1, 64, 64))
            .unwrap();
        assert!(matches!(
            a.dist(&short),
            Err(HashError::LengthMismatch {
                left: 16,
                right: 4
            })
        ));
    }

    #[test]
    fn config_serde_round_trip() {
        let config = HasherConfig::new()
            .hash_size(12)
            .resize_alg(ResizeAlg::Smooth(FilterType::Gaussian))
            .luma(LumaSource::Rec601)
            .dct_alg(DctAlg::Separable)
            .trailing_nibble(TrailingNibble::Pad);

        let json = serde_json::to_string(&config).unwrap();
        let decoded: HasherConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, config);

        let hash = HasherConfig::new()
            .to_hasher()
            .unwrap()
            .hash_image(&fixture())
            .unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, "\"8b5212538e977356\"");
        assert_eq!(serde_json::from_str::<ImageHash>(&json).unwrap(), hash);
        assert!(serde_json::from_str::<ImageHash>("\"XYZ\"").is_err());
    }
}
