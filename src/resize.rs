//! Resampling strategies used to bring an image down (or up) to the working resolution.
use std::f64::consts::PI;

pub use image::imageops::FilterType;
use image::{imageops, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::{HashError, PixelGrid, Resize, Result};

/// Lanczos resampling, evaluated directly from the windowed sinc kernel.
///
/// For each destination pixel the matching source coordinate is found by inverse mapping,
/// `src = dst * scale + 0.5 * scale - 0.5`, and clamped into the source image. The
/// `2a x 2a` neighbourhood of integer offsets `[-a + 1, a]` around `floor(src)` is then summed
/// with weight `L(i) * L(j)`, normalized by the sum of the weights actually used, clamped to
/// `[0, 255]` and rounded. Samples past the border are clamped to the edge pixel.
///
/// This is the default resampler and the one existing hashes were made with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lanczos {
    radius: u32,
}

impl Lanczos {
    /// Largest accepted window radius; each output pixel sums `(2a)²` taps.
    pub const MAX_RADIUS: u32 = 64;

    /// A Lanczos resampler with window radius `a`. A radius of 0 is treated as 1, and resizing
    /// fails with `InvalidRadius` above [`MAX_RADIUS`](Self::MAX_RADIUS).
    pub const fn new(radius: u32) -> Self {
        Self { radius }
    }

    fn check_radius(&self) -> Result<()> {
        if self.radius > Self::MAX_RADIUS {
            return Err(HashError::InvalidRadius(self.radius));
        }
        Ok(())
    }

    /// The configured window radius.
    pub const fn radius(&self) -> u32 {
        self.radius
    }
}

impl Default for Lanczos {
    fn default() -> Self {
        Self::new(3)
    }
}

/// `L(x, a)`: 1 at the origin, 0 outside the window, `sin(πx) sin(πx / a) / (πx)²` in between.
fn lanczos_kernel(x: f64, a: f64) -> f64 {
    if x == 0.0 {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pix = PI * x;
    pix.sin() * (pix / a).sin() / (pix * pix)
}

impl Resize for Lanczos {
    fn resize(&self, grid: &PixelGrid, width: u32, height: u32) -> Result<PixelGrid> {
        check_target(width, height)?;
        self.check_radius()?;

        let src = grid.as_rgb_image();
        let (src_width, src_height) = src.dimensions();

        let scale_x = f64::from(src_width) / f64::from(width);
        let scale_y = f64::from(src_height) / f64::from(height);
        let translate_x = 0.5 * scale_x - 0.5;
        let translate_y = 0.5 * scale_y - 0.5;

        // weights only depend on the integer offset, never on the fractional position
        let a = i64::from(self.radius.max(1));
        let taps: Vec<(i64, f64)> = (-a + 1..=a)
            .map(|offset| (offset, lanczos_kernel(offset as f64, a as f64)))
            .collect();

        let max_x = i64::from(src_width) - 1;
        let max_y = i64::from(src_height) - 1;

        let out = RgbImage::from_fn(width, height, |x, y| {
            let src_x = (f64::from(x) * scale_x + translate_x).clamp(0.0, max_x as f64);
            let src_y = (f64::from(y) * scale_y + translate_y).clamp(0.0, max_y as f64);
            let (base_x, base_y) = (src_x.floor() as i64, src_y.floor() as i64);

            let mut channels = [0f64; 3];
            let mut weight_sum = 0.0;

            for &(j, weight_y) in &taps {
                let sample_y = (base_y + j).clamp(0, max_y) as u32;
                for &(i, weight_x) in &taps {
                    let sample_x = (base_x + i).clamp(0, max_x) as u32;
                    let weight = weight_x * weight_y;
                    let Rgb(pixel) = src.get_pixel(sample_x, sample_y);

                    for (acc, &channel) in channels.iter_mut().zip(pixel) {
                        *acc += weight * f64::from(channel);
                    }
                    weight_sum += weight;
                }
            }

            Rgb(channels.map(|acc| (acc / weight_sum).clamp(0.0, 255.0).round() as u8))
        });

        PixelGrid::new(out)
    }
}

/// Resampling delegated to [`image::imageops::resize`] with the given filter.
///
/// `FilterType::CatmullRom` gives the smooth bicubic scaling image libraries usually
/// default to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Smooth(pub FilterType);

impl Default for Smooth {
    fn default() -> Self {
        Smooth(FilterType::CatmullRom)
    }
}

impl Resize for Smooth {
    fn resize(&self, grid: &PixelGrid, width: u32, height: u32) -> Result<PixelGrid> {
        check_target(width, height)?;
        PixelGrid::new(imageops::resize(grid.as_rgb_image(), width, height, self.0))
    }
}

/// Resampling through `fast_image_resize`. Falls back to [`Smooth`] with the same filter
/// whenever the fast path rejects the input.
#[cfg(feature = "fast_resize")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fast(pub FilterType);

#[cfg(feature = "fast_resize")]
impl Resize for Fast {
    fn resize(&self, grid: &PixelGrid, width: u32, height: u32) -> Result<PixelGrid> {
        use fast_image_resize::{PixelType, ResizeAlg, ResizeOptions, Resizer};

        check_target(width, height)?;
        let src = grid.as_rgb_image();

        let Ok(src_image) = fast_image_resize::images::Image::from_vec_u8(
            src.width(),
            src.height(),
            src.to_vec(),
            PixelType::U8x3,
        ) else {
            return Smooth(self.0).resize(grid, width, height);
        };

        let mut dst_image = fast_image_resize::images::Image::new(width, height, PixelType::U8x3);
        let resize_alg = match self.0 {
            FilterType::Nearest => ResizeAlg::Nearest,
            FilterType::Triangle => ResizeAlg::Convolution(fast_image_resize::FilterType::Bilinear),
            FilterType::CatmullRom => ResizeAlg::Convolution(fast_image_resize::FilterType::CatmullRom),
            FilterType::Gaussian => ResizeAlg::Convolution(fast_image_resize::FilterType::Gaussian),
            FilterType::Lanczos3 => ResizeAlg::Convolution(fast_image_resize::FilterType::Lanczos3),
        };

        let resize_options = ResizeOptions::new().resize_alg(resize_alg);
        if Resizer::new()
            .resize(&src_image, &mut dst_image, Some(&resize_options))
            .is_err()
        {
            return Smooth(self.0).resize(grid, width, height);
        }

        PixelGrid::from_raw(width, height, dst_image.buffer().to_vec())
    }
}

/// Serializable choice of resampler, as stored in [`HasherConfig`](crate::HasherConfig).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeAlg {
    /// [`Lanczos`] with the given window radius.
    Lanczos {
        /// Window radius `a`; 3 unless you have a reason to change it.
        radius: u32,
    },
    /// [`Smooth`] resampling with the given filter.
    Smooth(#[serde(with = "SerdeFilterType")] FilterType),
    /// [`Fast`] resampling with the given filter.
    #[cfg(feature = "fast_resize")]
    Fast(#[serde(with = "SerdeFilterType")] FilterType),
}

impl Default for ResizeAlg {
    fn default() -> Self {
        ResizeAlg::Lanczos { radius: 3 }
    }
}

impl ResizeAlg {
    /// Reject settings that could never resize anything.
    pub(crate) fn validate(&self) -> Result<()> {
        match *self {
            ResizeAlg::Lanczos { radius } => Lanczos::new(radius).check_radius(),
            _ => Ok(()),
        }
    }
}

impl Resize for ResizeAlg {
    fn resize(&self, grid: &PixelGrid, width: u32, height: u32) -> Result<PixelGrid> {
        match *self {
            ResizeAlg::Lanczos { radius } => Lanczos::new(radius).resize(grid, width, height),
            ResizeAlg::Smooth(filter) => Smooth(filter).resize(grid, width, height),
            #[cfg(feature = "fast_resize")]
            ResizeAlg::Fast(filter) => Fast(filter).resize(grid, width, height),
        }
    }
}

fn check_target(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(HashError::InvalidDimension { width, height });
    }
    Ok(())
}

/// Provide Serde a typedef for `image::FilterType`: <https://serde.rs/remote-derive.html>
/// This is automatically checked, if Serde complains then double-check with the original definition
#[derive(Serialize, Deserialize)]
#[serde(remote = "FilterType")]
enum SerdeFilterType {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}
