use std::borrow::Cow;

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::{PixelGrid, Result};

/// Interface for types used for storing input images.
///
/// Implemented for the `image` crate's RGB(A) buffers and [`DynamicImage`], and for
/// [`PixelGrid`] itself. Alpha is dropped; the hash only ever reads color channels.
pub trait Image {
    /// View this image as a [`PixelGrid`], converting if necessary.
    ///
    /// ## Errors
    /// `InvalidDimension` if the image is empty.
    fn to_grid(&self) -> Result<Cow<'_, PixelGrid>>;
}

impl Image for PixelGrid {
    fn to_grid(&self) -> Result<Cow<'_, PixelGrid>> {
        Ok(Cow::Borrowed(self))
    }
}

impl Image for RgbImage {
    fn to_grid(&self) -> Result<Cow<'_, PixelGrid>> {
        PixelGrid::new(self.clone()).map(Cow::Owned)
    }
}

impl Image for RgbaImage {
    fn to_grid(&self) -> Result<Cow<'_, PixelGrid>> {
        PixelGrid::new(DynamicImage::ImageRgba8(self.clone()).to_rgb8()).map(Cow::Owned)
    }
}

impl Image for DynamicImage {
    fn to_grid(&self) -> Result<Cow<'_, PixelGrid>> {
        PixelGrid::new(self.to_rgb8()).map(Cow::Owned)
    }
}

/// A resampling strategy: produce a new grid of exactly `width x height` pixels.
///
/// Different implementations produce different pixel values, and so different hashes;
/// only compare hashes made with the same resampler.
pub trait Resize {
    /// Resample `grid` to `width x height`. The source grid is left untouched.
    ///
    /// ## Errors
    /// `InvalidDimension` if `width` or `height` is zero.
    fn resize(&self, grid: &PixelGrid, width: u32, height: u32) -> Result<PixelGrid>;
}

impl<R: Resize + ?Sized> Resize for &R {
    fn resize(&self, grid: &PixelGrid, width: u32, height: u32) -> Result<PixelGrid> {
        (**self).resize(grid, width, height)
    }
}

impl<R: Resize + ?Sized> Resize for Box<R> {
    fn resize(&self, grid: &PixelGrid, width: u32, height: u32) -> Result<PixelGrid> {
        (**self).resize(grid, width, height)
    }
}
