use image::{Rgb, RgbImage};

use crate::{HashError, Result};

/// An owned, non-empty RGB pixel buffer; the only pixel format the hashing pipeline reads.
///
/// Build one from decoded image data with [`PixelGrid::new()`] or [`PixelGrid::from_raw()`],
/// or let [`Hasher`](crate::Hasher) convert any [`Image`](crate::Image) for you.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    buf: RgbImage,
}

impl PixelGrid {
    /// Wrap an existing RGB buffer.
    ///
    /// ## Errors
    /// `InvalidDimension` if the buffer has a zero width or height.
    pub fn new(buf: RgbImage) -> Result<Self> {
        let (width, height) = buf.dimensions();
        if width == 0 || height == 0 {
            return Err(HashError::InvalidDimension { width, height });
        }
        Ok(Self { buf })
    }

    /// Build a grid from interleaved `R, G, B` bytes in row-major order.
    ///
    /// ## Errors
    /// `InvalidDimension` if either side is zero or `raw` does not hold exactly
    /// `width * height * 3` bytes.
    pub fn from_raw(width: u32, height: u32, raw: Vec<u8>) -> Result<Self> {
        let buf = RgbImage::from_raw(width, height, raw)
            .ok_or(HashError::InvalidDimension { width, height })?;
        Self::new(buf)
    }

    /// Build a grid by evaluating `f` for every pixel.
    ///
    /// ## Errors
    /// `InvalidDimension` if either side is zero.
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Result<Self>
    where
        F: FnMut(u32, u32) -> Rgb<u8>,
    {
        Self::new(RgbImage::from_fn(width, height, f))
    }

    /// Width in pixels, always non-zero.
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    /// Height in pixels, always non-zero.
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    /// The pixel at column `x`, row `y`.
    ///
    /// ### Panics
    /// If `(x, y)` lies outside the grid.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.buf.get_pixel(x, y)
    }

    /// Borrow the underlying `image` buffer.
    pub fn as_rgb_image(&self) -> &RgbImage {
        &self.buf
    }

    /// Unwrap into the underlying `image` buffer.
    pub fn into_inner(self) -> RgbImage {
        self.buf
    }
}
