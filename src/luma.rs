use image::Rgb;
use serde::{Deserialize, Serialize};

/// Which single-channel intensity the frequency transform reads from each pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LumaSource {
    /// The red channel as-is. This is the default, and what existing hashes were made with.
    #[default]
    Red,
    /// ITU-R BT.601 luma, `0.299 R + 0.587 G + 0.114 B`.
    Rec601,
}

impl LumaSource {
    /// The intensity of one pixel.
    #[inline]
    pub fn intensity(self, pixel: Rgb<u8>) -> f64 {
        let Rgb([r, g, b]) = pixel;
        match self {
            LumaSource::Red => f64::from(r),
            LumaSource::Rec601 => 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b),
        }
    }
}
