use thiserror::Error;

/// Result type used throughout this crate.
pub type Result<T> = core::result::Result<T, HashError>;

/// Errors raised while hashing images or comparing hashes.
#[derive(Error, Debug)]
pub enum HashError {
    /// The image bytes could not be decoded into a pixel grid.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Reading the image source failed before decoding started.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Two hashes of different lengths were compared.
    #[error("hash lengths must be equal: {left} != {right}")]
    LengthMismatch {
        /// Length in characters of the first hash.
        left: usize,
        /// Length in characters of the second hash.
        right: usize,
    },

    /// A grid or resize target with a zero side, or a zero-sized hash configuration.
    #[error("invalid dimensions {width} x {height}")]
    InvalidDimension {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A Lanczos window radius above [`Lanczos::MAX_RADIUS`](crate::Lanczos::MAX_RADIUS).
    #[error("Lanczos radius {0} is too large")]
    InvalidRadius(u32),

    /// A string that is not a lowercase hexadecimal hash.
    #[error("invalid hash string: {0:?}")]
    InvalidHash(String),
}
