//! Turning the low-frequency block into bits, and bits into the hex fingerprint.
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoefficientMatrix, HashError, Result};

/// What to do with the last group of bits when the bit count is not a multiple of 4.
///
/// This only matters for hash sizes whose square is odd or `2 mod 4`; the default `8 x 8`
/// hash is exactly 16 nibbles either way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrailingNibble {
    /// Emit the trailing partial group only if it holds at least one set bit.
    ///
    /// This is how fingerprints have always been encoded, so it is the default; note that hash
    /// lengths then depend on the image for such sizes.
    #[default]
    DropZero,
    /// Always emit the trailing partial group, giving a fixed `ceil(bits / 4)` characters.
    Pad,
}

/// The median used as the threshold: the element at `len / 2` after sorting ascending.
///
/// For even lengths this is the upper of the two middle values, not their mean.
pub(crate) fn upper_median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted.get(sorted.len() / 2).copied()
}

/// One bit per value, set iff the value is strictly greater than the median.
pub(crate) fn threshold_bits(values: &[f64]) -> Vec<bool> {
    let Some(median) = upper_median(values) else {
        return Vec::new();
    };
    values.iter().map(|&v| v > median).collect()
}

/// Encode bits most-significant first, four to a lowercase hex digit.
pub(crate) fn bits_to_hex(bits: &[bool], trailing: TrailingNibble) -> String {
    let mut hex = String::with_capacity((bits.len() + 3) / 4);

    for nibble in bits.chunks(4) {
        let value = nibble
            .iter()
            .fold(0u32, |acc, &bit| (acc << 1) | u32::from(bit));

        // a short final group keeps its bits in the low end of the digit
        if nibble.len() < 4 && value == 0 && trailing == TrailingNibble::DropZero {
            break;
        }

        if let Some(digit) = char::from_digit(value, 16) {
            hex.push(digit);
        }
    }

    hex
}

/// A perceptual hash: a lowercase hexadecimal string.
///
/// Compare hashes with [`ImageHash::dist()`] or the [`matcher`](crate::matcher) functions,
/// never by string equality alone; and only compare hashes made with the same configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageHash {
    hex: String,
}

impl ImageHash {
    pub(crate) fn from_bits(bits: &[bool], trailing: TrailingNibble) -> Self {
        ImageHash {
            hex: bits_to_hex(bits, trailing),
        }
    }

    /// Encode the top-left `hash_size x hash_size` block of `coeffs`: one bit per coefficient,
    /// set iff it is above the block's upper median, written out as hex nibbles.
    ///
    /// `hash_size` is clamped to the matrix dimensions.
    pub fn from_coefficients(
        coeffs: &CoefficientMatrix,
        hash_size: usize,
        trailing: TrailingNibble,
    ) -> Self {
        let bits = threshold_bits(&coeffs.low_freq_block(hash_size));
        Self::from_bits(&bits, trailing)
    }

    /// Parse a hash from its hex form.
    ///
    /// ## Errors
    /// `InvalidHash` if the string contains anything but `0-9` and `a-f`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        if !hex
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(HashError::InvalidHash(hex.to_owned()));
        }
        Ok(ImageHash {
            hex: hex.to_owned(),
        })
    }

    /// The hex form of this hash.
    pub fn as_str(&self) -> &str {
        &self.hex
    }

    /// Length in hex characters.
    pub fn len(&self) -> usize {
        self.hex.len()
    }

    /// `true` if no digit was emitted, as for a `1 x 1` hash under [`TrailingNibble::DropZero`].
    pub fn is_empty(&self) -> bool {
        self.hex.is_empty()
    }

    /// Calculate the distance between this and `other`; see [`matcher::distance()`](crate::matcher::distance).
    ///
    /// ## Errors
    /// `LengthMismatch` if the two hashes differ in length.
    pub fn dist(&self, other: &Self) -> Result<u32> {
        crate::matcher::distance(&self.hex, &other.hex)
    }

    /// Unwrap into the hex string.
    pub fn into_string(self) -> String {
        self.hex
    }
}

impl fmt::Display for ImageHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

impl AsRef<str> for ImageHash {
    fn as_ref(&self) -> &str {
        &self.hex
    }
}

impl FromStr for ImageHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for ImageHash {
    type Error = HashError;

    fn try_from(hex: String) -> Result<Self> {
        Self::from_hex(&hex)
    }
}

impl From<ImageHash> for String {
    fn from(hash: ImageHash) -> String {
        hash.hex
    }
}
