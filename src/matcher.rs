//! Distance between hashes and top-K ranking of candidate hashes against a query.
//!
//! ```rust
//! use image_phash::matcher::{self, HeapMatcher, ImageMatcher};
//!
//! let candidates = ["0f0f", "ffff", "0f0e"];
//! let best = HeapMatcher.find_top_x_most_similar("0f0f", &candidates, 2).unwrap();
//!
//! assert_eq!(best[0].index(), 0);
//! assert_eq!(best[1].index(), 2);
//! // character codes 0x66 and 0x65 differ in two bits
//! assert_eq!(matcher::distance("0f0f", "0f0e").unwrap(), 2);
//! ```
use std::collections::BinaryHeap;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{HashError, Result};

/// Distance between two hashes of equal length.
///
/// Sums, over each pair of aligned characters, the number of set bits in the XOR of their
/// character codes. Identical hashes are at distance 0 and the measure is symmetric.
///
/// Note that this runs over the character codes, not the decoded nibbles, so hashes are only
/// comparable through this function and never through any other bit distance.
///
/// ## Errors
/// `LengthMismatch` if the hashes differ in character count. Hashes are never truncated or
/// padded to make them comparable.
pub fn distance(a: &str, b: &str) -> Result<u32> {
    let (left, right) = (a.chars().count(), b.chars().count());
    if left != right {
        return Err(HashError::LengthMismatch { left, right });
    }

    Ok(a.chars()
        .zip(b.chars())
        .map(|(x, y)| (u32::from(x) ^ u32::from(y)).count_ones())
        .sum())
}

/// One ranked candidate: its position in the candidate list, the hash itself, and its
/// distance to the query.
///
/// The distance is a `u32` rather than a float: it counts differing bits, so it is always a
/// non-negative integer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashSearchResult {
    index: usize,
    hash: String,
    distance: u32,
}

impl HashSearchResult {
    /// Position of this candidate in the collection that was searched.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The candidate hash.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Distance from the query hash, in bits.
    pub fn distance(&self) -> u32 {
        self.distance
    }
}

/// Distance and ranking over hash strings.
///
/// Results are ordered by ascending distance; candidates at equal distance are ordered by
/// their index, so every implementation returns the same list for the same input.
pub trait ImageMatcher {
    /// Distance between two hashes; see [`distance()`].
    ///
    /// ## Errors
    /// `LengthMismatch` if the hashes differ in length.
    fn distance(&self, a: &str, b: &str) -> Result<u32> {
        distance(a, b)
    }

    /// The `top_x` candidates closest to `target`, closest first.
    ///
    /// Returns `min(top_x, candidates.len())` results; `top_x == 0` returns nothing.
    ///
    /// ## Errors
    /// `LengthMismatch` if any candidate differs in length from `target`.
    fn find_top_x_most_similar<S>(
        &self,
        target: &str,
        candidates: &[S],
        top_x: usize,
    ) -> Result<Vec<HashSearchResult>>
    where
        S: AsRef<str> + Sync;
}

// Ordered by distance, then index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Ranked {
    distance: u32,
    index: usize,
}

fn to_results<S: AsRef<str>>(ranked: Vec<Ranked>, candidates: &[S]) -> Vec<HashSearchResult> {
    ranked
        .into_iter()
        .map(|r| HashSearchResult {
            index: r.index,
            hash: candidates[r.index].as_ref().to_owned(),
            distance: r.distance,
        })
        .collect()
}

/// Bounded max-heap selection: `O(N log K)` time, `O(K)` memory.
///
/// The heap holds the best `top_x` candidates seen so far and replaces its worst entry
/// whenever a strictly better one arrives.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapMatcher;

impl ImageMatcher for HeapMatcher {
    fn find_top_x_most_similar<S>(
        &self,
        target: &str,
        candidates: &[S],
        top_x: usize,
    ) -> Result<Vec<HashSearchResult>>
    where
        S: AsRef<str> + Sync,
    {
        if top_x == 0 {
            return Ok(Vec::new());
        }

        let mut heap = BinaryHeap::with_capacity(top_x.min(candidates.len()));
        for (index, candidate) in candidates.iter().enumerate() {
            let ranked = Ranked {
                distance: self.distance(target, candidate.as_ref())?,
                index,
            };

            if heap.len() < top_x {
                heap.push(ranked);
            } else if let Some(mut worst) = heap.peek_mut() {
                if ranked < *worst {
                    *worst = ranked;
                }
            }
        }

        debug!("kept {} of {} candidates", heap.len(), candidates.len());
        Ok(to_results(heap.into_sorted_vec(), candidates))
    }
}

/// Scores every candidate in parallel with `rayon`, then sorts them all.
///
/// Faster than [`HeapMatcher`] when `top_x` is close to the number of candidates, or when
/// there are enough candidates for the distance computations to be worth spreading out.
#[derive(Clone, Copy, Debug, Default)]
pub struct SortMatcher;

impl ImageMatcher for SortMatcher {
    fn find_top_x_most_similar<S>(
        &self,
        target: &str,
        candidates: &[S],
        top_x: usize,
    ) -> Result<Vec<HashSearchResult>>
    where
        S: AsRef<str> + Sync,
    {
        if top_x == 0 {
            return Ok(Vec::new());
        }

        let mut ranked = candidates
            .par_iter()
            .enumerate()
            .map(|(index, candidate)| -> Result<Ranked> {
                Ok(Ranked {
                    distance: distance(target, candidate.as_ref())?,
                    index,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // (distance, index) pairs are unique, so an unstable sort is still deterministic
        ranked.sort_unstable();
        ranked.truncate(top_x);

        debug!("kept {} of {} candidates", ranked.len(), candidates.len());
        Ok(to_results(ranked, candidates))
    }
}

/// [`HeapMatcher::find_top_x_most_similar()`] as a free function.
///
/// ## Errors
/// `LengthMismatch` if any candidate differs in length from `target`.
pub fn find_top_x_most_similar<S>(
    target: &str,
    candidates: &[S],
    top_x: usize,
) -> Result<Vec<HashSearchResult>>
where
    S: AsRef<str> + Sync,
{
    HeapMatcher.find_top_x_most_similar(target, candidates, top_x)
}
