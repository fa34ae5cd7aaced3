//! The 2D type-II discrete cosine transform over a grid of intensities.
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use rustdct::{DctPlanner, TransformType2And3};
use serde::{Deserialize, Serialize};

use crate::{LumaSource, PixelGrid};

/// How the 2D DCT is computed.
///
/// Both produce the same coefficients up to accumulated floating point error, so hashes only
/// differ when a coefficient sits within that error of the median.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DctAlg {
    /// The direct double sum, `O(W²H²)`. Cosine terms are tabulated but the summation order is
    /// the textbook one, so results are reproducible across implementations.
    #[default]
    Direct,
    /// Separable row/column transforms through `rustdct`, `O(WH log(WH))`.
    Separable,
}

/// Frequency coefficients of a `width x height` grid, indexed by horizontal frequency `u` and
/// vertical frequency `v`.
#[derive(Clone, Debug, PartialEq)]
pub struct CoefficientMatrix {
    width: usize,
    height: usize,
    // u-major: coeffs[u * height + v]
    coeffs: Vec<f64>,
}

impl CoefficientMatrix {
    /// Number of horizontal frequencies.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of vertical frequencies.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Coefficient for horizontal frequency `u`, vertical frequency `v`.
    ///
    /// ### Panics
    /// If `u >= width` or `v >= height`.
    pub fn get(&self, u: usize, v: usize) -> f64 {
        assert!(u < self.width && v < self.height, "({u}, {v}) out of bounds");
        self.coeffs[u * self.height + v]
    }

    /// The top-left `size x size` block, flattened with `u` as the outer index.
    ///
    /// `size` is clamped to the matrix dimensions.
    pub fn low_freq_block(&self, size: usize) -> Vec<f64> {
        let (cols, rows) = (size.min(self.width), size.min(self.height));
        let mut block = Vec::with_capacity(cols * rows);
        for u in 0..cols {
            let start = u * self.height;
            block.extend_from_slice(&self.coeffs[start..start + rows]);
        }
        block
    }
}

/// Compute the DCT of `grid`, reading each pixel through `luma`.
///
/// Builds the transform tables on every call; [`Hasher`](crate::Hasher) keeps them around
/// instead.
pub fn transform(grid: &PixelGrid, luma: LumaSource, alg: DctAlg) -> CoefficientMatrix {
    let ctxt = DctCtxt::new(grid.width() as usize, grid.height() as usize, alg);
    ctxt.dct_2d(&samples(grid, luma))
}

/// Intensities of `grid` in row-major order.
pub(crate) fn samples(grid: &PixelGrid, luma: LumaSource) -> Vec<f64> {
    grid.as_rgb_image()
        .pixels()
        .map(|&p| luma.intensity(p))
        .collect()
}

/// `sqrt(1/N)` for the DC term, `sqrt(2/N)` otherwise.
fn scale(k: usize, n: usize) -> f64 {
    if k == 0 {
        (1.0 / n as f64).sqrt()
    } else {
        (2.0 / n as f64).sqrt()
    }
}

/// `cos((2x + 1) k π / 2N)` for every `k, x < N`, k-major.
fn cosine_table(n: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(n * n);
    for k in 0..n {
        for x in 0..n {
            table.push((((2 * x + 1) * k) as f64 * PI / (2 * n) as f64).cos());
        }
    }
    table
}

enum Plan {
    Direct {
        cos_x: Vec<f64>,
        cos_y: Vec<f64>,
    },
    Separable {
        row_dct: Arc<dyn TransformType2And3<f64>>,
        col_dct: Arc<dyn TransformType2And3<f64>>,
        scratch_len: usize,
    },
}

/// Precomputed state for transforming grids of one fixed size.
pub(crate) struct DctCtxt {
    width: usize,
    height: usize,
    plan: Plan,
}

impl DctCtxt {
    pub fn new(width: usize, height: usize, alg: DctAlg) -> Self {
        let plan = match alg {
            DctAlg::Direct => Plan::Direct {
                cos_x: cosine_table(width),
                cos_y: cosine_table(height),
            },
            DctAlg::Separable => {
                let mut planner = DctPlanner::new();
                let row_dct = planner.plan_dct2(width);
                let col_dct = planner.plan_dct2(height);
                let scratch_len = row_dct.get_scratch_len().max(col_dct.get_scratch_len());
                Plan::Separable {
                    row_dct,
                    col_dct,
                    scratch_len,
                }
            }
        };

        DctCtxt {
            width,
            height,
            plan,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Transform `width * height` row-major samples.
    pub fn dct_2d(&self, samples: &[f64]) -> CoefficientMatrix {
        let (width, height) = (self.width, self.height);
        debug_assert_eq!(samples.len(), width * height);

        let coeffs = match self.plan {
            Plan::Direct {
                ref cos_x,
                ref cos_y,
            } => {
                let mut coeffs = vec![0.0; width * height];
                for u in 0..width {
                    let cos_u = &cos_x[u * width..(u + 1) * width];
                    for v in 0..height {
                        let cos_v = &cos_y[v * height..(v + 1) * height];
                        let mut sum = 0.0;
                        for (x, &cx) in cos_u.iter().enumerate() {
                            for (y, &cy) in cos_v.iter().enumerate() {
                                sum += samples[y * width + x] * (cx * cy);
                            }
                        }
                        coeffs[u * height + v] = scale(u, width) * scale(v, height) * sum;
                    }
                }
                coeffs
            }
            Plan::Separable {
                ref row_dct,
                ref col_dct,
                scratch_len,
            } => {
                let mut scratch = vec![0.0; scratch_len];

                let mut rows = samples.to_vec();
                for row in rows.chunks_exact_mut(width) {
                    row_dct.process_dct2_with_scratch(row, &mut scratch);
                }

                // after transposing, each chunk is one horizontal frequency across all rows
                let mut coeffs = vec![0.0; width * height];
                transpose::transpose(&rows, &mut coeffs, width, height);
                for (u, column) in coeffs.chunks_exact_mut(height).enumerate() {
                    col_dct.process_dct2_with_scratch(column, &mut scratch);
                    for (v, c) in column.iter_mut().enumerate() {
                        *c *= scale(u, width) * scale(v, height);
                    }
                }
                coeffs
            }
        };

        CoefficientMatrix {
            width,
            height,
            coeffs,
        }
    }
}

impl fmt::Debug for DctCtxt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let alg = match self.plan {
            Plan::Direct { .. } => DctAlg::Direct,
            Plan::Separable { .. } => DctAlg::Separable,
        };
        f.debug_struct("DctCtxt")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("alg", &alg)
            .finish()
    }
}
