//! Integral images and block-kernel sums.
//!
//! The integral image `I` of an input `B` holds `I[x, y] = Σ B[x', y']` over
//! `x' <= x`, `y' <= y`. Any axis-aligned block sum then costs four reads.
//!
//! ## Corner Convention
//! Block `(x0, y0, x1, y1)` covers `x0 < x <= x1`, `y0 < y <= y1`. Corners at
//! `-1` read zero; [`region_sum`] takes a half-open pixel rectangle instead.
//!
//! ## Checked and Unchecked Queries
//! [`block_sum`] validates its corners and is the default.
//! [`block_sum_clamped`] tolerates any rectangle. [`block_sum_unchecked`] and
//! [`convolve_sparse_unchecked`] skip all checks and are `unsafe`.

mod block;
mod hessian;
mod kernel;
mod sparse;
mod transform;

pub use block::{block_sum, block_sum_clamped, block_sum_unchecked, region_sum};
pub use hessian::{HessianConfig, hessian_intensity, hessian_intensity_naive};
pub use kernel::{ImageRectangle, IntegralKernel};
pub use sparse::{convolve, convolve_sparse, convolve_sparse_unchecked};
pub use transform::{IntegralImage, transform, transform_with};
