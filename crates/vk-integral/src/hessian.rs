//! Determinant-of-Hessian response from box filters on an integral image.
//!
//! `intensity = (Dxx * Dyy - 0.81 * Dxy^2) / size^4`, evaluated at source
//! pixel `(x * skip, y * skip)` for every output pixel `(x, y)`.

use log::debug;
use serde::{Deserialize, Serialize};
use vk_core::{Accum, Error, Execution, Image, ImageView, for_each_row};

use crate::kernel::{IntegralKernel, Support, check_size};
use crate::sparse::{convolve_sparse, convolve_sparse_unchecked};

/// Relative weight of the mixed term compensating the box approximation.
const DXY_WEIGHT: f64 = 0.81;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HessianConfig {
    /// Box filter size, one of 9, 15, 21, ...
    pub size: usize,
    pub skip: usize,
    pub execution: Execution,
}

impl Default for HessianConfig {
    fn default() -> Self {
        Self {
            size: 9,
            skip: 1,
            execution: Execution::Sequential,
        }
    }
}

impl HessianConfig {
    pub fn intensity<S: Accum>(
        &self,
        integral: &ImageView<'_, S>,
        out: &mut Image<f32>,
    ) -> Result<(), Error> {
        hessian_intensity(integral, self.skip, self.size, out, self.execution)
    }
}

struct HessianKernels {
    xx: IntegralKernel,
    yy: IntegralKernel,
    xy: IntegralKernel,
    norm: f64,
}

impl HessianKernels {
    fn new(size: usize) -> Result<Self, Error> {
        check_size(size)?;
        let s2 = (size * size) as f64;
        Ok(Self {
            xx: IntegralKernel::hessian_xx(size)?,
            yy: IntegralKernel::hessian_yy(size)?,
            xy: IntegralKernel::hessian_xy(size)?,
            norm: 1.0 / s2,
        })
    }

    fn support(&self) -> Option<Support> {
        let a = self.xx.support()?;
        let b = self.yy.support()?;
        let c = self.xy.support()?;
        Some(Support {
            x_min: a.x_min.min(b.x_min).min(c.x_min),
            y_min: a.y_min.min(b.y_min).min(c.y_min),
            x_max: a.x_max.max(b.x_max).max(c.x_max),
            y_max: a.y_max.max(b.y_max).max(c.y_max),
        })
    }

    #[inline]
    fn combine<S: Accum>(&self, dxx: S, dyy: S, dxy: S) -> f32 {
        let dxx = dxx.to_f64() * self.norm;
        let dyy = dyy.to_f64() * self.norm;
        let dxy = dxy.to_f64() * self.norm;
        (dxx * dyy - DXY_WEIGHT * dxy * dxy) as f32
    }

    fn clamped<S: Accum>(&self, integral: &ImageView<'_, S>, x: usize, y: usize) -> f32 {
        let (x, y) = (x as isize, y as isize);
        self.combine(
            convolve_sparse(integral, &self.xx, x, y),
            convolve_sparse(integral, &self.yy, x, y),
            convolve_sparse(integral, &self.xy, x, y),
        )
    }

    /// # Safety
    /// Every corner of the three kernels shifted to `(x, y)` must be inside `integral`.
    unsafe fn unchecked<S: Accum>(&self, integral: &ImageView<'_, S>, x: usize, y: usize) -> f32 {
        // SAFETY: forwarded from the caller.
        unsafe {
            self.combine(
                convolve_sparse_unchecked(integral, &self.xx, x, y),
                convolve_sparse_unchecked(integral, &self.yy, x, y),
                convolve_sparse_unchecked(integral, &self.xy, x, y),
            )
        }
    }
}

/// Hessian intensity with unchecked block reads wherever the kernels fit.
///
/// `out` is reshaped to `(width / skip, height / skip)`. Pixels whose kernels
/// leave the image use clamped block sums.
pub fn hessian_intensity<S: Accum>(
    integral: &ImageView<'_, S>,
    skip: usize,
    size: usize,
    out: &mut Image<f32>,
    exec: Execution,
) -> Result<(), Error> {
    let kernels = prepare(integral, skip, size, out)?;
    let Some(support) = kernels.support() else {
        return Ok(());
    };
    let (w, h) = (integral.width() as i64, integral.height() as i64);
    let inside_x = |x: i64| x + i64::from(support.x_min) >= 0 && x + i64::from(support.x_max) < w;
    let inside_y = |y: i64| y + i64::from(support.y_min) >= 0 && y + i64::from(support.y_max) < h;

    for_each_row(&mut out.as_view_mut(), exec, |oy, row| {
        let y = oy * skip;
        let row_inside = inside_y(y as i64);
        for (ox, o) in row.iter_mut().enumerate() {
            let x = ox * skip;
            *o = if row_inside && inside_x(x as i64) {
                // SAFETY: the support box of all three kernels shifted to (x, y)
                // lies inside the integral image.
                unsafe { kernels.unchecked(integral, x, y) }
            } else {
                kernels.clamped(integral, x, y)
            };
        }
    });
    Ok(())
}

/// Reference Hessian intensity using clamped block sums everywhere.
pub fn hessian_intensity_naive<S: Accum>(
    integral: &ImageView<'_, S>,
    skip: usize,
    size: usize,
    out: &mut Image<f32>,
) -> Result<(), Error> {
    let kernels = prepare(integral, skip, size, out)?;
    let mut view = out.as_view_mut();
    for (oy, row) in view.rows_mut() {
        for (ox, o) in row.iter_mut().enumerate() {
            *o = kernels.clamped(integral, ox * skip, oy * skip);
        }
    }
    Ok(())
}

fn prepare<S>(
    integral: &ImageView<'_, S>,
    skip: usize,
    size: usize,
    out: &mut Image<f32>,
) -> Result<HessianKernels, Error> {
    if skip == 0 {
        return Err(Error::InvalidParameter("skip must be >= 1"));
    }
    let kernels = HessianKernels::new(size)?;
    out.reshape(integral.width() / skip, integral.height() / skip);
    debug!(
        "hessian size {size} skip {skip}: {}x{} -> {}x{}",
        integral.width(),
        integral.height(),
        out.width(),
        out.height()
    );
    Ok(kernels)
}
