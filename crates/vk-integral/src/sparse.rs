use vk_core::{Accum, Execution, Image, ImageView, for_each_row};

use crate::block::{block_sum_clamped, block_sum_unchecked};
use crate::kernel::IntegralKernel;

/// `Σ scale * block_sum_clamped(block + (x, y))`; an empty kernel gives zero.
pub fn convolve_sparse<S: Accum>(
    integral: &ImageView<'_, S>,
    kernel: &IntegralKernel,
    x: isize,
    y: isize,
) -> S {
    let mut total = S::ZERO;
    for (b, scale) in kernel.iter() {
        let sum = block_sum_clamped(
            integral,
            x + b.x0 as isize,
            y + b.y0 as isize,
            x + b.x1 as isize,
            y + b.y1 as isize,
        );
        total += sum * S::from_i32(scale);
    }
    total
}

/// [`convolve_sparse`] reading the integral image without bounds checks.
///
/// # Safety
/// Every shifted block corner must lie inside `integral`, i.e. `x + x0 >= 0`
/// and `x + x1 < width` for every block, and likewise along y.
pub unsafe fn convolve_sparse_unchecked<S: Accum>(
    integral: &ImageView<'_, S>,
    kernel: &IntegralKernel,
    x: usize,
    y: usize,
) -> S {
    let mut total = S::ZERO;
    for (b, scale) in kernel.iter() {
        let shift = |p: usize, d: i32| (p as isize + d as isize) as usize;
        // SAFETY: Caller guarantees every shifted corner is inside the view.
        let sum = unsafe {
            block_sum_unchecked(
                integral,
                shift(x, b.x0),
                shift(y, b.y0),
                shift(x, b.x1),
                shift(y, b.y1),
            )
        };
        total += sum * S::from_i32(scale);
    }
    total
}

/// Applies `kernel` at every pixel; `output` is reshaped to the integral size.
pub fn convolve<S: Accum>(
    integral: &ImageView<'_, S>,
    kernel: &IntegralKernel,
    output: &mut Image<S>,
    exec: Execution,
) {
    output.reshape(integral.width(), integral.height());
    for_each_row(&mut output.as_view_mut(), exec, |y, out| {
        for (x, o) in out.iter_mut().enumerate() {
            *o = convolve_sparse(integral, kernel, x as isize, y as isize);
        }
    });
}
