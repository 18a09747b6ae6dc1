//! Interior-only convolution.
//!
//! Only pixels whose full kernel support lies inside the image are written;
//! the border ring is left untouched. Odd kernel widths 3..=11 take fixed-size
//! loops the compiler can unroll, everything else goes through the general loop.

use core::ops::Range;

use vk_core::{
    Accum, Execution, ImageView, ImageViewMut, Pixel, for_each_row_in_init, for_each_row_init,
};

use crate::{Kernel1D, Kernel2D};

pub fn horizontal<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    divisor: Option<S::Acc>,
    exec: Execution,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    horizontal_impl(kernel, src, dst, divisor, exec, true);
}

/// [`horizontal`] without the fixed-width loops.
pub fn horizontal_standard<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    divisor: Option<S::Acc>,
    exec: Execution,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    horizontal_impl(kernel, src, dst, divisor, exec, false);
}

/// Vertical pass, visiting memory row by row.
pub fn vertical<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    divisor: Option<S::Acc>,
    exec: Execution,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    vertical_impl(kernel, src, dst, divisor, exec, true);
}

pub fn vertical_standard<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    divisor: Option<S::Acc>,
    exec: Execution,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    vertical_impl(kernel, src, dst, divisor, exec, false);
}

pub fn convolve<S, D>(
    kernel: &Kernel2D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    divisor: Option<S::Acc>,
    exec: Execution,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    convolve_impl(kernel, src, dst, divisor, exec, true);
}

pub fn convolve_standard<S, D>(
    kernel: &Kernel2D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    divisor: Option<S::Acc>,
    exec: Execution,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    convolve_impl(kernel, src, dst, divisor, exec, false);
}

fn horizontal_impl<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    divisor: Option<S::Acc>,
    exec: Execution,
    unrolled: bool,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    let cols = interior(src.width(), kernel.extent());
    if cols.is_empty() {
        return;
    }

    let taps = kernel.data();
    let scratch = || vec![S::Acc::ZERO; cols.len()];
    for_each_row_init(dst, exec, scratch, |acc, y, out| {
        acc.fill(S::Acc::ZERO);
        accumulate_row(taps, src.row(y), acc, unrolled);
        store(acc, &mut out[cols.clone()], divisor);
    });
}

fn vertical_impl<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    divisor: Option<S::Acc>,
    exec: Execution,
    unrolled: bool,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    let rows = interior(src.height(), kernel.extent());
    if rows.is_empty() || src.width() == 0 {
        return;
    }

    let taps = kernel.data();
    let offset = kernel.offset();
    let scratch = || vec![S::Acc::ZERO; src.width()];
    for_each_row_in_init(dst, rows, exec, scratch, |acc, y, out| {
        acc.fill(S::Acc::ZERO);
        accumulate_column(taps, src, y - offset, acc, unrolled);
        store(acc, out, divisor);
    });
}

fn convolve_impl<S, D>(
    kernel: &Kernel2D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    divisor: Option<S::Acc>,
    exec: Execution,
    unrolled: bool,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    let rows = interior(src.height(), kernel.extent());
    let cols = interior(src.width(), kernel.extent());
    if rows.is_empty() || cols.is_empty() {
        return;
    }

    let offset = kernel.offset();
    let scratch = || vec![S::Acc::ZERO; cols.len()];
    for_each_row_in_init(dst, rows, exec, scratch, |acc, y, out| {
        acc.fill(S::Acc::ZERO);
        for ky in 0..kernel.width() {
            accumulate_row(kernel.row(ky), src.row(y + ky - offset), acc, unrolled);
        }
        store(acc, &mut out[cols.clone()], divisor);
    });
}

pub(crate) fn assert_same_dims<S, D>(src: &ImageView<'_, S>, dst: &ImageViewMut<'_, D>) {
    assert_eq!(
        (src.width(), src.height()),
        (dst.width(), dst.height()),
        "src and dst must have equal dims"
    );
}

/// Output positions whose support `[i - before, i + after]` lies in `[0, len)`.
pub(crate) fn interior(len: usize, (before, after): (usize, usize)) -> Range<usize> {
    let end = len.saturating_sub(after);
    before.min(end)..end
}

#[inline]
pub(crate) fn finish<D: Pixel>(acc: D::Acc, divisor: Option<D::Acc>) -> D {
    match divisor {
        Some(d) => D::from_acc(Accum::normalize(acc, d)),
        None => D::from_acc(acc),
    }
}

fn store<D: Pixel>(acc: &[D::Acc], out: &mut [D], divisor: Option<D::Acc>) {
    for (o, &a) in out.iter_mut().zip(acc) {
        *o = finish(a, divisor);
    }
}

/// Adds `Σ taps[j] * row[i + j]` to `acc[i]`; `acc` is `row.len() - taps.len() + 1` long.
fn accumulate_row<S: Pixel>(taps: &[S::Acc], row: &[S], acc: &mut [S::Acc], unrolled: bool) {
    debug_assert_eq!(acc.len() + taps.len(), row.len() + 1);
    if unrolled {
        match taps.len() {
            3 => return accumulate_row_fixed::<3, S>(taps, row, acc),
            5 => return accumulate_row_fixed::<5, S>(taps, row, acc),
            7 => return accumulate_row_fixed::<7, S>(taps, row, acc),
            9 => return accumulate_row_fixed::<9, S>(taps, row, acc),
            11 => return accumulate_row_fixed::<11, S>(taps, row, acc),
            _ => {}
        }
    }

    for (a, window) in acc.iter_mut().zip(row.windows(taps.len())) {
        for (&k, &v) in taps.iter().zip(window) {
            *a += k * v.to_acc();
        }
    }
}

fn accumulate_row_fixed<const N: usize, S: Pixel>(taps: &[S::Acc], row: &[S], acc: &mut [S::Acc]) {
    let taps: [S::Acc; N] = core::array::from_fn(|j| taps[j]);
    assert!(acc.len() + N <= row.len() + 1, "row too short for kernel");

    let src = row.as_ptr();
    // SAFETY: the largest offset read is `(acc.len() - 1) + (N - 1)`, which is
    // below `row.len()` by the assert above.
    unsafe {
        for (i, a) in acc.iter_mut().enumerate() {
            let mut sum = *a;
            for (j, &k) in taps.iter().enumerate() {
                sum += k * (*src.add(i + j)).to_acc();
            }
            *a = sum;
        }
    }
}

/// Adds `Σ taps[j] * src(x, top + j)` to `acc[x]` for every column.
fn accumulate_column<S: Pixel>(
    taps: &[S::Acc],
    src: &ImageView<'_, S>,
    top: usize,
    acc: &mut [S::Acc],
    unrolled: bool,
) {
    if unrolled {
        match taps.len() {
            3 => return accumulate_column_fixed::<3, S>(taps, src, top, acc),
            5 => return accumulate_column_fixed::<5, S>(taps, src, top, acc),
            7 => return accumulate_column_fixed::<7, S>(taps, src, top, acc),
            9 => return accumulate_column_fixed::<9, S>(taps, src, top, acc),
            11 => return accumulate_column_fixed::<11, S>(taps, src, top, acc),
            _ => {}
        }
    }

    for (j, &k) in taps.iter().enumerate() {
        for (a, &v) in acc.iter_mut().zip(src.row(top + j)) {
            *a += k * v.to_acc();
        }
    }
}

fn accumulate_column_fixed<const N: usize, S: Pixel>(
    taps: &[S::Acc],
    src: &ImageView<'_, S>,
    top: usize,
    acc: &mut [S::Acc],
) {
    let taps: [S::Acc; N] = core::array::from_fn(|j| taps[j]);
    let rows: [&[S]; N] = core::array::from_fn(|j| src.row(top + j));
    assert!(acc.len() <= src.width(), "accumulator wider than image");

    for (x, a) in acc.iter_mut().enumerate() {
        let mut sum = *a;
        for (&k, row) in taps.iter().zip(&rows) {
            // SAFETY: every row is `src.width()` long and `x < acc.len() <= src.width()`.
            sum += k * unsafe { *row.get_unchecked(x) }.to_acc();
        }
        *a = sum;
    }
}
