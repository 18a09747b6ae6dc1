//! Convolution renormalized by the weight of the in-bounds taps.
//!
//! Near the border only the taps that land inside the image contribute, and
//! the sum is divided by their combined weight rather than the full kernel sum.
//! Integer outputs round as `(total + weight / 2) / weight`; a zero in-bounds
//! weight yields zero.

use vk_core::{Accum, ImageView, ImageViewMut, Pixel};

use crate::border::ring;
use crate::inner::{assert_same_dims, interior};
use crate::{Kernel1D, Kernel2D};

pub fn horizontal<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    for y in 0..src.height() {
        let row = src.row(y);
        for (x, o) in dst.row_mut(y).iter_mut().enumerate() {
            let (total, weight) = weighted_horizontal(kernel, row, x);
            *o = D::from_acc(Accum::normalize(total, weight));
        }
    }
}

/// Border ring of [`horizontal`]; the interior is left untouched.
pub fn horizontal_border<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    let cols = ring(src.width(), kernel.extent());
    for y in 0..src.height() {
        let row = src.row(y);
        let out = dst.row_mut(y);
        for x in cols.clone() {
            let (total, weight) = weighted_horizontal(kernel, row, x);
            out[x] = D::from_acc(Accum::normalize(total, weight));
        }
    }
}

pub fn vertical<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    vertical_rows(kernel, src, dst, 0..src.height());
}

pub fn vertical_border<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    vertical_rows(kernel, src, dst, ring(src.height(), kernel.extent()));
}

/// Vertical pass dividing by `weight_x * weight_y`.
///
/// Finishes a separable normalized blur whose horizontal pass with `kernel_x`
/// was left undivided: `weight_x` is the in-bounds weight that pass had at
/// each column.
pub fn vertical_pair<S, D>(
    kernel_x: &Kernel1D<S::Acc>,
    kernel_y: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    let width = src.width();
    let weights_x: Vec<S::Acc> = (0..width)
        .map(|x| in_bounds_weight(kernel_x.data(), x, kernel_x.offset(), width))
        .collect();

    let mut acc = vec![S::Acc::ZERO; width];
    for y in 0..src.height() {
        let weight_y = weighted_rows(kernel_y, src, y, &mut acc);
        for ((o, &total), &wx) in dst.row_mut(y).iter_mut().zip(&acc).zip(&weights_x) {
            *o = D::from_acc(Accum::normalize(total, wx * weight_y));
        }
    }
}

pub fn convolve<S, D>(
    kernel: &Kernel2D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    for y in 0..src.height() {
        for (x, o) in dst.row_mut(y).iter_mut().enumerate() {
            let (total, weight) = weighted_2d(kernel, src, x, y);
            *o = D::from_acc(Accum::normalize(total, weight));
        }
    }
}

pub fn convolve_border<S, D>(
    kernel: &Kernel2D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    let width = src.width();
    let rows = interior(src.height(), kernel.extent());
    let cols = interior(width, kernel.extent());

    for y in 0..src.height() {
        let out = dst.row_mut(y);
        let skip = if rows.contains(&y) && !cols.is_empty() {
            cols.clone()
        } else {
            0..0
        };
        for x in (0..skip.start).chain(skip.end..width) {
            let (total, weight) = weighted_2d(kernel, src, x, y);
            out[x] = D::from_acc(Accum::normalize(total, weight));
        }
    }
}

fn vertical_rows<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    rows: impl Iterator<Item = usize>,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    let mut acc = vec![S::Acc::ZERO; src.width()];
    for y in rows {
        let weight = weighted_rows(kernel, src, y, &mut acc);
        for (o, &total) in dst.row_mut(y).iter_mut().zip(&acc) {
            *o = D::from_acc(Accum::normalize(total, weight));
        }
    }
}

/// Sum of the taps of `taps` (aligned at `offset` on position `i`) that land in `[0, len)`.
pub(crate) fn in_bounds_weight<A: Accum>(taps: &[A], i: usize, offset: usize, len: usize) -> A {
    let mut weight = A::ZERO;
    for (j, &k) in taps.iter().enumerate() {
        if (i + j).checked_sub(offset).is_some_and(|s| s < len) {
            weight += k;
        }
    }
    weight
}

/// `(total, weight)` over the in-bounds taps centered on column `x` of `row`.
pub(crate) fn weighted_horizontal<S: Pixel>(
    kernel: &Kernel1D<S::Acc>,
    row: &[S],
    x: usize,
) -> (S::Acc, S::Acc) {
    let mut total = S::Acc::ZERO;
    let mut weight = S::Acc::ZERO;
    for (j, &k) in kernel.data().iter().enumerate() {
        if let Some(sx) = (x + j).checked_sub(kernel.offset())
            && let Some(&v) = row.get(sx)
        {
            total += k * v.to_acc();
            weight += k;
        }
    }
    (total, weight)
}

/// Fills `acc` with the in-bounds vertical sums at row `y` and returns their weight.
pub(crate) fn weighted_rows<S: Pixel>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    y: usize,
    acc: &mut [S::Acc],
) -> S::Acc {
    acc.fill(S::Acc::ZERO);
    let mut weight = S::Acc::ZERO;
    for (j, &k) in kernel.data().iter().enumerate() {
        let Some(sy) = (y + j).checked_sub(kernel.offset()) else {
            continue;
        };
        if sy >= src.height() {
            break;
        }
        for (a, &v) in acc.iter_mut().zip(src.row(sy)) {
            *a += k * v.to_acc();
        }
        weight += k;
    }
    weight
}

pub(crate) fn weighted_2d<S: Pixel>(
    kernel: &Kernel2D<S::Acc>,
    src: &ImageView<'_, S>,
    x: usize,
    y: usize,
) -> (S::Acc, S::Acc) {
    let mut total = S::Acc::ZERO;
    let mut weight = S::Acc::ZERO;
    for ky in 0..kernel.width() {
        let Some(sy) = (y + ky).checked_sub(kernel.offset()) else {
            continue;
        };
        if sy >= src.height() {
            break;
        }
        let row = src.row(sy);
        for (kx, &k) in kernel.row(ky).iter().enumerate() {
            if let Some(sx) = (x + kx).checked_sub(kernel.offset())
                && let Some(&v) = row.get(sx)
            {
                total += k * v.to_acc();
                weight += k;
            }
        }
    }
    (total, weight)
}
