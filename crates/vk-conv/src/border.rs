//! Border ring convolution with every tap remapped through [`map_index`].
//!
//! Pairs with [`crate::inner`], which covers the interior. The same per-pixel
//! routines evaluated over the whole image are the naive reference.

use vk_core::{Accum, BorderMode, ImageView, ImageViewMut, Pixel, map_index};

use crate::inner::{assert_same_dims, interior};
use crate::{Kernel1D, Kernel2D};

pub fn horizontal<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    mode: &BorderMode<S>,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    horizontal_region(kernel, src, dst, mode, false);
}

pub fn vertical<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    mode: &BorderMode<S>,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    vertical_region(kernel, src, dst, mode, false);
}

pub fn convolve<S, D>(
    kernel: &Kernel2D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    mode: &BorderMode<S>,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    convolve_region(kernel, src, dst, mode, false);
}

/// Positions outside `interior(len, extent)`; every position when the interior is empty.
pub(crate) fn ring(len: usize, extent: (usize, usize)) -> impl Iterator<Item = usize> + Clone {
    let inner = interior(len, extent);
    let (lo, hi) = if inner.is_empty() {
        (len, len)
    } else {
        (inner.start, inner.end)
    };
    (0..lo).chain(hi..len)
}

fn fill_value<S: Pixel>(mode: &BorderMode<S>) -> S::Acc {
    match mode {
        BorderMode::Constant(c) => c.to_acc(),
        _ => S::Acc::ZERO,
    }
}

fn horizontal_at<S: Pixel>(
    kernel: &Kernel1D<S::Acc>,
    row: &[S],
    x: usize,
    mode: &BorderMode<S>,
    fill: S::Acc,
) -> S::Acc {
    let base = x as isize - kernel.offset() as isize;
    let mut acc = S::Acc::ZERO;
    for (j, &k) in kernel.data().iter().enumerate() {
        let v = map_index(base + j as isize, row.len(), mode).map_or(fill, |i| row[i].to_acc());
        acc += k * v;
    }
    acc
}

pub(crate) fn horizontal_region<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    mode: &BorderMode<S>,
    everywhere: bool,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    let width = src.width();
    let fill = fill_value(mode);
    let (lo, hi) = if everywhere {
        (width, width)
    } else {
        let inner = interior(width, kernel.extent());
        if inner.is_empty() {
            (width, width)
        } else {
            (inner.start, inner.end)
        }
    };

    for y in 0..src.height() {
        let row = src.row(y);
        let out = dst.row_mut(y);
        for x in (0..lo).chain(hi..width) {
            out[x] = D::from_acc(horizontal_at(kernel, row, x, mode, fill));
        }
    }
}

pub(crate) fn vertical_region<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    mode: &BorderMode<S>,
    everywhere: bool,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    let (width, height) = (src.width(), src.height());
    let fill = fill_value(mode);
    let rows: Vec<usize> = if everywhere {
        (0..height).collect()
    } else {
        ring(height, kernel.extent()).collect()
    };

    let mut acc = vec![S::Acc::ZERO; width];
    for y in rows {
        acc.fill(S::Acc::ZERO);
        let base = y as isize - kernel.offset() as isize;
        for (j, &k) in kernel.data().iter().enumerate() {
            match map_index(base + j as isize, height, mode) {
                Some(sy) => {
                    for (a, &v) in acc.iter_mut().zip(src.row(sy)) {
                        *a += k * v.to_acc();
                    }
                }
                None => {
                    let kv = k * fill;
                    for a in &mut acc {
                        *a += kv;
                    }
                }
            }
        }
        for (o, &a) in dst.row_mut(y).iter_mut().zip(&acc) {
            *o = D::from_acc(a);
        }
    }
}

fn convolve_at<S: Pixel>(
    kernel: &Kernel2D<S::Acc>,
    src: &ImageView<'_, S>,
    x: usize,
    y: usize,
    mode: &BorderMode<S>,
    fill: S::Acc,
) -> S::Acc {
    let (width, height) = (src.width(), src.height());
    let bx = x as isize - kernel.offset() as isize;
    let by = y as isize - kernel.offset() as isize;

    let mut acc = S::Acc::ZERO;
    for ky in 0..kernel.width() {
        let taps = kernel.row(ky);
        let Some(sy) = map_index(by + ky as isize, height, mode) else {
            for &k in taps {
                acc += k * fill;
            }
            continue;
        };
        let row = src.row(sy);
        for (kx, &k) in taps.iter().enumerate() {
            let v = map_index(bx + kx as isize, width, mode).map_or(fill, |i| row[i].to_acc());
            acc += k * v;
        }
    }
    acc
}

pub(crate) fn convolve_region<S, D>(
    kernel: &Kernel2D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut ImageViewMut<'_, D>,
    mode: &BorderMode<S>,
    everywhere: bool,
) where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    assert_same_dims(src, dst);
    let (width, height) = (src.width(), src.height());
    let fill = fill_value(mode);
    let rows = interior(height, kernel.extent());
    let cols = interior(width, kernel.extent());

    for y in 0..height {
        let inner_row = !everywhere && rows.contains(&y) && !cols.is_empty();
        let out = dst.row_mut(y);
        if inner_row {
            for x in (0..cols.start).chain(cols.end..width) {
                out[x] = D::from_acc(convolve_at(kernel, src, x, y, mode, fill));
            }
        } else {
            for (x, o) in out.iter_mut().enumerate() {
                *o = D::from_acc(convolve_at(kernel, src, x, y, mode, fill));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use vk_core::{BorderMode, Execution, Image};

    use super::{convolve, horizontal, ring, vertical};
    use crate::{Kernel1D, Kernel2D, inner, naive};

    #[test]
    fn ring_covers_complement_of_interior() {
        assert_eq!(ring(6, (1, 1)).collect::<Vec<_>>(), vec![0, 5]);
        assert_eq!(ring(6, (0, 2)).collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(ring(3, (2, 2)).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn extend_clamps_edge_samples() {
        let src = Image::from_vec(4, 1, vec![1i32, 2, 3, 4]).expect("valid");
        let mut dst = Image::new_fill(4, 1, 0i32);
        let k = Kernel1D::from_vec(vec![1, 1, 1], 1).expect("valid");
        horizontal(
            &k,
            &src.as_view(),
            &mut dst.as_view_mut(),
            &BorderMode::Clamp,
        );
        assert_eq!(dst.data(), &[4, 0, 0, 11]);
    }

    #[test]
    fn constant_border_substitutes_value() {
        let src = Image::from_vec(1, 3, vec![1i32, 2, 3]).expect("valid");
        let mut dst = Image::new_fill(1, 3, 0i32);
        let k = Kernel1D::from_vec(vec![1, 1, 1], 1).expect("valid");
        vertical(
            &k,
            &src.as_view(),
            &mut dst.as_view_mut(),
            &BorderMode::Constant(10),
        );
        assert_eq!(dst.data(), &[13, 0, 15]);
    }

    #[test]
    fn inner_plus_border_equals_naive() {
        let data = (0..8 * 7i32).map(|v| (v * 37) % 23).collect();
        let src = Image::from_vec(8, 7, data).expect("valid");
        let k1 = Kernel1D::from_vec(vec![1, -2, 3, 1], 2).expect("valid");
        let k2 = Kernel2D::from_vec(3, 1, vec![1, 2, 0, -1, 4, 1, 2, 0, -3]).expect("valid");

        for mode in [
            BorderMode::Clamp,
            BorderMode::Reflect101,
            BorderMode::Wrap,
            BorderMode::Constant(5),
        ] {
            let mut split = Image::new_fill(8, 7, 0i32);
            let mut reference = Image::new_fill(8, 7, 0i32);

            inner::horizontal(
                &k1,
                &src.as_view(),
                &mut split.as_view_mut(),
                None,
                Execution::Sequential,
            );
            horizontal(&k1, &src.as_view(), &mut split.as_view_mut(), &mode);
            naive::horizontal(&k1, &src.as_view(), &mut reference.as_view_mut(), &mode);
            assert_eq!(split, reference, "horizontal {mode:?}");

            inner::vertical(
                &k1,
                &src.as_view(),
                &mut split.as_view_mut(),
                None,
                Execution::Parallel,
            );
            vertical(&k1, &src.as_view(), &mut split.as_view_mut(), &mode);
            naive::vertical(&k1, &src.as_view(), &mut reference.as_view_mut(), &mode);
            assert_eq!(split, reference, "vertical {mode:?}");

            inner::convolve(
                &k2,
                &src.as_view(),
                &mut split.as_view_mut(),
                None,
                Execution::Sequential,
            );
            convolve(&k2, &src.as_view(), &mut split.as_view_mut(), &mode);
            naive::convolve(&k2, &src.as_view(), &mut reference.as_view_mut(), &mode);
            assert_eq!(split, reference, "convolve {mode:?}");
        }
    }
}
