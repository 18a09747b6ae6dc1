//! Separable convolution evaluated at a single pixel.

use vk_core::{Accum, ImageView, Pixel};

use crate::Kernel1D;

/// Horizontal pass over the `kernel_v.width()` rows of support, then the vertical dot product.
///
/// `storage` must hold at least `kernel_v.width()` values. The caller
/// guarantees the full support of both kernels lies inside `src`.
pub fn convolve_at<S: Pixel>(
    kernel_h: &Kernel1D<S::Acc>,
    kernel_v: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    x: usize,
    y: usize,
    storage: &mut [S::Acc],
) -> S::Acc {
    horizontal_into(kernel_h, kernel_v, src, x, y, storage, None);
    dot(kernel_v.data(), storage)
}

/// [`convolve_at`] with each pass divided, rounding as `(total + div / 2) / div`.
#[allow(clippy::too_many_arguments)]
pub fn convolve_at_divided<S: Pixel>(
    kernel_h: &Kernel1D<S::Acc>,
    kernel_v: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    x: usize,
    y: usize,
    storage: &mut [S::Acc],
    div_h: S::Acc,
    div_v: S::Acc,
) -> S::Acc {
    horizontal_into(kernel_h, kernel_v, src, x, y, storage, Some(div_h));
    Accum::normalize(dot(kernel_v.data(), storage), div_v)
}

fn horizontal_into<S: Pixel>(
    kernel_h: &Kernel1D<S::Acc>,
    kernel_v: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    x: usize,
    y: usize,
    storage: &mut [S::Acc],
    divisor: Option<S::Acc>,
) {
    debug_assert!(x >= kernel_h.offset() && y >= kernel_v.offset());
    debug_assert!(x + kernel_h.width() - kernel_h.offset() <= src.width());
    debug_assert!(y + kernel_v.width() - kernel_v.offset() <= src.height());

    let x0 = x - kernel_h.offset();
    let y0 = y - kernel_v.offset();
    for (i, slot) in storage[..kernel_v.width()].iter_mut().enumerate() {
        let row = &src.row(y0 + i)[x0..x0 + kernel_h.width()];
        let total = dot_pixels(kernel_h.data(), row);
        *slot = match divisor {
            Some(d) => Accum::normalize(total, d),
            None => total,
        };
    }
}

fn dot_pixels<S: Pixel>(taps: &[S::Acc], samples: &[S]) -> S::Acc {
    let mut total = S::Acc::ZERO;
    for (&k, &v) in taps.iter().zip(samples) {
        total += k * v.to_acc();
    }
    total
}

fn dot<A: Accum>(taps: &[A], values: &[A]) -> A {
    let mut total = A::ZERO;
    for (&k, &v) in taps.iter().zip(values) {
        total += k * v;
    }
    total
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use vk_core::{Execution, Image};

    use super::{convolve_at, convolve_at_divided};
    use crate::{Kernel1D, inner};

    #[test]
    fn matches_dense_separable_pass() {
        let mut rng = StdRng::seed_from_u64(42);
        let data = (0..15 * 12).map(|_| rng.gen_range(0..=255u8)).collect();
        let src = Image::from_vec(15, 12, data).expect("valid");
        let kh = Kernel1D::from_vec(vec![1, 4, 6, 4, 1], 2).expect("valid");
        let kv = Kernel1D::from_vec(vec![-1, 0, 1], 1).expect("valid");

        let mut tmp = Image::new_fill(15, 12, 0i32);
        let mut dense = Image::new_fill(15, 12, 0i32);
        inner::horizontal(
            &kh,
            &src.as_view(),
            &mut tmp.as_view_mut(),
            None,
            Execution::Sequential,
        );
        inner::vertical(
            &kv,
            &tmp.as_view(),
            &mut dense.as_view_mut(),
            None,
            Execution::Sequential,
        );

        let mut storage = vec![0i32; kv.width()];
        for y in 1..11 {
            for x in 2..13 {
                let v = convolve_at(&kh, &kv, &src.as_view(), x, y, &mut storage);
                assert_eq!(Some(&v), dense.get(x, y), "({x}, {y})");
            }
        }
    }

    #[test]
    fn divided_rounds_each_pass() {
        let src = Image::new_fill(5, 5, 7u8);
        let k = Kernel1D::<i32>::box_filter(1);
        let mut storage = [0i32; 3];
        let v = convolve_at_divided(&k, &k, &src.as_view(), 2, 2, &mut storage, 3, 3);
        assert_eq!(v, 7);
        assert_eq!(storage, [7, 7, 7]);
    }
}
