use vk_core::{Accum, Error, Execution, Image, ImageView, IntegralPixel, for_each_row};

/// Writes the integral image of `input` into `output`, reshaping it to match.
///
/// `output[x, y] = Σ input[x', y']` over `x' <= x`, `y' <= y`, accumulated in
/// the widened [`IntegralPixel::Sum`] type. Integer sums wrap on overflow;
/// block sums taken from them stay exact while the block total fits.
pub fn transform<T: IntegralPixel>(input: &ImageView<'_, T>, output: &mut Image<T::Sum>) {
    transform_with(input, output, Execution::Sequential);
}

/// [`transform`] with an explicit execution strategy.
///
/// The parallel path computes every row's running sum concurrently, then adds
/// the row above in a sequential top-down pass. Both paths give identical output.
pub fn transform_with<T: IntegralPixel>(
    input: &ImageView<'_, T>,
    output: &mut Image<T::Sum>,
    exec: Execution,
) {
    let (width, height) = (input.width(), input.height());
    output.reshape(width, height);
    if width == 0 || height == 0 {
        return;
    }

    match exec {
        Execution::Sequential => {
            let data = output.data_mut();
            for y in 0..height {
                let (above, rest) = data.split_at_mut(y * width);
                let out = &mut rest[..width];
                let mut run = T::Sum::ZERO;
                if y == 0 {
                    for (o, &v) in out.iter_mut().zip(input.row(y)) {
                        run = run.wrapping_add(v.to_sum());
                        *o = run;
                    }
                } else {
                    let prev = &above[(y - 1) * width..];
                    for ((o, &v), &p) in out.iter_mut().zip(input.row(y)).zip(prev) {
                        run = run.wrapping_add(v.to_sum());
                        *o = run.wrapping_add(p);
                    }
                }
            }
        }
        Execution::Parallel => {
            for_each_row(&mut output.as_view_mut(), exec, |y, out| {
                let mut run = T::Sum::ZERO;
                for (o, &v) in out.iter_mut().zip(input.row(y)) {
                    run = run.wrapping_add(v.to_sum());
                    *o = run;
                }
            });

            let data = output.data_mut();
            for y in 1..height {
                let (above, rest) = data.split_at_mut(y * width);
                let prev = &above[(y - 1) * width..];
                for (o, &p) in rest[..width].iter_mut().zip(prev) {
                    *o = o.wrapping_add(p);
                }
            }
        }
    }
}

/// Owned integral image.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegralImage<S> {
    sums: Image<S>,
}

impl<S: Accum> IntegralImage<S> {
    pub fn from_view<T>(input: &ImageView<'_, T>, exec: Execution) -> Self
    where
        T: IntegralPixel<Sum = S>,
    {
        let mut sums = Image::new_fill(0, 0, S::ZERO);
        transform_with(input, &mut sums, exec);
        Self { sums }
    }

    /// Wraps sums that already hold an integral image.
    pub fn from_sums(sums: Image<S>) -> Self {
        Self { sums }
    }

    pub fn width(&self) -> usize {
        self.sums.width()
    }

    pub fn height(&self) -> usize {
        self.sums.height()
    }

    pub fn as_view(&self) -> ImageView<'_, S> {
        self.sums.as_view()
    }

    pub fn into_image(self) -> Image<S> {
        self.sums
    }

    /// Checked block sum, see [`crate::block_sum`].
    pub fn block_sum(&self, x0: isize, y0: isize, x1: isize, y1: isize) -> Result<S, Error> {
        crate::block_sum(&self.as_view(), x0, y0, x1, y1)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use vk_core::{Execution, Image, ImageView};

    use super::{IntegralImage, transform, transform_with};
    use crate::{block_sum_clamped, block_sum_unchecked, region_sum};

    #[test]
    fn ones_give_area() {
        let img = Image::new_fill(10, 10, 1u8);
        let mut out = Image::new_fill(0, 0, 0i32);
        transform(&img.as_view(), &mut out);
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(out.get(x, y), Some(&(((x + 1) * (y + 1)) as i32)));
            }
        }
        assert_eq!(out.get(9, 9), Some(&100));
    }

    #[test]
    fn matches_brute_force_prefix_sums() {
        let mut rng = StdRng::seed_from_u64(17);
        let data = (0..13 * 9).map(|_| rng.gen_range(-500..500i16)).collect();
        let img = Image::from_vec(13, 9, data).expect("valid");
        let mut out = Image::new_fill(0, 0, 0i64);
        transform(&img.as_view(), &mut out);

        for y in 0..9 {
            for x in 0..13 {
                let mut expected = 0i64;
                for yy in 0..=y {
                    for xx in 0..=x {
                        expected += i64::from(*img.get(xx, yy).expect("in bounds"));
                    }
                }
                assert_eq!(out.get(x, y), Some(&expected));
            }
        }
    }

    #[test]
    fn sequential_equals_parallel() {
        let mut rng = StdRng::seed_from_u64(3);
        let data = (0..57 * 43).map(|_| rng.gen_range(0.0..1.0f32)).collect();
        let img = Image::from_vec(57, 43, data).expect("valid");
        let mut a = Image::new_fill(0, 0, 0.0f64);
        let mut b = Image::new_fill(0, 0, 0.0f64);
        transform_with(&img.as_view(), &mut a, Execution::Sequential);
        transform_with(&img.as_view(), &mut b, Execution::Parallel);
        assert_eq!(a, b);
    }

    #[test]
    fn strided_view_matches_contiguous_copy() {
        let mut data = vec![0u16; 3 + 6 * 4];
        for (i, v) in data.iter_mut().enumerate() {
            *v = (i * 11 % 97) as u16;
        }
        let view = ImageView::from_parts(4, 4, 6, 3, &data).expect("valid view");
        let copy: Vec<u16> = (0..4).flat_map(|y| view.row(y).to_vec()).collect();
        let copy = Image::from_vec(4, 4, copy).expect("valid");

        let mut a = Image::new_fill(0, 0, 0i64);
        let mut b = Image::new_fill(0, 0, 0i64);
        transform(&view, &mut a);
        transform_with(&copy.as_view(), &mut b, Execution::Parallel);
        assert_eq!(a, b);
    }

    #[test]
    fn float_input_accumulates_in_f64() {
        let img = Image::new_fill(2000, 1, 0.1f32);
        let integral = IntegralImage::from_view(&img.as_view(), Execution::Sequential);
        let last = *integral.as_view().get(1999, 0).expect("in bounds");
        assert_relative_eq!(last, 2000.0 * f64::from(0.1f32), epsilon = 1e-9);
        assert_eq!((integral.width(), integral.height()), (2000, 1));
    }

    #[test]
    fn i16_sums_do_not_overflow() {
        let img = Image::new_fill(300, 300, 30_000i16);
        for exec in [Execution::Sequential, Execution::Parallel] {
            let integral = IntegralImage::from_view(&img.as_view(), exec);
            let view = integral.as_view();
            assert_eq!(region_sum(&view, 0, 0, 2, 2), Ok(120_000));
            assert_eq!(region_sum(&view, 0, 0, 300, 300), Ok(2_700_000_000));
        }
    }

    #[test]
    fn saturated_u8_frame_keeps_block_sums_exact() {
        // The full-frame total exceeds i32::MAX; wrapped corners still cancel.
        let img = Image::new_fill(4096, 2160, 255u8);
        for exec in [Execution::Sequential, Execution::Parallel] {
            let integral = IntegralImage::from_view(&img.as_view(), exec);
            let view = integral.as_view();
            assert_eq!(region_sum(&view, 0, 0, 2, 2), Ok(1020));
            assert_eq!(region_sum(&view, 4094, 2158, 2, 2), Ok(1020));
            assert_eq!(region_sum(&view, 1000, 1500, 100, 100), Ok(2_550_000));
            // SAFETY: every corner lies inside the 4096x2160 integral.
            let tail = unsafe { block_sum_unchecked(&view, 3000, 2000, 4095, 2159) };
            assert_eq!(tail, 255 * 1095 * 159);
            assert_eq!(
                block_sum_clamped(&view, 4000, 2100, 5000, 3000),
                255 * 95 * 59
            );
        }
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let img = Image::<u8>::from_vec(0, 5, Vec::new()).expect("valid");
        let mut out = Image::new_fill(3, 3, 7i32);
        transform(&img.as_view(), &mut out);
        assert_eq!((out.width(), out.height()), (0, 5));
        assert!(out.data().is_empty());
    }
}
