use log::debug;
use serde::{Deserialize, Serialize};
use vk_core::{Accum, BorderMode, Error, Execution, Image, ImageView, Pixel};

use crate::{Kernel1D, Kernel2D, border, inner, naive, normalized};

/// How pixels whose kernel support leaves the image are produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BorderPolicy<T> {
    /// Only the interior is written; border pixels keep their previous value.
    Skip,
    /// Out-of-range taps are remapped through the border mode.
    Extend(BorderMode<T>),
    /// Output is divided by the weight of the taps that land inside the image.
    Normalized,
}

/// Horizontal 1D convolution; `dst` is reshaped to the size of `src`.
///
/// Output `x` is `Σ kernel[j] * src[x - offset + j]`.
pub fn horizontal<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut Image<D>,
    border: BorderPolicy<S>,
    exec: Execution,
) -> Result<(), Error>
where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    let divisor = normalized_divisor(kernel.sum(), &border)?;
    dst.reshape(src.width(), src.height());
    let mut out = dst.as_view_mut();
    let oversized = kernel.width() >= src.width();

    match border {
        BorderPolicy::Skip => inner::horizontal(kernel, src, &mut out, None, exec),
        BorderPolicy::Extend(mode) if oversized => {
            debug!(
                "horizontal: kernel width {} >= image width {}, naive path",
                kernel.width(),
                src.width()
            );
            naive::horizontal(kernel, src, &mut out, &mode);
        }
        BorderPolicy::Extend(mode) => {
            inner::horizontal(kernel, src, &mut out, None, exec);
            border::horizontal(kernel, src, &mut out, &mode);
        }
        BorderPolicy::Normalized if oversized => {
            debug!(
                "horizontal: kernel width {} >= image width {}, full renormalization",
                kernel.width(),
                src.width()
            );
            normalized::horizontal(kernel, src, &mut out);
        }
        BorderPolicy::Normalized => {
            inner::horizontal(kernel, src, &mut out, divisor, exec);
            normalized::horizontal_border(kernel, src, &mut out);
        }
    }
    Ok(())
}

/// Vertical 1D convolution; `dst` is reshaped to the size of `src`.
pub fn vertical<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut Image<D>,
    border: BorderPolicy<S>,
    exec: Execution,
) -> Result<(), Error>
where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    let divisor = normalized_divisor(kernel.sum(), &border)?;
    dst.reshape(src.width(), src.height());
    let mut out = dst.as_view_mut();
    let oversized = kernel.width() >= src.height();

    match border {
        BorderPolicy::Skip => inner::vertical(kernel, src, &mut out, None, exec),
        BorderPolicy::Extend(mode) if oversized => {
            debug!(
                "vertical: kernel width {} >= image height {}, naive path",
                kernel.width(),
                src.height()
            );
            naive::vertical(kernel, src, &mut out, &mode);
        }
        BorderPolicy::Extend(mode) => {
            inner::vertical(kernel, src, &mut out, None, exec);
            border::vertical(kernel, src, &mut out, &mode);
        }
        BorderPolicy::Normalized if oversized => {
            debug!(
                "vertical: kernel width {} >= image height {}, full renormalization",
                kernel.width(),
                src.height()
            );
            normalized::vertical(kernel, src, &mut out);
        }
        BorderPolicy::Normalized => {
            inner::vertical(kernel, src, &mut out, divisor, exec);
            normalized::vertical_border(kernel, src, &mut out);
        }
    }
    Ok(())
}

/// Non-separable 2D convolution; `dst` is reshaped to the size of `src`.
pub fn convolve<S, D>(
    kernel: &Kernel2D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut Image<D>,
    border: BorderPolicy<S>,
    exec: Execution,
) -> Result<(), Error>
where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    let divisor = normalized_divisor(kernel.sum(), &border)?;
    dst.reshape(src.width(), src.height());
    let mut out = dst.as_view_mut();
    let oversized = kernel.width() >= src.width() || kernel.width() >= src.height();

    match border {
        BorderPolicy::Skip => inner::convolve(kernel, src, &mut out, None, exec),
        BorderPolicy::Extend(mode) if oversized => {
            debug!(
                "convolve: kernel width {} >= image {}x{}, naive path",
                kernel.width(),
                src.width(),
                src.height()
            );
            naive::convolve(kernel, src, &mut out, &mode);
        }
        BorderPolicy::Extend(mode) => {
            inner::convolve(kernel, src, &mut out, None, exec);
            border::convolve(kernel, src, &mut out, &mode);
        }
        BorderPolicy::Normalized if oversized => {
            debug!(
                "convolve: kernel width {} >= image {}x{}, full renormalization",
                kernel.width(),
                src.width(),
                src.height()
            );
            normalized::convolve(kernel, src, &mut out);
        }
        BorderPolicy::Normalized => {
            inner::convolve(kernel, src, &mut out, divisor, exec);
            normalized::convolve_border(kernel, src, &mut out);
        }
    }
    Ok(())
}

fn normalized_divisor<A: Accum, T>(sum: A, border: &BorderPolicy<T>) -> Result<Option<A>, Error> {
    match border {
        BorderPolicy::Normalized if sum == A::ZERO => Err(Error::InvalidParameter(
            "normalized convolution needs a kernel with non-zero sum",
        )),
        BorderPolicy::Normalized => Ok(Some(sum)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use vk_core::{BorderMode, Error, Execution, Image};

    use super::{BorderPolicy, convolve, horizontal, vertical};
    use crate::{Kernel1D, Kernel2D, naive};

    fn random_f32(width: usize, height: usize, seed: u64) -> Image<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..width * height).map(|_| rng.gen_range(-1.0..1.0f32)).collect();
        Image::from_vec(width, height, data).expect("valid image")
    }

    #[test]
    fn box_blur_of_constant_nine() {
        let src = Image::new_fill(5, 5, 9u8);
        let k = Kernel1D::<i32>::box_filter(1);
        let mut dst = Image::new_fill(0, 0, 0u8);

        horizontal(
            &k,
            &src.as_view(),
            &mut dst,
            BorderPolicy::Normalized,
            Execution::Sequential,
        )
        .expect("non-zero sum");
        assert!(dst.data().iter().all(|&v| v == 9));

        vertical(
            &k,
            &src.as_view(),
            &mut dst,
            BorderPolicy::Normalized,
            Execution::Parallel,
        )
        .expect("non-zero sum");
        assert!(dst.data().iter().all(|&v| v == 9));
    }

    #[test]
    fn skip_leaves_border_untouched() {
        let src = Image::new_fill(4, 3, 2i32);
        let mut dst = Image::new_fill(4, 3, -5i32);
        let k = Kernel2D::from_vec(3, 1, vec![1; 9]).expect("valid");
        convolve(
            &k,
            &src.as_view(),
            &mut dst,
            BorderPolicy::Skip,
            Execution::Sequential,
        )
        .expect("skip never fails");
        assert_eq!(
            dst.data(),
            &[-5, -5, -5, -5, -5, 18, 18, -5, -5, -5, -5, -5]
        );
    }

    #[test]
    fn extend_matches_naive_reference() {
        let src = random_f32(16, 11, 9);
        let k = Kernel1D::gaussian(1.5, None).expect("valid");
        let k2 = Kernel2D::from_separable(&k, &k).expect("valid");

        let modes = [BorderMode::Clamp, BorderMode::Reflect101, BorderMode::zero()];
        for mode in modes {
            for exec in [Execution::Sequential, Execution::Parallel] {
                let mut fast = Image::new_fill(0, 0, 0.0f32);
                let mut reference = Image::new_fill(16, 11, 0.0f32);

                horizontal(
                    &k,
                    &src.as_view(),
                    &mut fast,
                    BorderPolicy::Extend(mode),
                    exec,
                )
                .expect("extend never fails");
                naive::horizontal(&k, &src.as_view(), &mut reference.as_view_mut(), &mode);
                assert_eq!(fast, reference);

                vertical(
                    &k,
                    &src.as_view(),
                    &mut fast,
                    BorderPolicy::Extend(mode),
                    exec,
                )
                .expect("extend never fails");
                naive::vertical(&k, &src.as_view(), &mut reference.as_view_mut(), &mode);
                assert_eq!(fast, reference);

                convolve(
                    &k2,
                    &src.as_view(),
                    &mut fast,
                    BorderPolicy::Extend(mode),
                    exec,
                )
                .expect("extend never fails");
                naive::convolve(&k2, &src.as_view(), &mut reference.as_view_mut(), &mode);
                assert_eq!(fast, reference);
            }
        }
    }

    #[test]
    fn kernel_wider_than_image_uses_every_pixel() {
        let src = Image::from_vec(3, 1, vec![3i32, 6, 9]).expect("valid");
        let k = Kernel1D::<i32>::box_filter(3);
        let mut dst = Image::new_fill(0, 0, 0i32);

        horizontal(
            &k,
            &src.as_view(),
            &mut dst,
            BorderPolicy::Extend(BorderMode::Clamp),
            Execution::Sequential,
        )
        .expect("extend never fails");
        // x = 0 sees 3 x4, 6, 9 x2.
        assert_eq!(
            dst.data(),
            &[4 * 3 + 6 + 2 * 9, 3 * 3 + 6 + 3 * 9, 2 * 3 + 6 + 4 * 9]
        );

        horizontal(
            &k,
            &src.as_view(),
            &mut dst,
            BorderPolicy::Normalized,
            Execution::Sequential,
        )
        .expect("non-zero sum");
        assert_eq!(dst.data(), &[6, 6, 6]);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let src = random_f32(33, 41, 1);
        let k = Kernel1D::from_vec(vec![0.25f32, 0.5, 0.25, 0.1], 1).expect("valid");
        let policies = [
            BorderPolicy::Skip,
            BorderPolicy::Extend(BorderMode::Wrap),
            BorderPolicy::Normalized,
        ];
        for policy in policies {
            let mut a = Image::new_fill(33, 41, 0.0f32);
            let mut b = Image::new_fill(33, 41, 0.0f32);
            vertical(&k, &src.as_view(), &mut a, policy, Execution::Sequential).expect("valid");
            vertical(&k, &src.as_view(), &mut b, policy, Execution::Parallel).expect("valid");
            assert_eq!(a, b, "{policy:?}");
        }
    }

    #[test]
    fn normalized_rejects_zero_sum_kernel() {
        let src = Image::new_fill(4, 4, 1i32);
        let k = Kernel1D::from_vec(vec![-1, 0, 1], 1).expect("valid");
        let mut dst = Image::new_fill(0, 0, 0i32);
        assert!(matches!(
            horizontal(
                &k,
                &src.as_view(),
                &mut dst,
                BorderPolicy::Normalized,
                Execution::Sequential,
            ),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn policy_serializes_with_mode() {
        let policy = BorderPolicy::Extend(BorderMode::Constant(3u8));
        let json = serde_json::to_string(&policy).expect("serialize");
        let back: BorderPolicy<u8> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, policy);
    }
}
