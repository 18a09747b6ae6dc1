//! Normalized convolution evaluated at every `skip`-th pixel.
//!
//! Output sizes are `(w / skip, h)`, `(w, h / skip)` and `(w / skip, h / skip)`.
//! Output pixel `i` is the normalized response at source position `i * skip`.

use vk_core::{Accum, Error, Image, ImageView, Pixel};

use crate::normalized::{weighted_2d, weighted_horizontal, weighted_rows};
use crate::{Kernel1D, Kernel2D};

pub fn horizontal<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut Image<D>,
    skip: usize,
) -> Result<(), Error>
where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    check_skip(skip)?;
    dst.reshape(src.width() / skip, src.height());

    let mut out = dst.as_view_mut();
    for y in 0..src.height() {
        let row = src.row(y);
        for (i, o) in out.row_mut(y).iter_mut().enumerate() {
            let (total, weight) = weighted_horizontal(kernel, row, i * skip);
            *o = D::from_acc(Accum::normalize(total, weight));
        }
    }
    Ok(())
}

pub fn vertical<S, D>(
    kernel: &Kernel1D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut Image<D>,
    skip: usize,
) -> Result<(), Error>
where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    check_skip(skip)?;
    dst.reshape(src.width(), src.height() / skip);

    let mut out = dst.as_view_mut();
    let mut acc = vec![S::Acc::ZERO; src.width()];
    for i in 0..out.height() {
        let weight = weighted_rows(kernel, src, i * skip, &mut acc);
        for (o, &total) in out.row_mut(i).iter_mut().zip(&acc) {
            *o = D::from_acc(Accum::normalize(total, weight));
        }
    }
    Ok(())
}

pub fn convolve<S, D>(
    kernel: &Kernel2D<S::Acc>,
    src: &ImageView<'_, S>,
    dst: &mut Image<D>,
    skip: usize,
) -> Result<(), Error>
where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    check_skip(skip)?;
    dst.reshape(src.width() / skip, src.height() / skip);

    let mut out = dst.as_view_mut();
    for i in 0..out.height() {
        for (j, o) in out.row_mut(i).iter_mut().enumerate() {
            let (total, weight) = weighted_2d(kernel, src, j * skip, i * skip);
            *o = D::from_acc(Accum::normalize(total, weight));
        }
    }
    Ok(())
}

fn check_skip(skip: usize) -> Result<(), Error> {
    if skip == 0 {
        return Err(Error::InvalidParameter("skip must be >= 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use vk_core::{Error, Image};

    use super::{convolve, horizontal, vertical};
    use crate::{Kernel1D, Kernel2D};

    #[test]
    fn output_shapes_follow_skip() {
        let src = Image::new_fill(9, 7, 3u8);
        let k = Kernel1D::<i32>::box_filter(2);
        let k2 = Kernel2D::from_separable(&k, &k).expect("valid");
        let mut dst = Image::new_fill(0, 0, 0u8);

        horizontal(&k, &src.as_view(), &mut dst, 2).expect("valid skip");
        assert_eq!((dst.width(), dst.height()), (4, 7));
        vertical(&k, &src.as_view(), &mut dst, 2).expect("valid skip");
        assert_eq!((dst.width(), dst.height()), (9, 3));
        convolve(&k2, &src.as_view(), &mut dst, 3).expect("valid skip");
        assert_eq!((dst.width(), dst.height()), (3, 2));
    }

    #[test]
    fn constant_image_stays_constant() {
        let src = Image::new_fill(10, 8, 0.25f32);
        let k = Kernel1D::gaussian(1.0, Some(3)).expect("valid");
        let k2 = Kernel2D::from_separable(&k, &k).expect("valid");
        let mut dst = Image::new_fill(0, 0, 0.0f32);

        horizontal(&k, &src.as_view(), &mut dst, 2).expect("valid skip");
        dst.data().iter().for_each(|&v| assert_relative_eq!(v, 0.25, epsilon = 1e-6));
        vertical(&k, &src.as_view(), &mut dst, 2).expect("valid skip");
        dst.data().iter().for_each(|&v| assert_relative_eq!(v, 0.25, epsilon = 1e-6));
        convolve(&k2, &src.as_view(), &mut dst, 2).expect("valid skip");
        dst.data().iter().for_each(|&v| assert_relative_eq!(v, 0.25, epsilon = 1e-6));
    }

    #[test]
    fn samples_every_skip_th_position() {
        let src = Image::from_vec(6, 1, vec![0i32, 10, 20, 30, 40, 50]).expect("valid");
        let k = Kernel1D::from_vec(vec![1], 0).expect("valid");
        let mut dst = Image::new_fill(0, 0, 0i32);
        horizontal(&k, &src.as_view(), &mut dst, 2).expect("valid skip");
        assert_eq!(dst.data(), &[0, 20, 40]);
    }

    #[test]
    fn zero_skip_is_rejected() {
        let src = Image::new_fill(4, 4, 1u8);
        let k = Kernel1D::<i32>::box_filter(1);
        let mut dst = Image::new_fill(0, 0, 0u8);
        assert_eq!(
            horizontal(&k, &src.as_view(), &mut dst, 0),
            Err(Error::InvalidParameter("skip must be >= 1"))
        );
    }
}
