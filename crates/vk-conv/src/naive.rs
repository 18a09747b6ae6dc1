//! Reference convolution: every pixel, every tap index-mapped.
//!
//! Also the fallback when a kernel is at least as wide as the image.

use vk_core::{BorderMode, ImageView, ImageViewMut, Pixel};

use crate::border::{convolve_region, horizontal_region, vertical_region};
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
    horizontal_region(kernel, src, dst, mode, true);
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
    vertical_region(kernel, src, dst, mode, true);
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
    convolve_region(kernel, src, dst, mode, true);
}
