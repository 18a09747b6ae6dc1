//! Rectangular sums read from an integral image.
//!
//! Block corners follow the integral-image convention: `(x0, y0, x1, y1)`
//! covers the pixels with `x0 < x <= x1` and `y0 < y <= y1`, and the sum is
//! `BR - TR - BL + TL` read at the four corners. A corner at `-1` reads zero,
//! so `(-1, -1, w - 1, h - 1)` is the whole image.

use vk_core::{Accum, Error, ImageView};

/// Block sum without any bounds checks.
///
/// # Safety
/// Caller must guarantee `x0, x1 < integral.width()` and `y0, y1 < integral.height()`.
#[inline]
pub unsafe fn block_sum_unchecked<S: Accum>(
    integral: &ImageView<'_, S>,
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
) -> S {
    // SAFETY: Caller guarantees every corner is inside the view.
    unsafe {
        let br = *integral.get_unchecked(x1, y1);
        let tr = *integral.get_unchecked(x1, y0);
        let bl = *integral.get_unchecked(x0, y1);
        let tl = *integral.get_unchecked(x0, y0);
        br.wrapping_sub(tr).wrapping_sub(bl).wrapping_add(tl)
    }
}

/// Checked block sum.
///
/// Every corner coordinate must lie in `[-1, width - 1]` / `[-1, height - 1]`
/// with `x0 <= x1` and `y0 <= y1`.
pub fn block_sum<S: Accum>(
    integral: &ImageView<'_, S>,
    x0: isize,
    y0: isize,
    x1: isize,
    y1: isize,
) -> Result<S, Error> {
    let (w, h) = (integral.width() as isize, integral.height() as isize);
    let in_x = |x: isize| (-1..w).contains(&x);
    let in_y = |y: isize| (-1..h).contains(&y);
    if !(in_x(x0) && in_x(x1) && in_y(y0) && in_y(y1)) {
        return Err(Error::OutOfBounds);
    }
    if x0 > x1 || y0 > y1 {
        return Err(Error::InvalidParameter(
            "block corners must satisfy x0 <= x1 and y0 <= y1",
        ));
    }

    Ok(combine(integral, x0, y0, x1, y1))
}

/// Sum over the half-open pixel rectangle `[x, x + width) x [y, y + height)`.
pub fn region_sum<S: Accum>(
    integral: &ImageView<'_, S>,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> Result<S, Error> {
    if width == 0 || height == 0 {
        if x <= integral.width() && y <= integral.height() {
            return Ok(S::ZERO);
        }
        return Err(Error::OutOfBounds);
    }
    block_sum(
        integral,
        x as isize - 1,
        y as isize - 1,
        (x + width) as isize - 1,
        (y + height) as isize - 1,
    )
}

/// Block sum tolerant of rectangles partly or entirely outside the image.
///
/// Corners are clamped to the last column and row; a corner with a negative
/// coordinate reads zero. Rectangles entirely outside sum to zero.
pub fn block_sum_clamped<S: Accum>(
    integral: &ImageView<'_, S>,
    x0: isize,
    y0: isize,
    x1: isize,
    y1: isize,
) -> S {
    let (w, h) = (integral.width() as isize, integral.height() as isize);
    let x0 = x0.min(w - 1);
    let y0 = y0.min(h - 1);
    let x1 = x1.min(w - 1);
    let y1 = y1.min(h - 1);

    combine(integral, x0, y0, x1, y1)
}

/// `BR - TR - BL + TL` in wrapping arithmetic; the wrap cancels for block
/// totals that fit in `S`.
#[inline]
fn combine<S: Accum>(integral: &ImageView<'_, S>, x0: isize, y0: isize, x1: isize, y1: isize) -> S {
    corner(integral, x1, y1)
        .wrapping_sub(corner(integral, x1, y0))
        .wrapping_sub(corner(integral, x0, y1))
        .wrapping_add(corner(integral, x0, y0))
}

/// Integral value at a corner already clamped to at most the last column and row.
#[inline]
fn corner<S: Accum>(integral: &ImageView<'_, S>, x: isize, y: isize) -> S {
    if x < 0 || y < 0 {
        return S::ZERO;
    }
    integral.get(x as usize, y as usize).copied().unwrap_or(S::ZERO)
}
