//! Gradient-based corner responses over a square window.
//!
//! Both responses sum the structure tensor `[gx², gx·gy; gx·gy, gy²]` over a
//! `(2r + 1)²` window using integral images of the three products. Pixels
//! whose window leaves the image are 0.

use serde::{Deserialize, Serialize};
use vk_conv::{BorderPolicy, Kernel2D, convolve};
use vk_core::{Accum, BorderMode, Error, Execution, Image, ImageView, Pixel, for_each_row};
use vk_integral::{IntegralImage, block_sum_clamped};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerConfig {
    /// Window half-width.
    pub radius: usize,
    /// Harris trace weight.
    pub kappa: f32,
    pub execution: Execution,
}

impl Default for CornerConfig {
    fn default() -> Self {
        Self {
            radius: 2,
            kappa: 0.04,
            execution: Execution::Sequential,
        }
    }
}

impl CornerConfig {
    pub fn harris<G: Pixel>(
        &self,
        gx: &ImageView<'_, G>,
        gy: &ImageView<'_, G>,
        out: &mut Image<f32>,
    ) -> Result<(), Error> {
        harris_intensity(gx, gy, self.radius, self.kappa, out, self.execution)
    }

    pub fn shi_tomasi<G: Pixel>(
        &self,
        gx: &ImageView<'_, G>,
        gy: &ImageView<'_, G>,
        out: &mut Image<f32>,
    ) -> Result<(), Error> {
        shi_tomasi_intensity(gx, gy, self.radius, out, self.execution)
    }
}

/// 3x3 Sobel gradients with clamped borders; `gx` and `gy` take the size of `src`.
pub fn gradient_sobel<S, D>(
    src: &ImageView<'_, S>,
    gx: &mut Image<D>,
    gy: &mut Image<D>,
    exec: Execution,
) -> Result<(), Error>
where
    S: Pixel,
    D: Pixel<Acc = S::Acc>,
{
    let border = BorderPolicy::Extend(BorderMode::Clamp);
    convolve(&Kernel2D::sobel_x(), src, gx, border, exec)?;
    convolve(&Kernel2D::sobel_y(), src, gy, border, exec)
}

/// Harris response `det(M) - kappa * trace(M)²`.
pub fn harris_intensity<G: Pixel>(
    gx: &ImageView<'_, G>,
    gy: &ImageView<'_, G>,
    radius: usize,
    kappa: f32,
    out: &mut Image<f32>,
    exec: Execution,
) -> Result<(), Error> {
    if !kappa.is_finite() {
        return Err(Error::InvalidParameter("kappa must be finite"));
    }
    let kappa = f64::from(kappa);
    windowed(gx, gy, radius, out, exec, |sxx, syy, sxy| {
        let det = sxx * syy - sxy * sxy;
        let trace = sxx + syy;
        det - kappa * trace * trace
    })
}

/// Shi-Tomasi response, the smaller eigenvalue of the structure tensor.
pub fn shi_tomasi_intensity<G: Pixel>(
    gx: &ImageView<'_, G>,
    gy: &ImageView<'_, G>,
    radius: usize,
    out: &mut Image<f32>,
    exec: Execution,
) -> Result<(), Error> {
    windowed(gx, gy, radius, out, exec, |sxx, syy, sxy| {
        let diff = sxx - syy;
        0.5 * (sxx + syy - (diff * diff + 4.0 * sxy * sxy).sqrt())
    })
}

struct Tensor {
    xx: IntegralImage<f64>,
    yy: IntegralImage<f64>,
    xy: IntegralImage<f64>,
}

impl Tensor {
    fn new<G: Pixel>(
        gx: &ImageView<'_, G>,
        gy: &ImageView<'_, G>,
        exec: Execution,
    ) -> Result<Self, Error> {
        let (w, h) = (gx.width(), gx.height());
        let mut xx = Vec::with_capacity(w * h);
        let mut yy = Vec::with_capacity(w * h);
        let mut xy = Vec::with_capacity(w * h);
        for y in 0..h {
            for (&a, &b) in gx.row(y).iter().zip(gy.row(y)) {
                let (a, b) = (a.to_acc().to_f64(), b.to_acc().to_f64());
                xx.push(a * a);
                yy.push(b * b);
                xy.push(a * b);
            }
        }
        let integral = |data: Vec<f64>| -> Result<IntegralImage<f64>, Error> {
            let img = Image::from_vec(w, h, data)?;
            Ok(IntegralImage::from_view(&img.as_view(), exec))
        };
        Ok(Self {
            xx: integral(xx)?,
            yy: integral(yy)?,
            xy: integral(xy)?,
        })
    }
}

fn windowed<G, F>(
    gx: &ImageView<'_, G>,
    gy: &ImageView<'_, G>,
    radius: usize,
    out: &mut Image<f32>,
    exec: Execution,
    response: F,
) -> Result<(), Error>
where
    G: Pixel,
    F: Fn(f64, f64, f64) -> f64 + Send + Sync,
{
    let (w, h) = (gx.width(), gx.height());
    if (gy.width(), gy.height()) != (w, h) {
        return Err(Error::SizeMismatch {
            expected: w * h,
            actual: gy.width() * gy.height(),
        });
    }

    let tensor = Tensor::new(gx, gy, exec)?;
    let (xx, yy, xy) = (
        tensor.xx.as_view(),
        tensor.yy.as_view(),
        tensor.xy.as_view(),
    );
    out.reshape(w, h);
    for_each_row(&mut out.as_view_mut(), exec, |y, row| {
        row.fill(0.0);
        if y < radius || y + radius >= h || w <= 2 * radius {
            return;
        }
        let (y0, y1) = ((y - radius) as isize - 1, (y + radius) as isize);
        for (x, o) in row.iter_mut().enumerate().take(w - radius).skip(radius) {
            let (x0, x1) = ((x - radius) as isize - 1, (x + radius) as isize);
            let sxx = block_sum_clamped(&xx, x0, y0, x1, y1);
            let syy = block_sum_clamped(&yy, x0, y0, x1, y1);
            let sxy = block_sum_clamped(&xy, x0, y0, x1, y1);
            *o = response(sxx, syy, sxy) as f32;
        }
    });
    Ok(())
}
