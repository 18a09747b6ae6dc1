use serde::{Deserialize, Serialize};
use vk_core::{Accum, Error};

/// Serialized form shared by both kernel shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KernelParts<A> {
    width: usize,
    offset: usize,
    data: Vec<A>,
}

/// 1D weights with the index of the tap aligned to the output pixel.
///
/// Output `x` is `Σ data[j] * src[x - offset + j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "KernelParts<A>",
    bound(deserialize = "A: Deserialize<'de>")
)]
pub struct Kernel1D<A> {
    width: usize,
    offset: usize,
    data: Vec<A>,
}

impl<A> TryFrom<KernelParts<A>> for Kernel1D<A> {
    type Error = Error;

    fn try_from(parts: KernelParts<A>) -> Result<Self, Error> {
        if parts.data.len() != parts.width {
            return Err(Error::KernelShape {
                expected: parts.width,
                actual: parts.data.len(),
            });
        }
        Self::from_vec(parts.data, parts.offset)
    }
}

impl<A> Kernel1D<A> {
    pub fn from_vec(data: Vec<A>, offset: usize) -> Result<Self, Error> {
        check_offset(data.len(), offset)?;
        Ok(Self {
            width: data.len(),
            offset,
            data,
        })
    }

    /// Kernel whose center tap is `data.len() / 2`.
    pub fn centered(data: Vec<A>) -> Result<Self, Error> {
        let offset = data.len() / 2;
        Self::from_vec(data, offset)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn radius(&self) -> usize {
        self.width / 2
    }

    pub fn data(&self) -> &[A] {
        &self.data
    }

    /// Taps left of and right of the aligned tap, as `(before, after)`.
    pub(crate) fn extent(&self) -> (usize, usize) {
        (self.offset, self.width - 1 - self.offset)
    }
}

impl<A: Accum> Kernel1D<A> {
    /// Unit box of `2 * radius + 1` taps, not normalized.
    pub fn box_filter(radius: usize) -> Self {
        Self {
            width: 2 * radius + 1,
            offset: radius,
            data: vec![A::ONE; 2 * radius + 1],
        }
    }

    pub fn sum(&self) -> A {
        let mut total = A::ZERO;
        for &v in &self.data {
            total += v;
        }
        total
    }
}

macro_rules! impl_float_kernel1d {
    ($($t:ty),*) => {$(
        impl Kernel1D<$t> {
            /// Copy scaled so the taps sum to one. Zero-sum kernels are returned unchanged.
            pub fn normalized(&self) -> Self {
                let total = self.sum();
                let mut out = self.clone();
                if total != 0.0 {
                    for v in &mut out.data {
                        *v /= total;
                    }
                }
                out
            }
        }
    )*};
}

impl_float_kernel1d!(f32, f64);

impl Kernel1D<f32> {
    /// Sampled Gaussian normalized to unit sum.
    ///
    /// `radius = None` uses `ceil(3 * sigma)`, minimum 1.
    pub fn gaussian(sigma: f32, radius: Option<usize>) -> Result<Self, Error> {
        let (radius, g) = gaussian_taps(sigma, radius)?;
        Ok(Self {
            width: g.len(),
            offset: radius,
            data: g,
        })
    }

    /// First derivative of the normalized Gaussian, `-(x / sigma^2) * g(x)`.
    ///
    /// Sums to zero up to rounding; not normalized.
    pub fn gaussian_derivative(sigma: f32, radius: Option<usize>) -> Result<Self, Error> {
        let (radius, g) = gaussian_taps(sigma, radius)?;
        let sigma2 = sigma * sigma;
        let data = g
            .iter()
            .enumerate()
            .map(|(i, &gi)| {
                let x = i as f32 - radius as f32;
                -(x / sigma2) * gi
            })
            .collect::<Vec<_>>();
        Ok(Self {
            width: data.len(),
            offset: radius,
            data,
        })
    }
}

fn gaussian_taps(sigma: f32, radius: Option<usize>) -> Result<(usize, Vec<f32>), Error> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(Error::InvalidParameter("sigma must be > 0 and finite"));
    }

    let radius = radius.unwrap_or_else(|| ((3.0 * sigma).ceil() as usize).max(1));
    let sigma2 = sigma * sigma;
    let mut g = (0..2 * radius + 1)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-(x * x) / (2.0 * sigma2)).exp()
        })
        .collect::<Vec<_>>();

    let sum_g: f32 = g.iter().sum();
    for gi in &mut g {
        *gi /= sum_g;
    }
    Ok((radius, g))
}

/// Square `width x width` weights, row-major, with one `offset` for both axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "KernelParts<A>",
    bound(deserialize = "A: Deserialize<'de>")
)]
pub struct Kernel2D<A> {
    width: usize,
    offset: usize,
    data: Vec<A>,
}

impl<A> TryFrom<KernelParts<A>> for Kernel2D<A> {
    type Error = Error;

    fn try_from(parts: KernelParts<A>) -> Result<Self, Error> {
        Self::from_vec(parts.width, parts.offset, parts.data)
    }
}

impl<A> Kernel2D<A> {
    pub fn from_vec(width: usize, offset: usize, data: Vec<A>) -> Result<Self, Error> {
        check_offset(width, offset)?;
        let expected = width * width;
        if data.len() != expected {
            return Err(Error::KernelShape {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            offset,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn radius(&self) -> usize {
        self.width / 2
    }

    pub fn data(&self) -> &[A] {
        &self.data
    }

    /// Taps of kernel row `ky`.
    pub fn row(&self, ky: usize) -> &[A] {
        &self.data[ky * self.width..(ky + 1) * self.width]
    }

    pub(crate) fn extent(&self) -> (usize, usize) {
        (self.offset, self.width - 1 - self.offset)
    }
}

impl<A: Accum> Kernel2D<A> {
    pub fn get(&self, x: usize, y: usize) -> A {
        self.data[y * self.width + x]
    }

    /// Outer product `ky ⊗ kx`; both factors need the same width and offset.
    pub fn from_separable(kx: &Kernel1D<A>, ky: &Kernel1D<A>) -> Result<Self, Error> {
        if kx.width() != ky.width() {
            return Err(Error::KernelShape {
                expected: kx.width(),
                actual: ky.width(),
            });
        }
        if kx.offset() != ky.offset() {
            return Err(Error::InvalidKernelOffset {
                offset: ky.offset(),
                width: ky.width(),
            });
        }

        let mut data = Vec::with_capacity(kx.width() * kx.width());
        for &vy in ky.data() {
            data.extend(kx.data().iter().map(|&vx| vy * vx));
        }
        Self::from_vec(kx.width(), kx.offset(), data)
    }

    pub fn sobel_x() -> Self {
        Self::from_i32_grid([[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]])
    }

    pub fn sobel_y() -> Self {
        Self::from_i32_grid([[-1, -2, -1], [0, 0, 0], [1, 2, 1]])
    }

    fn from_i32_grid(grid: [[i32; 3]; 3]) -> Self {
        Self {
            width: 3,
            offset: 1,
            data: grid.iter().flatten().map(|&v| A::from_i32(v)).collect(),
        }
    }

    pub fn sum(&self) -> A {
        let mut total = A::ZERO;
        for &v in &self.data {
            total += v;
        }
        total
    }
}

fn check_offset(width: usize, offset: usize) -> Result<(), Error> {
    if width == 0 {
        return Err(Error::EmptyKernel);
    }
    if offset >= width {
        return Err(Error::InvalidKernelOffset { offset, width });
    }
    Ok(())
}
