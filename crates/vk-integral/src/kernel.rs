use serde::{Deserialize, Serialize};
use vk_core::Error;

/// Block corners relative to the sample point, covering `x0 < x <= x1`, `y0 < y <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRectangle {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl ImageRectangle {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Number of pixels covered.
    pub fn area(&self) -> i64 {
        i64::from(self.x1 - self.x0).max(0) * i64::from(self.y1 - self.y0).max(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KernelParts {
    blocks: Vec<ImageRectangle>,
    scales: Vec<i32>,
}

/// Weighted sum of blocks evaluated against an integral image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "KernelParts")]
pub struct IntegralKernel {
    blocks: Vec<ImageRectangle>,
    scales: Vec<i32>,
}

impl TryFrom<KernelParts> for IntegralKernel {
    type Error = Error;

    fn try_from(parts: KernelParts) -> Result<Self, Error> {
        Self::new(parts.blocks, parts.scales)
    }
}

/// Extent of a kernel's support around the sample point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Support {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl IntegralKernel {
    pub fn new(blocks: Vec<ImageRectangle>, scales: Vec<i32>) -> Result<Self, Error> {
        if blocks.len() != scales.len() {
            return Err(Error::SizeMismatch {
                expected: blocks.len(),
                actual: scales.len(),
            });
        }
        Ok(Self { blocks, scales })
    }

    pub fn blocks(&self) -> &[ImageRectangle] {
        &self.blocks
    }

    pub fn scales(&self) -> &[i32] {
        &self.scales
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ImageRectangle, i32)> {
        self.blocks.iter().zip(self.scales.iter().copied())
    }

    /// Smallest corner box containing every block, `None` for an empty kernel.
    pub(crate) fn support(&self) -> Option<Support> {
        let first = self.blocks.first()?;
        let init = Support {
            x_min: first.x0,
            y_min: first.y0,
            x_max: first.x1,
            y_max: first.y1,
        };
        Some(self.blocks.iter().fold(init, |s, b| Support {
            x_min: s.x_min.min(b.x0),
            y_min: s.y_min.min(b.y0),
            x_max: s.x_max.max(b.x1),
            y_max: s.y_max.max(b.y1),
        }))
    }

    /// Box approximation of the second derivative along x (SURF `Dxx`).
    pub fn hessian_xx(size: usize) -> Result<Self, Error> {
        let (r1, r2, r3) = lobe_radii(size)?;
        Self::new(
            vec![
                ImageRectangle::new(-r2 - 1, -r3 - 1, r2, r3),
                ImageRectangle::new(-r1 - 1, -r3 - 1, r1, r3),
            ],
            vec![1, -3],
        )
    }

    /// Transpose of [`IntegralKernel::hessian_xx`].
    pub fn hessian_yy(size: usize) -> Result<Self, Error> {
        let (r1, r2, r3) = lobe_radii(size)?;
        Self::new(
            vec![
                ImageRectangle::new(-r3 - 1, -r2 - 1, r3, r2),
                ImageRectangle::new(-r3 - 1, -r1 - 1, r3, r1),
            ],
            vec![1, -3],
        )
    }

    /// Four-quadrant box approximation of the mixed derivative (SURF `Dxy`).
    pub fn hessian_xy(size: usize) -> Result<Self, Error> {
        check_size(size)?;
        let b = (size / 3) as i32;
        Self::new(
            vec![
                ImageRectangle::new(-b - 1, -b - 1, -1, -1),
                ImageRectangle::new(0, -b - 1, b, -1),
                ImageRectangle::new(0, 0, b, b),
                ImageRectangle::new(-b - 1, 0, -1, b),
            ],
            vec![1, -1, 1, -1],
        )
    }
}

/// Sizes follow the SURF scale ladder 9, 15, 21, ...
pub(crate) fn check_size(size: usize) -> Result<(), Error> {
    if size < 9 || !(size - 9).is_multiple_of(6) {
        return Err(Error::InvalidParameter("hessian size must be 9 + 6k"));
    }
    Ok(())
}

fn lobe_radii(size: usize) -> Result<(i32, i32, i32), Error> {
    check_size(size)?;
    let block_w = (size / 3) as i32;
    let block_h = size as i32 - block_w - 1;
    let r1 = block_w / 2;
    let r2 = block_w + r1;
    let r3 = block_h / 2;
    Ok((r1, r2, r3))
}

#[cfg(test)]
mod tests {
    use vk_core::Error;

    use super::{ImageRectangle, IntegralKernel};

    fn weighted_area(k: &IntegralKernel) -> i64 {
        k.iter().map(|(b, s)| b.area() * i64::from(s)).sum()
    }

    #[test]
    fn hessian_lobes_for_size_nine() {
        let xx = IntegralKernel::hessian_xx(9).expect("valid size");
        let expected = [
            ImageRectangle::new(-5, -3, 4, 2),
            ImageRectangle::new(-2, -3, 1, 2),
        ];
        assert_eq!(xx.blocks(), &expected);
        assert_eq!(xx.scales(), &[1, -3]);
        // Outer lobes +1, middle lobe -2 over equal areas.
        assert_eq!(weighted_area(&xx), 0);

        let yy = IntegralKernel::hessian_yy(9).expect("valid size");
        assert_eq!(yy.blocks()[0], ImageRectangle::new(-3, -5, 2, 4));
        assert_eq!(weighted_area(&yy), 0);

        let xy = IntegralKernel::hessian_xy(9).expect("valid size");
        assert_eq!(xy.len(), 4);
        assert!(xy.blocks().iter().all(|b| b.area() == 9));
        assert_eq!(weighted_area(&xy), 0);
    }

    #[test]
    fn support_spans_all_blocks() {
        let xx = IntegralKernel::hessian_xx(15).expect("valid size");
        let s = xx.support().expect("non-empty");
        assert_eq!((s.x_min, s.x_max), (-8, 7));
        assert!(IntegralKernel::new(Vec::new(), Vec::new()).expect("valid").support().is_none());
    }

    #[test]
    fn rejects_bad_sizes_and_mismatched_lists() {
        assert!(IntegralKernel::hessian_xx(10).is_err());
        assert!(IntegralKernel::hessian_xy(3).is_err());
        assert_eq!(
            IntegralKernel::new(vec![ImageRectangle::new(0, 0, 1, 1)], vec![]),
            Err(Error::SizeMismatch {
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn round_trips_through_json() {
        let k = IntegralKernel::hessian_xy(15).expect("valid size");
        let json = serde_json::to_string(&k).expect("serialize");
        let back: IntegralKernel = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, k);

        let bad = r#"{"blocks":[{"x0":0,"y0":0,"x1":1,"y1":1}],"scales":[1,2]}"#;
        assert!(serde_json::from_str::<IntegralKernel>(bad).is_err());
    }
}
