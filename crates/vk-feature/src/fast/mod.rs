//! FAST corner classification on the 16-sample Bresenham ring of radius 3.
//!
//! A pixel is a bright corner when at least `min_run` contiguous ring samples
//! exceed `center + tolerance`, and a dark corner when they are all below
//! `center - tolerance`. The arc test is a precomputed [`FastDecisionTree`]
//! evaluated once per polarity.

mod detector;
mod tree;

use serde::{Deserialize, Serialize};
use vk_core::{Accum, Error, Execution, Image, ImageView, Pixel, for_each_row};

pub use detector::FastCornerDetector;
pub use tree::{FastDecisionTree, Node, RING_LEN};

/// Ring offsets `(dx, dy)`, clockwise from 12 o'clock.
pub const CIRCLE_OFFSETS: [(isize, isize); RING_LEN] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Pixels closer than this to the border are never classified.
pub const RING_RADIUS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FastThreshold {
    /// Minimum difference from the center, exclusive.
    pub tolerance: f32,
    /// Contiguous arc length, 9..=12.
    pub min_run: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FastConfig {
    pub tolerance: f32,
    pub min_run: usize,
    pub execution: Execution,
}

impl Default for FastConfig {
    fn default() -> Self {
        Self {
            tolerance: 20.0,
            min_run: 9,
            execution: Execution::Sequential,
        }
    }
}

impl FastConfig {
    pub fn threshold(&self) -> FastThreshold {
        FastThreshold {
            tolerance: self.tolerance,
            min_run: self.min_run,
        }
    }
}

/// Polarity of a classified pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Polarity {
    Bright,
    Dark,
}

#[derive(Debug, Clone)]
pub struct FastCorner {
    threshold: FastThreshold,
    tree: FastDecisionTree,
}

impl FastCorner {
    pub fn new(threshold: FastThreshold) -> Result<Self, Error> {
        if !(threshold.tolerance.is_finite() && threshold.tolerance >= 0.0) {
            return Err(Error::InvalidParameter("tolerance must be >= 0 and finite"));
        }
        Ok(Self {
            tree: FastDecisionTree::new(threshold.min_run)?,
            threshold,
        })
    }

    pub fn threshold(&self) -> FastThreshold {
        self.threshold
    }

    pub fn tree(&self) -> &FastDecisionTree {
        &self.tree
    }

    /// `+1` for a bright corner, `-1` for a dark corner, `0` otherwise.
    ///
    /// `(x, y)` must be at least [`RING_RADIUS`] pixels from every border.
    pub fn classify<T: Pixel>(&self, image: &ImageView<'_, T>, x: usize, y: usize) -> i8 {
        let ring = Ring::new(image);
        match self.polarity(&ring, image.index(x, y)) {
            Some(Polarity::Bright) => 1,
            Some(Polarity::Dark) => -1,
            None => 0,
        }
    }

    /// Fills `out` with the class of every pixel; the border margin is 0.
    pub fn classify_image<T: Pixel>(
        &self,
        image: &ImageView<'_, T>,
        out: &mut Image<i8>,
        exec: Execution,
    ) {
        out.reshape(image.width(), image.height());
        let ring = Ring::new(image);
        let (width, height) = (image.width(), image.height());

        for_each_row(&mut out.as_view_mut(), exec, |y, row| {
            row.fill(0);
            if y < RING_RADIUS || y + RING_RADIUS >= height || width <= 2 * RING_RADIUS {
                return;
            }
            for (x, o) in row.iter_mut().enumerate().take(width - RING_RADIUS).skip(RING_RADIUS) {
                *o = match self.polarity(&ring, image.index(x, y)) {
                    Some(Polarity::Bright) => 1,
                    Some(Polarity::Dark) => -1,
                    None => 0,
                };
            }
        });
    }

    pub(crate) fn polarity<T: Pixel>(&self, ring: &Ring<'_, T>, center: usize) -> Option<Polarity> {
        debug_assert!(ring.fits(center), "pixel too close to the border");
        let c = ring.value(center, 0isize);
        let tol = f64::from(self.threshold.tolerance);
        let upper = c + tol;
        let lower = c - tol;

        if self.tree.evaluate(|s| ring.sample(center, s) > upper) {
            Some(Polarity::Bright)
        } else if self.tree.evaluate(|s| ring.sample(center, s) < lower) {
            Some(Polarity::Dark)
        } else {
            None
        }
    }

    /// Sum of `|v - center| - tolerance` over the ring samples passing `polarity`.
    pub(crate) fn score<T: Pixel>(
        &self,
        ring: &Ring<'_, T>,
        center: usize,
        polarity: Polarity,
    ) -> f32 {
        let c = ring.value(center, 0isize);
        let tol = f64::from(self.threshold.tolerance);
        let mut total = 0.0f64;
        for s in 0..RING_LEN {
            let d = ring.sample(center, s) - c;
            let d = match polarity {
                Polarity::Bright => d,
                Polarity::Dark => -d,
            };
            if d > tol {
                total += d - tol;
            }
        }
        total as f32
    }
}

/// Flat-index offsets of the ring for one image layout.
pub(crate) struct Ring<'a, T> {
    data: &'a [T],
    offsets: [isize; RING_LEN],
    width: usize,
    height: usize,
    stride: usize,
    start: usize,
}

impl<'a, T: Pixel> Ring<'a, T> {
    pub(crate) fn new(image: &ImageView<'a, T>) -> Self {
        let stride = image.stride() as isize;
        Self {
            data: image.data(),
            offsets: CIRCLE_OFFSETS.map(|(dx, dy)| dy * stride + dx),
            width: image.width(),
            height: image.height(),
            stride: image.stride(),
            start: image.start_index(),
        }
    }

    fn fits(&self, center: usize) -> bool {
        let rel = center - self.start;
        let (x, y) = (rel % self.stride.max(1), rel / self.stride.max(1));
        x >= RING_RADIUS
            && y >= RING_RADIUS
            && x + RING_RADIUS < self.width
            && y + RING_RADIUS < self.height
    }

    #[inline]
    fn value(&self, center: usize, offset: isize) -> f64 {
        let idx = (center as isize + offset) as usize;
        self.data[idx].to_acc().to_f64()
    }

    #[inline]
    fn sample(&self, center: usize, s: usize) -> f64 {
        self.value(center, self.offsets[s])
    }
}
