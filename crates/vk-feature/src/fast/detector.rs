use log::debug;
use vk_core::{Error, Execution, Image, ImageView, Pixel, for_each_row};

use super::{FastConfig, FastCorner, Polarity, RING_RADIUS, Ring};

/// FAST corner scores plus bright and dark candidate lists.
///
/// Intensity is the sum of `|v - center| - tolerance` over the ring samples
/// passing the winning polarity, and 0 for non-corners. Candidates are listed
/// in row-major order.
#[derive(Debug, Clone)]
pub struct FastCornerDetector {
    corner: FastCorner,
    execution: Execution,
    signed: Image<f32>,
    intensity: Image<f32>,
    candidates_bright: Vec<(usize, usize)>,
    candidates_dark: Vec<(usize, usize)>,
}

impl FastCornerDetector {
    pub fn new(config: &FastConfig) -> Result<Self, Error> {
        Ok(Self {
            corner: FastCorner::new(config.threshold())?,
            execution: config.execution,
            signed: Image::new_fill(0, 0, 0.0),
            intensity: Image::new_fill(0, 0, 0.0),
            candidates_bright: Vec::new(),
            candidates_dark: Vec::new(),
        })
    }

    pub fn corner(&self) -> &FastCorner {
        &self.corner
    }

    pub fn process<T: Pixel>(&mut self, image: &ImageView<'_, T>) {
        let (width, height) = (image.width(), image.height());
        self.signed.reshape(width, height);
        self.candidates_bright.clear();
        self.candidates_dark.clear();

        let ring = Ring::new(image);
        let corner = &self.corner;
        // Bright scores are stored positive and dark ones negative; every
        // passing sample adds a strictly positive term, so 0 means no corner.
        for_each_row(&mut self.signed.as_view_mut(), self.execution, |y, row| {
            row.fill(0.0);
            if y < RING_RADIUS || y + RING_RADIUS >= height || width <= 2 * RING_RADIUS {
                return;
            }
            for (x, o) in row.iter_mut().enumerate().take(width - RING_RADIUS).skip(RING_RADIUS) {
                let center = image.index(x, y);
                *o = match corner.polarity(&ring, center) {
                    Some(p @ Polarity::Bright) => corner.score(&ring, center, p),
                    Some(p @ Polarity::Dark) => -corner.score(&ring, center, p),
                    None => 0.0,
                };
            }
        });

        let data = self.signed.data();
        for (i, &v) in data.iter().enumerate() {
            let pos = (i % width, i / width);
            if v > 0.0 {
                self.candidates_bright.push(pos);
            } else if v < 0.0 {
                self.candidates_dark.push(pos);
            }
        }
        self.intensity.reshape(width, height);
        for (o, &v) in self.intensity.data_mut().iter_mut().zip(data) {
            *o = v.abs();
        }

        debug!(
            "fast {}x{}: {} bright, {} dark candidates",
            width,
            height,
            self.candidates_bright.len(),
            self.candidates_dark.len()
        );
    }

    pub fn intensity(&self) -> &Image<f32> {
        &self.intensity
    }

    pub fn candidates_bright(&self) -> &[(usize, usize)] {
        &self.candidates_bright
    }

    pub fn candidates_dark(&self) -> &[(usize, usize)] {
        &self.candidates_dark
    }
}
