//! Feature responses built on the convolution and integral-image crates.
//!
//! - [`fast`]: FAST ring classification through a precomputed decision tree,
//!   plus a detector producing scores and bright/dark candidate lists.
//! - [`corner`]: Sobel gradients and the Harris and Shi-Tomasi responses.

pub mod corner;
pub mod fast;

pub use corner::{CornerConfig, gradient_sobel, harris_intensity, shi_tomasi_intensity};
pub use fast::{FastConfig, FastCorner, FastCornerDetector, FastDecisionTree, FastThreshold};
