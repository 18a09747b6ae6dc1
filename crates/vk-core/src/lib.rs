//! Foundational primitives shared by the vision-kernels crates.
//!
//! ## Buffers and Stride
//! Images use element stride (not byte stride). Pixel `(x, y)` of a view is
//! stored at `start_index + y * stride + x` of the backing slice, and `stride`
//! may be greater than `width`. This allows borrowed views over padded buffers
//! and subviews without copying.
//!
//! ## Border Modes
//! Out-of-range indices resolve by clamp, constant fill, reflect-101 or wrap.
//! Reflect-101 mirrors around edge pixels without repeating edge elements.
//!
//! ## Numeric Model
//! [`Pixel`] ties a sample type to the [`Accum`] type kernels are evaluated
//! in (`u8` accumulates in `i32`). [`IntegralPixel`] picks the widened type
//! integral images are stored in.
//!
//! ## Execution
//! Per-row work runs sequentially or on the rayon pool, chosen per call with
//! [`Execution`]. Both give identical output.

mod border;
mod error;
mod exec;
mod image;
mod pixel;

pub use border::{BorderMode, map_index};
pub use error::Error;
pub use exec::{Execution, for_each_row, for_each_row_in, for_each_row_in_init, for_each_row_init};
pub use image::{Image, ImageView, ImageViewMut};
pub use pixel::{Accum, IntegralPixel, Pixel};
