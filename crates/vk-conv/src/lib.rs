//! Kernel convolution over strided image views.
//!
//! Output pixel `x` of a 1D pass is `Σ kernel[j] * src[x - offset + j]`; the
//! 2D pass applies the same alignment on both axes. The top-level functions
//! [`horizontal`], [`vertical`] and [`convolve`] pick an implementation from
//! the [`BorderPolicy`]:
//!
//! - `Skip` writes the interior only ([`inner`]).
//! - `Extend(mode)` adds the border ring with remapped taps ([`border`]), or
//!   remaps everything ([`naive`]) when the kernel does not fit the image.
//! - `Normalized` divides the interior by the kernel sum and the ring by the
//!   in-bounds weight ([`normalized`]).
//!
//! Integer samples accumulate in a widened type (`u8` in `i32`) and divisions
//! round as `(total + d / 2) / d`.

pub mod border;
mod convolve;
pub mod down;
pub mod inner;
mod kernel;
pub mod naive;
pub mod normalized;
pub mod sparse;

pub use convolve::{BorderPolicy, convolve, horizontal, vertical};
pub use kernel::{Kernel1D, Kernel2D};
