//! Umbrella crate for the `vision-kernels` workspace.
//!
//! Core image types are re-exported at the root; each processing crate is
//! available under its own module.

pub use vk_conv as conv;
pub use vk_core::*;
pub use vk_feature as feature;
pub use vk_integral as integral;
