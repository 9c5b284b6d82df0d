mod bgra;
mod srgb;

pub use bgra::rgb_from_bgra;
pub use srgb::{linear_from_srgb, linear_to_srgb, srgb_from_linear, srgb_to_linear};
