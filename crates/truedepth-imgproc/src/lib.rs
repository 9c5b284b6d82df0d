#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// lens calibration and undistortion map module.
pub mod calibration;

/// color transformations module.
pub mod color;

/// depth validation and masking module.
pub mod depth;

/// utilities for interpolation.
pub mod interpolation;

/// module containing parallization utilities.
pub mod parallel;
