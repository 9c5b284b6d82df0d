#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for I/O operations.
///
/// Defines [`IoError`] variants for malformed calibration records, base64 payloads
/// and buffers whose length does not match the image size.
pub mod error;

/// Calibration record parsing.
///
/// Turns the JSON calibration record exported by the capture device into a
/// [`truedepth_imgproc::calibration::CalibrationProfile`].
pub mod calibration;

/// Host envelopes for undistortion maps and depth buffers.
pub mod envelope;

/// Raw capture buffer decoding.
pub mod raw;

pub use crate::error::IoError;
