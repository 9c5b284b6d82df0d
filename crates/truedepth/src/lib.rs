#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use truedepth_image as image;

#[doc(inline)]
pub use truedepth_imgproc as imgproc;

#[doc(inline)]
pub use truedepth_io as io;

#[doc(inline)]
pub use truedepth_3d as k3d;

/// Pipeline configuration.
pub mod config;

/// The end-to-end undistortion and back-projection pipeline.
pub mod pipeline;

pub use config::PipelineConfig;
pub use pipeline::{PipelineError, RawFrame, RgbdPipeline, UndistortedFrame, ValidatedDepth};
