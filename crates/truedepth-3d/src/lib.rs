#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Point cloud file writers.
pub mod io;

/// Colored point cloud container.
pub mod pointcloud;

/// RGB-D frames and back-projection to camera space.
pub mod rgbd;
