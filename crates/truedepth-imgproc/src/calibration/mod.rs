/// calibration error types.
mod error;

/// radial distortion lookup tables.
pub mod lookup;

/// calibration profile scaled to a target resolution.
pub mod profile;

/// undistortion map generation from radial lookup tables.
pub mod distortion;

pub use distortion::{
    generate_correction_map_lookup, generate_distortion_map_lookup,
    generate_undistortion_map_lookup, UndistortionMap,
};
pub use error::CalibrationError;
pub use lookup::RadialLookup;
pub use profile::CalibrationProfile;

/// Represents the instrinsic parameters of a pinhole camera
///
/// # Fields
///
/// * `fx` - The focal length in the x direction
/// * `fy` - The focal length in the y direction
/// * `cx` - The x coordinate of the principal point
/// * `cy` - The y coordinate of the principal point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsic {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
}
