use rayon::prelude::*;

use super::{CalibrationProfile, CameraIntrinsic, RadialLookup};
use crate::interpolation::{self, grid::meshgrid_from_fn, InterpolationMode};
use truedepth_image::{Image, ImageError, ImageSize};

/// A dense per-pixel sampling map.
///
/// For every output pixel `(x, y)`, `map_x[y][x]` and `map_y[y][x]` hold the source
/// coordinate to sample from. The map is built once per calibration and resolution
/// and shared read-only by every remap that uses it.
#[derive(Debug, Clone, PartialEq)]
pub struct UndistortionMap {
    map_x: Image<f32, 1>,
    map_y: Image<f32, 1>,
}

impl UndistortionMap {
    /// Create a map from its two coordinate grids.
    ///
    /// # Errors
    ///
    /// Fails if the grids do not have the same size.
    pub fn new(map_x: Image<f32, 1>, map_y: Image<f32, 1>) -> Result<Self, ImageError> {
        if map_x.size() != map_y.size() {
            return Err(ImageError::InvalidImageSize(
                map_x.width(),
                map_x.height(),
                map_y.width(),
                map_y.height(),
            ));
        }
        Ok(Self { map_x, map_y })
    }

    /// The size of the output covered by the map.
    pub fn size(&self) -> ImageSize {
        self.map_x.size()
    }

    /// The source x coordinate of every output pixel.
    pub fn map_x(&self) -> &Image<f32, 1> {
        &self.map_x
    }

    /// The source y coordinate of every output pixel.
    pub fn map_y(&self) -> &Image<f32, 1> {
        &self.map_y
    }

    /// Split the map into its `(map_x, map_y)` grids.
    pub fn into_parts(self) -> (Image<f32, 1>, Image<f32, 1>) {
        (self.map_x, self.map_y)
    }

    /// Resample `src` through the map into a new image.
    ///
    /// # Arguments
    ///
    /// * `src` - The distorted source image.
    /// * `interpolation` - The interpolation mode to use.
    /// * `border_value` - The value written where the map points outside of `src`.
    pub fn apply<const C: usize>(
        &self,
        src: &Image<f32, C>,
        interpolation: InterpolationMode,
        border_value: f32,
    ) -> Result<Image<f32, C>, ImageError> {
        let mut dst = Image::from_size_val(self.size(), border_value)?;
        interpolation::remap(
            src,
            &mut dst,
            &self.map_x,
            &self.map_y,
            interpolation,
            border_value,
        )?;
        Ok(dst)
    }
}

/// Generate a correction map that scales every pixel radially around the principal point.
///
/// For each output pixel the offset from the principal point is scaled by
/// `1 + lookup(t)`, where `t` is the pixel radius normalized by the largest radius of
/// the image and expressed in table index space (`t = r / max_r * lookup.len()`).
///
/// The largest radius is reduced over every pixel before any map value is computed.
/// A degenerate image whose largest radius is zero uses a normalized radius of zero.
///
/// # Arguments
///
/// * `intrinsic` - The intrinsic parameters of the camera, scaled to `size`.
/// * `lookup` - The radial lookup table.
/// * `size` - The size of the output image.
///
/// # Returns
///
/// The map for resampling the image.
pub fn generate_correction_map_lookup(
    intrinsic: &CameraIntrinsic,
    lookup: &RadialLookup,
    size: ImageSize,
) -> Result<UndistortionMap, ImageError> {
    let (cx, cy) = (intrinsic.cx, intrinsic.cy);

    let radius = |x: usize, y: usize| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        (dx * dx + dy * dy).sqrt()
    };

    // first pass: the largest radius over the full pixel set
    let max_r = (0..size.height)
        .into_par_iter()
        .map(|y| (0..size.width).map(|x| radius(x, y)).fold(0.0, f64::max))
        .reduce(|| 0.0, f64::max);

    let num = lookup.len() as f64;

    // second pass: scale each offset by the interpolated correction
    let (map_x, map_y) = meshgrid_from_fn(size.width, size.height, |x, y| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;

        let norm_r = if max_r > 0.0 { radius(x, y) / max_r } else { 0.0 };
        let scale = 1.0 + lookup.interpolate(norm_r * num);

        ((dx * scale + cx) as f32, (dy * scale + cy) as f32)
    })?;

    UndistortionMap::new(map_x, map_y)
}

/// Generate the undistortion map of a calibration profile.
///
/// Uses the inverse distortion table. The resulting map is applied identically to
/// the color image and to the depth buffer.
///
/// # Arguments
///
/// * `profile` - The calibration profile scaled to the target resolution.
/// * `size` - The size of the output image.
///
/// # Example
///
/// ```
/// use truedepth_image::ImageSize;
/// use truedepth_imgproc::calibration::{
///     generate_undistortion_map_lookup, CalibrationProfile, RadialLookup,
/// };
///
/// let size = ImageSize { width: 4, height: 3 };
/// let profile = CalibrationProfile::new(
///     [[4.0, 0.0, 2.0], [0.0, 4.0, 1.0], [0.0, 0.0, 1.0]],
///     4.0,
///     RadialLookup::new("lookup", vec![0.0; 8]).unwrap(),
///     RadialLookup::new("inverse", vec![0.0; 8]).unwrap(),
///     size,
/// ).unwrap();
///
/// let map = generate_undistortion_map_lookup(&profile, size).unwrap();
/// assert_eq!(map.map_x().as_slice()[..4], [0.0, 1.0, 2.0, 3.0]);
/// ```
pub fn generate_undistortion_map_lookup(
    profile: &CalibrationProfile,
    size: ImageSize,
) -> Result<UndistortionMap, ImageError> {
    generate_correction_map_lookup(&profile.intrinsic(), profile.inverse_lookup(), size)
}

/// Generate the distortion map of a calibration profile.
///
/// Uses the forward distortion table, so it re-applies the lens distortion to an
/// undistorted image.
///
/// # Arguments
///
/// * `profile` - The calibration profile scaled to the target resolution.
/// * `size` - The size of the output image.
pub fn generate_distortion_map_lookup(
    profile: &CalibrationProfile,
    size: ImageSize,
) -> Result<UndistortionMap, ImageError> {
    generate_correction_map_lookup(&profile.intrinsic(), profile.lookup(), size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationError;
    use crate::interpolation::grid::meshgrid;

    fn profile(
        size: ImageSize,
        cx: f64,
        cy: f64,
        lookup: Vec<f32>,
        inverse_lookup: Vec<f32>,
    ) -> Result<CalibrationProfile, CalibrationError> {
        CalibrationProfile::new(
            [[500.0, 0.0, cx], [0.0, 500.0, cy], [0.0, 0.0, 1.0]],
            size.width as f64,
            RadialLookup::new("lookup", lookup)?,
            RadialLookup::new("inverse", inverse_lookup)?,
            size,
        )
    }

    #[test]
    fn test_identity_tables_produce_identity_map() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 640,
            height: 480,
        };
        let profile = profile(size, 320.0, 240.0, vec![0.0; 42], vec![0.0; 42])?;

        let map = generate_undistortion_map_lookup(&profile, size)?;
        let (grid_x, grid_y) = meshgrid(size.width, size.height)?;

        assert_eq!(map.size(), size);
        assert_eq!(map.map_x().as_slice(), grid_x.as_slice());
        assert_eq!(map.map_y().as_slice(), grid_y.as_slice());

        Ok(())
    }

    #[test]
    fn test_principal_point_is_fixed() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 9,
            height: 7,
        };
        let profile = profile(size, 4.0, 3.0, vec![0.3; 5], vec![0.7, -0.2, 0.4, 0.9])?;

        let map = generate_undistortion_map_lookup(&profile, size)?;
        assert_eq!(map.map_x().get_pixel(4, 3, 0)?, &4.0);
        assert_eq!(map.map_y().get_pixel(4, 3, 0)?, &3.0);

        Ok(())
    }

    #[test]
    fn test_correction_scales_radially() -> Result<(), Box<dyn std::error::Error>> {
        // a 3x1 image centered on the middle pixel: radii are 1, 0, 1
        let size = ImageSize {
            width: 3,
            height: 1,
        };
        let intrinsic = CameraIntrinsic {
            fx: 1.0,
            fy: 1.0,
            cx: 1.0,
            cy: 0.0,
        };
        // normalized radius 1 maps past the end of the table and clamps to 0.5
        let lookup = RadialLookup::new("inverse", vec![0.0, 0.25, 0.5])?;

        let map = generate_correction_map_lookup(&intrinsic, &lookup, size)?;
        assert_eq!(map.map_x().as_slice(), &[-0.5, 1.0, 2.5]);
        assert_eq!(map.map_y().as_slice(), &[0.0, 0.0, 0.0]);

        Ok(())
    }

    #[test]
    fn test_distortion_map_uses_forward_table() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 3,
            height: 1,
        };
        let profile = CalibrationProfile::new(
            [[1.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            3.0,
            RadialLookup::new("lookup", vec![1.0])?,
            RadialLookup::new("inverse", vec![0.0])?,
            size,
        )?;

        let distort = generate_distortion_map_lookup(&profile, size)?;
        assert_eq!(distort.map_x().as_slice(), &[-1.0, 1.0, 3.0]);

        let undistort = generate_undistortion_map_lookup(&profile, size)?;
        assert_eq!(undistort.map_x().as_slice(), &[0.0, 1.0, 2.0]);

        Ok(())
    }

    #[test]
    fn test_degenerate_single_pixel() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 1,
            height: 1,
        };
        let profile = profile(size, 0.0, 0.0, vec![0.5], vec![0.5])?;

        let map = generate_undistortion_map_lookup(&profile, size)?;
        assert_eq!(map.map_x().as_slice(), &[0.0]);
        assert_eq!(map.map_y().as_slice(), &[0.0]);

        Ok(())
    }

    #[test]
    fn test_map_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 64,
            height: 48,
        };
        let table = (0..32).map(|i| i as f32 * -0.001).collect::<Vec<_>>();
        let profile = profile(size, 31.7, 24.2, table.clone(), table)?;

        let a = generate_undistortion_map_lookup(&profile, size)?;
        let b = generate_undistortion_map_lookup(&profile, size)?;
        assert_eq!(a, b);

        Ok(())
    }

    #[test]
    fn test_map_apply_uses_border() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 2,
            height: 1,
        };
        let map = UndistortionMap::new(
            Image::new(size, vec![0.0, 5.0])?,
            Image::new(size, vec![0.0, 0.0])?,
        )?;
        let src = Image::<f32, 1>::new(size, vec![0.2, 0.3])?;

        let dst = map.apply(&src, InterpolationMode::Bilinear, -1000.0)?;
        assert_eq!(dst.as_slice(), &[0.2, -1000.0]);

        Ok(())
    }
}
