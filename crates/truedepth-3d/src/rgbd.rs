use crate::pointcloud::{Point3d, PointCloud};
use truedepth_image::{Image, ImageError};
use truedepth_imgproc::{calibration::CameraIntrinsic, color::srgb_to_linear, depth::DepthRange};

/// The encoding of the colors attached to back-projected points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorOutput {
    /// Keep the sRGB encoded intensities, normalized to `[0, 1]`.
    #[default]
    Srgb,
    /// Convert the normalized intensities to linear light.
    Linear,
}

/// A struct representing an undistorted RGB-D frame.
///
/// The color image holds intensities in `[0, 255]` and shares its pixel grid with the
/// depth buffer, so a pixel `(x, y)` addresses the same scene point in both.
#[derive(Debug, Clone)]
pub struct RgbdImage {
    color: Image<f32, 3>,
    depth: Image<f32, 1>,
}

impl RgbdImage {
    /// Creates a new RGB-D frame from a color image and a depth buffer.
    ///
    /// # Errors
    ///
    /// Fails if the color image and the depth buffer do not have the same size.
    pub fn new(color: Image<f32, 3>, depth: Image<f32, 1>) -> Result<Self, ImageError> {
        if color.size() != depth.size() {
            return Err(ImageError::InvalidImageSize(
                color.width(),
                color.height(),
                depth.width(),
                depth.height(),
            ));
        }
        Ok(Self { color, depth })
    }

    /// Returns the dimensions of the frame (width, height)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.depth.width(), self.depth.height())
    }

    /// The color image.
    pub fn color(&self) -> &Image<f32, 3> {
        &self.color
    }

    /// The depth buffer.
    pub fn depth(&self) -> &Image<f32, 1> {
        &self.depth
    }

    /// Get the depth value at a specific pixel.
    #[inline]
    pub fn get_depth(&self, x: usize, y: usize) -> Option<f32> {
        self.depth.get([y, x, 0]).copied()
    }

    /// Get the color value at a specific pixel.
    #[inline]
    pub fn get_color(&self, x: usize, y: usize) -> Option<[f32; 3]> {
        let px = self.color.pixel(x, y)?;
        Some([px[0], px[1], px[2]])
    }

    /// Split the frame into its `(color, depth)` images.
    pub fn into_parts(self) -> (Image<f32, 3>, Image<f32, 1>) {
        (self.color, self.depth)
    }
}

/// Back-project a pixel with a known depth into camera space.
///
/// The pinhole model is inverted as `x = (px - cx) / fx * d`, `y = (py - cy) / fy * d`
/// and `z = d`.
///
/// # Arguments
///
/// * `px` - The pixel column.
/// * `py` - The pixel row.
/// * `depth` - The depth of the pixel.
/// * `intrinsic` - The camera intrinsic parameters.
///
/// # Example
///
/// ```
/// use truedepth_3d::rgbd::backproject_pixel;
/// use truedepth_imgproc::calibration::CameraIntrinsic;
///
/// let intrinsic = CameraIntrinsic { fx: 500.0, fy: 500.0, cx: 320.0, cy: 240.0 };
/// assert_eq!(backproject_pixel(320.0, 240.0, 0.3, &intrinsic), [0.0, 0.0, 0.3]);
/// ```
#[inline]
pub fn backproject_pixel(px: f64, py: f64, depth: f64, intrinsic: &CameraIntrinsic) -> [f64; 3] {
    [
        (px - intrinsic.cx) / intrinsic.fx * depth,
        (py - intrinsic.cy) / intrinsic.fy * depth,
        depth,
    ]
}

fn normalize_color(rgb: [f32; 3], output: ColorOutput) -> [f64; 3] {
    rgb.map(|c| {
        let c = c / 255.0;
        let c = match output {
            ColorOutput::Srgb => c,
            ColorOutput::Linear => srgb_to_linear(c),
        };
        c as f64
    })
}

fn backproject_at(
    rgbd: &RgbdImage,
    x: usize,
    y: usize,
    intrinsic: &CameraIntrinsic,
    range: &DepthRange,
    output: ColorOutput,
) -> Option<Point3d> {
    let depth = rgbd.get_depth(x, y)?;
    if !range.contains(depth) {
        return None;
    }
    let color = rgbd.get_color(x, y)?;
    Some(Point3d {
        position: backproject_pixel(x as f64, y as f64, depth as f64, intrinsic),
        color: normalize_color(color, output),
    })
}

/// Back-project every valid pixel of an RGB-D frame into a colored point cloud.
///
/// Pixels are visited in row-major order and only those whose depth lies inside
/// `range` are emitted, so the output holds at most `width * height` points. Colors are
/// normalized from `[0, 255]` to `[0, 1]`.
///
/// # Arguments
///
/// * `rgbd` - The undistorted RGB-D frame.
/// * `intrinsic` - The camera intrinsic parameters at the frame resolution.
/// * `range` - The accepted depth range.
/// * `output` - The encoding of the point colors.
pub fn backproject_rgbd(
    rgbd: &RgbdImage,
    intrinsic: &CameraIntrinsic,
    range: &DepthRange,
    output: ColorOutput,
) -> PointCloud {
    let (width, height) = rgbd.dimensions();
    let mut pointcloud = PointCloud::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            if let Some(point) = backproject_at(rgbd, x, y, intrinsic, range, output) {
                pointcloud.push(point);
            }
        }
    }

    pointcloud
}

/// Back-project a list of sub-pixel coordinates into a colored point cloud.
///
/// Each coordinate is rounded to the nearest pixel before the depth lookup.
/// Coordinates that fall outside the frame, or whose depth is not in `range`, are
/// skipped. The remaining points keep the order of `points`.
///
/// # Arguments
///
/// * `points` - The `[x, y]` pixel coordinates.
/// * `rgbd` - The undistorted RGB-D frame.
/// * `intrinsic` - The camera intrinsic parameters at the frame resolution.
/// * `range` - The accepted depth range.
/// * `output` - The encoding of the point colors.
pub fn backproject_points(
    points: &[[f32; 2]],
    rgbd: &RgbdImage,
    intrinsic: &CameraIntrinsic,
    range: &DepthRange,
    output: ColorOutput,
) -> PointCloud {
    points
        .iter()
        .filter_map(|&[u, v]| {
            let (x, y) = (u.round(), v.round());
            // NaN and negative coordinates fail this check
            if !(x >= 0.0 && y >= 0.0) {
                return None;
            }
            backproject_at(rgbd, x as usize, y as usize, intrinsic, range, output)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use truedepth_image::ImageSize;

    fn intrinsic() -> CameraIntrinsic {
        CameraIntrinsic {
            fx: 2.0,
            fy: 4.0,
            cx: 0.5,
            cy: 0.5,
        }
    }

    fn frame(depth: Vec<f32>) -> Result<RgbdImage, ImageError> {
        let size = ImageSize {
            width: 2,
            height: 2,
        };
        let color = Image::new(
            size,
            vec![
                255.0, 0.0, 0.0, 0.0, 255.0, 0.0, //
                0.0, 0.0, 255.0, 51.0, 102.0, 204.0,
            ],
        )?;
        RgbdImage::new(color, Image::new(size, depth)?)
    }

    #[test]
    fn test_backproject_principal_point() {
        let intrinsic = CameraIntrinsic {
            fx: 525.0,
            fy: 525.0,
            cx: 319.5,
            cy: 239.5,
        };
        let p = backproject_pixel(319.5, 239.5, 0.25, &intrinsic);
        assert_eq!(p, [0.0, 0.0, 0.25]);
    }

    #[test]
    fn test_backproject_pixel() {
        let p = backproject_pixel(2.5, 0.5, 0.4, &intrinsic());
        assert_abs_diff_eq!(p[0], 0.4);
        assert_abs_diff_eq!(p[1], 0.0);
        assert_abs_diff_eq!(p[2], 0.4);
    }

    #[test]
    fn test_rgbd_size_mismatch() -> Result<(), ImageError> {
        let color = Image::<f32, 3>::from_size_val([2, 2].into(), 0.0)?;
        let depth = Image::<f32, 1>::from_size_val([3, 2].into(), 0.0)?;
        assert_eq!(
            RgbdImage::new(color, depth).err(),
            Some(ImageError::InvalidImageSize(2, 2, 3, 2))
        );
        Ok(())
    }

    #[test]
    fn test_backproject_rgbd_single_valid() -> Result<(), ImageError> {
        let rgbd = frame(vec![f32::NAN, f32::NAN, f32::NAN, 0.3])?;
        let pointcloud =
            backproject_rgbd(&rgbd, &intrinsic(), &DepthRange::default(), ColorOutput::Srgb);

        assert_eq!(pointcloud.len(), 1);
        let p = pointcloud.points()[0];
        assert_abs_diff_eq!(p[0], 0.5 / 2.0 * 0.3, epsilon = 1e-6);
        assert_abs_diff_eq!(p[1], 0.5 / 4.0 * 0.3, epsilon = 1e-6);
        assert_abs_diff_eq!(p[2], 0.3, epsilon = 1e-6);

        let c = pointcloud.colors()[0];
        assert_abs_diff_eq!(c[0], 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(c[1], 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(c[2], 0.8, epsilon = 1e-6);

        Ok(())
    }

    #[test]
    fn test_backproject_rgbd_row_major_order() -> Result<(), ImageError> {
        let rgbd = frame(vec![0.2, 0.05, 0.3, 0.4])?;
        let pointcloud =
            backproject_rgbd(&rgbd, &intrinsic(), &DepthRange::default(), ColorOutput::Srgb);

        let depths = pointcloud.iter().map(|p| p.position[2]).collect::<Vec<_>>();
        assert_eq!(depths.len(), 3);
        assert_abs_diff_eq!(depths[0], 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(depths[1], 0.3, epsilon = 1e-6);
        assert_abs_diff_eq!(depths[2], 0.4, epsilon = 1e-6);
        assert_eq!(pointcloud.colors()[0], [1.0, 0.0, 0.0]);

        Ok(())
    }

    #[test]
    fn test_backproject_rgbd_all_nan() -> Result<(), ImageError> {
        let rgbd = frame(vec![f32::NAN; 4])?;
        let pointcloud =
            backproject_rgbd(&rgbd, &intrinsic(), &DepthRange::default(), ColorOutput::Srgb);
        assert!(pointcloud.is_empty());
        Ok(())
    }

    #[test]
    fn test_backproject_rgbd_linear_color() -> Result<(), ImageError> {
        let rgbd = frame(vec![f32::NAN, f32::NAN, f32::NAN, 0.3])?;
        let pointcloud = backproject_rgbd(
            &rgbd,
            &intrinsic(),
            &DepthRange::default(),
            ColorOutput::Linear,
        );

        let c = pointcloud.colors()[0];
        assert_abs_diff_eq!(c[0], srgb_to_linear(0.2) as f64, epsilon = 1e-6);
        assert_abs_diff_eq!(c[2], srgb_to_linear(0.8) as f64, epsilon = 1e-6);

        Ok(())
    }

    #[test]
    fn test_backproject_points() -> Result<(), ImageError> {
        let rgbd = frame(vec![0.2, 0.05, 0.3, 0.4])?;
        let points = [
            [1.2, 0.9],
            [-0.6, 0.0],
            [0.4, 0.1],
            [5.0, 0.0],
            [f32::NAN, 1.0],
            [0.9, 0.2],
        ];

        let pointcloud = backproject_points(
            &points,
            &rgbd,
            &intrinsic(),
            &DepthRange::default(),
            ColorOutput::Srgb,
        );

        // (1, 1) then (0, 0); (1, 0) holds an out of range depth
        let depths = pointcloud.iter().map(|p| p.position[2]).collect::<Vec<_>>();
        assert_eq!(depths.len(), 2);
        assert_abs_diff_eq!(depths[0], 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(depths[1], 0.2, epsilon = 1e-6);

        Ok(())
    }
}
