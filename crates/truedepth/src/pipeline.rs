use crate::config::PipelineConfig;
use truedepth_3d::{
    pointcloud::PointCloud,
    rgbd::{backproject_points, backproject_rgbd, ColorOutput, RgbdImage},
};
use truedepth_image::{ops::cast_and_scale, Image, ImageError, ImageSize};
use truedepth_imgproc::{
    calibration::{
        generate_undistortion_map_lookup, CalibrationError, CalibrationProfile, CameraIntrinsic,
        UndistortionMap,
    },
    color::rgb_from_bgra,
    depth::{validate_depth, DepthError, DepthMask, DepthRange, DEPTH_SENTINEL},
    interpolation::InterpolationMode,
};
use truedepth_io::{
    calibration::load_calibration,
    envelope::{encode_depth_envelope, encode_map_envelope},
    raw::{depth_from_le_bytes, image_from_bgra_bytes},
    IoError,
};

/// The color written where the undistortion map samples outside of the raw image.
const COLOR_BORDER: f32 = 0.0;

/// An error type for the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The configuration cannot drive a pipeline.
    #[error("Invalid pipeline configuration. {0}")]
    InvalidConfig(String),

    /// The configuration JSON is malformed.
    #[error("Failed to parse the configuration. {0}")]
    JsonError(#[from] serde_json::Error),

    /// The calibration is invalid.
    #[error("Invalid calibration. {0}")]
    CalibrationError(#[from] CalibrationError),

    /// The depth range is invalid.
    #[error("Invalid depth settings. {0}")]
    DepthError(#[from] DepthError),

    /// A record, buffer or envelope could not be decoded.
    #[error(transparent)]
    IoError(#[from] IoError),

    /// An image has an unexpected shape.
    #[error(transparent)]
    ImageError(#[from] ImageError),
}

/// A raw frame as delivered by the capture device.
#[derive(Debug, Clone)]
pub struct RawFrame {
    bgra: Image<u8, 4>,
    depth: Image<f32, 1>,
}

impl RawFrame {
    /// Create a raw frame from a BGRA color image and a depth buffer in meters.
    ///
    /// # Errors
    ///
    /// Fails if the color image and the depth buffer do not have the same size.
    pub fn new(bgra: Image<u8, 4>, depth: Image<f32, 1>) -> Result<Self, PipelineError> {
        if bgra.size() != depth.size() {
            return Err(ImageError::InvalidImageSize(
                bgra.width(),
                bgra.height(),
                depth.width(),
                depth.height(),
            )
            .into());
        }
        Ok(Self { bgra, depth })
    }

    /// Create a raw frame from packed BGRA bytes and packed little-endian float32 depth.
    pub fn from_bytes(bgra: &[u8], depth: &[u8], size: ImageSize) -> Result<Self, PipelineError> {
        Self::new(
            image_from_bgra_bytes(bgra, size)?,
            depth_from_le_bytes(depth, size)?,
        )
    }

    /// The size of the frame.
    pub fn size(&self) -> ImageSize {
        self.depth.size()
    }

    /// The BGRA color image.
    pub fn bgra(&self) -> &Image<u8, 4> {
        &self.bgra
    }

    /// The raw depth buffer.
    pub fn depth(&self) -> &Image<f32, 1> {
        &self.depth
    }
}

/// A frame resampled through the undistortion map.
///
/// The color image holds RGB intensities in `[0, 255]`. Pixels whose source falls
/// outside the raw frame hold a black color and the depth sentinel.
#[derive(Debug, Clone)]
pub struct UndistortedFrame {
    rgbd: RgbdImage,
}

impl UndistortedFrame {
    /// The undistorted RGB image.
    pub fn color(&self) -> &Image<f32, 3> {
        self.rgbd.color()
    }

    /// The undistorted depth buffer.
    pub fn depth(&self) -> &Image<f32, 1> {
        self.rgbd.depth()
    }

    /// The undistorted frame as an RGB-D image.
    pub fn rgbd(&self) -> &RgbdImage {
        &self.rgbd
    }
}

/// A depth buffer after validation, with its mask.
#[derive(Debug, Clone)]
pub struct ValidatedDepth {
    /// The dense depth buffer, rejected samples hold [`DEPTH_SENTINEL`].
    pub depth: Image<f32, 1>,
    /// The validity mask of the depth buffer.
    pub mask: DepthMask,
}

/// The undistortion and back-projection pipeline of one calibrated camera.
///
/// The undistortion map is built once on construction and shared by every frame.
/// Each stage takes its input by reference and returns a new value, so a pipeline
/// can serve frames from several threads.
///
/// # Example
///
/// ```
/// use truedepth::{PipelineConfig, RawFrame, RgbdPipeline};
/// use truedepth::image::Image;
/// use truedepth::imgproc::calibration::{CalibrationProfile, RadialLookup};
///
/// let config = PipelineConfig { width: 4, height: 3, ..Default::default() };
/// let profile = CalibrationProfile::new(
///     [[4.0, 0.0, 2.0], [0.0, 4.0, 1.0], [0.0, 0.0, 1.0]],
///     4.0,
///     RadialLookup::new("lookup", vec![0.0; 8]).unwrap(),
///     RadialLookup::new("inverse", vec![0.0; 8]).unwrap(),
///     config.size(),
/// ).unwrap();
///
/// let pipeline = RgbdPipeline::new(profile, config).unwrap();
///
/// let frame = RawFrame::new(
///     Image::from_size_val([4, 3].into(), 128).unwrap(),
///     Image::from_size_val([4, 3].into(), 0.3).unwrap(),
/// ).unwrap();
///
/// let pointcloud = pipeline.pointcloud(&frame).unwrap();
/// assert_eq!(pointcloud.len(), 12);
/// ```
#[derive(Debug, Clone)]
pub struct RgbdPipeline {
    profile: CalibrationProfile,
    config: PipelineConfig,
    range: DepthRange,
    map: UndistortionMap,
}

impl RgbdPipeline {
    /// Create a pipeline and build its undistortion map.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or if the profile was scaled to a
    /// different size than the configured frame size.
    pub fn new(profile: CalibrationProfile, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let size = config.size();
        if profile.size() != size {
            return Err(PipelineError::InvalidConfig(format!(
                "calibration is scaled to {} but frames are {}",
                profile.size(),
                size
            )));
        }

        let range = config.depth_range()?;
        let map = generate_undistortion_map_lookup(&profile, size)?;

        log::debug!(
            "built undistortion map {} with scale {} and {} inverse lookup samples",
            size,
            profile.scale(),
            profile.inverse_lookup().len()
        );

        Ok(Self {
            profile,
            config,
            range,
            map,
        })
    }

    /// Create a pipeline from the JSON calibration record of the camera.
    pub fn from_calibration_json(
        json: &str,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let profile = load_calibration(json, config.size())?;
        Self::new(profile, config)
    }

    /// The calibration profile scaled to the frame size.
    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The scaled camera intrinsics.
    pub fn intrinsic(&self) -> CameraIntrinsic {
        self.profile.intrinsic()
    }

    /// The accepted depth range.
    pub fn depth_range(&self) -> &DepthRange {
        &self.range
    }

    /// The undistortion map shared by every frame.
    pub fn map(&self) -> &UndistortionMap {
        &self.map
    }

    fn color_output(&self) -> ColorOutput {
        if self.config.linearize_color {
            ColorOutput::Linear
        } else {
            ColorOutput::Srgb
        }
    }

    /// Resample the color image and the depth buffer of a raw frame.
    ///
    /// Both modalities go through the same map with bilinear interpolation.
    pub fn undistort(&self, frame: &RawFrame) -> Result<UndistortedFrame, PipelineError> {
        let size = self.map.size();
        if frame.size() != size {
            return Err(ImageError::InvalidImageSize(
                frame.size().width,
                frame.size().height,
                size.width,
                size.height,
            )
            .into());
        }

        let mut rgb = Image::<u8, 3>::from_size_val(size, 0)?;
        rgb_from_bgra(frame.bgra(), &mut rgb)?;

        let mut rgb_f32 = Image::<f32, 3>::from_size_val(size, 0.0)?;
        cast_and_scale(&rgb, &mut rgb_f32, 1.0)?;

        let color = self
            .map
            .apply(&rgb_f32, InterpolationMode::Bilinear, COLOR_BORDER)?;
        let depth = self
            .map
            .apply(frame.depth(), InterpolationMode::Bilinear, DEPTH_SENTINEL)?;

        log::debug!("undistorted color and depth buffers of {}", size);

        Ok(UndistortedFrame {
            rgbd: RgbdImage::new(color, depth)?,
        })
    }

    /// Validate the depth buffer of an undistorted frame.
    pub fn validate(&self, frame: &UndistortedFrame) -> Result<ValidatedDepth, PipelineError> {
        let (depth, mask) = validate_depth(frame.depth(), &self.range)?;
        log::debug!(
            "validated depth: {} of {} samples in ({}, {})",
            mask.count_valid(),
            mask.size().area(),
            self.range.min(),
            self.range.max()
        );
        Ok(ValidatedDepth { depth, mask })
    }

    /// Back-project an undistorted frame whose depth was validated.
    ///
    /// Only pixels marked valid produce a point, in row-major order.
    pub fn backproject(
        &self,
        frame: &UndistortedFrame,
        validated: &ValidatedDepth,
    ) -> Result<PointCloud, PipelineError> {
        let rgbd = RgbdImage::new(frame.color().clone(), validated.depth.clone())?;
        let pointcloud =
            backproject_rgbd(&rgbd, &self.intrinsic(), &self.range, self.color_output());
        log_points(&pointcloud);
        Ok(pointcloud)
    }

    /// Back-project sub-pixel coordinates of an undistorted frame.
    ///
    /// Coordinates are rounded to the nearest pixel. Coordinates outside the frame or
    /// with an invalid depth are skipped and the others keep their order.
    pub fn backproject_points(&self, points: &[[f32; 2]], frame: &UndistortedFrame) -> PointCloud {
        let pointcloud = backproject_points(
            points,
            frame.rgbd(),
            &self.intrinsic(),
            &self.range,
            self.color_output(),
        );
        log::debug!(
            "back-projected {} of {} landmarks",
            pointcloud.len(),
            points.len()
        );
        pointcloud
    }

    /// Run every stage on a raw frame and return its colored point cloud.
    pub fn pointcloud(&self, frame: &RawFrame) -> Result<PointCloud, PipelineError> {
        let undistorted = self.undistort(frame)?;
        let validated = self.validate(&undistorted)?;
        self.backproject(&undistorted, &validated)
    }

    /// Encode the undistortion map as a base64 JSON envelope.
    pub fn map_envelope(&self) -> Result<String, PipelineError> {
        Ok(encode_map_envelope(&self.map)?)
    }

    /// Encode a depth buffer as a base64 JSON envelope.
    pub fn depth_envelope(&self, depth: &Image<f32, 1>) -> Result<String, PipelineError> {
        Ok(encode_depth_envelope(depth)?)
    }
}

fn log_points(pointcloud: &PointCloud) {
    if pointcloud.is_empty() {
        log::warn!("frame produced no valid points");
        return;
    }
    log::debug!(
        "back-projected {} points, bounds {:?} to {:?}",
        pointcloud.len(),
        pointcloud.min_bound(),
        pointcloud.max_bound()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use truedepth_imgproc::calibration::RadialLookup;

    fn pipeline(config: PipelineConfig) -> Result<RgbdPipeline, PipelineError> {
        let size = config.size();
        let profile = CalibrationProfile::new(
            [
                [2.0, 0.0, 0.5],
                [0.0, 4.0, 0.5],
                [0.0, 0.0, 1.0],
            ],
            size.width as f64,
            RadialLookup::new("lookup", vec![0.0; 4])?,
            RadialLookup::new("inverse", vec![0.0; 4])?,
            size,
        )?;
        RgbdPipeline::new(profile, config)
    }

    fn config_2x2() -> PipelineConfig {
        PipelineConfig {
            width: 2,
            height: 2,
            ..Default::default()
        }
    }

    fn frame(depth: Vec<f32>) -> Result<RawFrame, PipelineError> {
        let bgra = Image::new(
            [2, 2].into(),
            vec![
                0, 0, 255, 255, 0, 255, 0, 255, //
                255, 0, 0, 255, 204, 102, 51, 255,
            ],
        )?;
        RawFrame::new(bgra, Image::new([2, 2].into(), depth)?)
    }

    #[test]
    fn pipeline_single_valid_point() -> Result<(), PipelineError> {
        let pipeline = pipeline(config_2x2())?;
        let raw = frame(vec![f32::NAN, f32::NAN, f32::NAN, 0.3])?;

        let undistorted = pipeline.undistort(&raw)?;
        assert_eq!(
            undistorted.color().as_slice()[..6],
            [255.0, 0.0, 0.0, 0.0, 255.0, 0.0]
        );

        let validated = pipeline.validate(&undistorted)?;
        assert_eq!(validated.mask.as_image().as_slice(), &[0, 0, 0, 255]);
        assert_eq!(
            validated.depth.as_slice()[..3],
            [DEPTH_SENTINEL, DEPTH_SENTINEL, DEPTH_SENTINEL]
        );

        let pointcloud = pipeline.backproject(&undistorted, &validated)?;
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
    fn pipeline_linear_color() -> Result<(), PipelineError> {
        let pipeline = pipeline(PipelineConfig {
            linearize_color: true,
            ..config_2x2()
        })?;
        let pointcloud = pipeline.pointcloud(&frame(vec![f32::NAN, f32::NAN, f32::NAN, 0.3])?)?;

        let c = pointcloud.colors()[0];
        assert_abs_diff_eq!(c[0], 0.033_104_77, epsilon = 1e-5);

        Ok(())
    }

    #[test]
    fn pipeline_landmarks() -> Result<(), PipelineError> {
        let pipeline = pipeline(config_2x2())?;
        let undistorted = pipeline.undistort(&frame(vec![0.2, 0.3, 0.4, 0.05])?)?;

        let pointcloud =
            pipeline.backproject_points(&[[0.2, 1.2], [3.0, 0.0], [1.1, 1.0]], &undistorted);
        assert_eq!(pointcloud.len(), 1);
        assert_abs_diff_eq!(pointcloud.points()[0][2], 0.4, epsilon = 1e-6);

        Ok(())
    }

    #[test]
    fn pipeline_rejects_frame_size() -> Result<(), PipelineError> {
        let pipeline = pipeline(config_2x2())?;
        let raw = RawFrame::new(
            Image::from_size_val([3, 2].into(), 0)?,
            Image::from_size_val([3, 2].into(), 0.3)?,
        )?;
        assert!(matches!(
            pipeline.undistort(&raw),
            Err(PipelineError::ImageError(ImageError::InvalidImageSize(
                3, 2, 2, 2
            )))
        ));
        Ok(())
    }

    #[test]
    fn raw_frame_rejects_short_buffers() {
        let depth = [0.3f32; 4]
            .iter()
            .flat_map(|d| d.to_le_bytes())
            .collect::<Vec<_>>();

        // one byte short of 2x2 BGRA
        let res = RawFrame::from_bytes(&[0u8; 15], &depth, [2, 2].into());
        assert!(matches!(
            res,
            Err(PipelineError::IoError(IoError::ImageCreationError(
                ImageError::ShapeMismatch(15, 16)
            )))
        ));

        let res = RawFrame::from_bytes(&[0u8; 16], &depth[..12], [2, 2].into());
        assert!(matches!(
            res,
            Err(PipelineError::IoError(IoError::ImageCreationError(
                ImageError::ShapeMismatch(12, 16)
            )))
        ));
    }

    #[test]
    fn pipeline_rejects_profile_size() -> Result<(), PipelineError> {
        let profile = CalibrationProfile::new(
            [[2.0, 0.0, 0.5], [0.0, 4.0, 0.5], [0.0, 0.0, 1.0]],
            2.0,
            RadialLookup::new("lookup", vec![0.0])?,
            RadialLookup::new("inverse", vec![0.0])?,
            [4, 4].into(),
        )?;
        assert!(matches!(
            RgbdPipeline::new(profile, config_2x2()),
            Err(PipelineError::InvalidConfig(_))
        ));
        Ok(())
    }

    #[test]
    fn raw_frame_size_mismatch() -> Result<(), PipelineError> {
        let res = RawFrame::new(
            Image::from_size_val([2, 2].into(), 0)?,
            Image::from_size_val([2, 1].into(), 0.3)?,
        );
        assert!(matches!(res, Err(PipelineError::ImageError(_))));
        Ok(())
    }
}
