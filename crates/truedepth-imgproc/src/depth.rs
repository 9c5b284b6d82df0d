use crate::parallel;
use truedepth_image::{Image, ImageError, ImageSize};

/// The value written to depth samples rejected by validation.
pub const DEPTH_SENTINEL: f32 = -1000.0;

/// The mask value of a valid depth sample.
pub const MASK_VALID: u8 = 255;

/// The mask value of an invalid depth sample.
pub const MASK_INVALID: u8 = 0;

/// Errors raised by depth validation.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DepthError {
    /// The depth range is empty, not finite, or accepts the sentinel value.
    #[error("Invalid depth range ({0}, {1})")]
    InvalidRange(f32, f32),

    /// An image operation failed.
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// The open interval of accepted depth values, `min < depth < max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthRange {
    min: f32,
    max: f32,
}

impl Default for DepthRange {
    fn default() -> Self {
        Self { min: 0.1, max: 0.5 }
    }
}

impl DepthRange {
    /// Create a depth range.
    ///
    /// # Errors
    ///
    /// Fails if either bound is not finite, if `min >= max`, or if the range would
    /// accept [`DEPTH_SENTINEL`].
    pub fn new(min: f32, max: f32) -> Result<Self, DepthError> {
        let valid = min.is_finite() && max.is_finite() && min < max && min >= DEPTH_SENTINEL;
        if !valid {
            return Err(DepthError::InvalidRange(min, max));
        }
        Ok(Self { min, max })
    }

    /// The exclusive lower bound.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// The exclusive upper bound.
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Check whether a depth value is valid. NaN is never valid.
    #[inline]
    pub fn contains(&self, depth: f32) -> bool {
        depth > self.min && depth < self.max
    }
}

/// A per-pixel validity mask with [`MASK_VALID`] / [`MASK_INVALID`] entries.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMask(Image<u8, 1>);

impl DepthMask {
    /// The size of the mask.
    pub fn size(&self) -> ImageSize {
        self.0.size()
    }

    /// The mask as a byte image, e.g. to use as an alpha channel.
    pub fn as_image(&self) -> &Image<u8, 1> {
        &self.0
    }

    /// Consume the mask and return the byte image.
    pub fn into_image(self) -> Image<u8, 1> {
        self.0
    }

    /// Check whether the pixel at `(x, y)` is valid. Out of bounds pixels are invalid.
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        self.0.get([y, x, 0]) == Some(&MASK_VALID)
    }

    /// The number of valid pixels.
    pub fn count_valid(&self) -> usize {
        self.0
            .as_slice()
            .iter()
            .filter(|&&m| m == MASK_VALID)
            .count()
    }
}

/// Compute the validity mask of a depth buffer.
///
/// # Arguments
///
/// * `src` - The input depth buffer.
/// * `dst` - The output mask, [`MASK_VALID`] where the depth is in range.
/// * `range` - The accepted depth range.
///
/// Precondition: the input and output images must have the same size.
pub fn depth_in_range(
    src: &Image<f32, 1>,
    dst: &mut Image<u8, 1>,
    range: &DepthRange,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows_val(src, dst, |src_pixel, dst_pixel| {
        *dst_pixel = if range.contains(*src_pixel) {
            MASK_VALID
        } else {
            MASK_INVALID
        };
    });

    Ok(())
}

/// Validate a depth buffer against a depth range.
///
/// Returns a dense copy of the buffer where every rejected sample (NaN or out of
/// range) is replaced with [`DEPTH_SENTINEL`], together with the mask recording the
/// same decision. Validating the returned buffer again yields the same mask.
///
/// # Example
///
/// ```
/// use truedepth_image::Image;
/// use truedepth_imgproc::depth::{validate_depth, DepthRange, DEPTH_SENTINEL};
///
/// let depth = Image::<f32, 1>::new([3, 1].into(), vec![0.3, f32::NAN, 0.5]).unwrap();
/// let (masked, mask) = validate_depth(&depth, &DepthRange::default()).unwrap();
///
/// assert_eq!(masked.as_slice(), &[0.3, DEPTH_SENTINEL, DEPTH_SENTINEL]);
/// assert_eq!(mask.count_valid(), 1);
/// ```
pub fn validate_depth(
    depth: &Image<f32, 1>,
    range: &DepthRange,
) -> Result<(Image<f32, 1>, DepthMask), DepthError> {
    let mut mask = Image::from_size_val(depth.size(), MASK_INVALID)?;
    depth_in_range(depth, &mut mask, range)?;

    let mut masked = Image::from_size_val(depth.size(), DEPTH_SENTINEL)?;
    parallel::par_iter_rows_val_two(depth, &mask, &mut masked, |d, m, out| {
        *out = if *m == MASK_VALID { *d } else { DEPTH_SENTINEL };
    });

    Ok((masked, DepthMask(mask)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_range() -> Result<(), DepthError> {
        let range = DepthRange::new(0.1, 0.5)?;
        assert!(range.contains(0.3));
        assert!(!range.contains(0.1));
        assert!(!range.contains(0.5));
        assert!(!range.contains(f32::NAN));
        assert!(!range.contains(DEPTH_SENTINEL));
        assert_eq!(range, DepthRange::default());
        Ok(())
    }

    #[test]
    fn test_depth_range_invalid() {
        assert_eq!(
            DepthRange::new(0.5, 0.1),
            Err(DepthError::InvalidRange(0.5, 0.1))
        );
        assert_eq!(
            DepthRange::new(-2000.0, 0.1),
            Err(DepthError::InvalidRange(-2000.0, 0.1))
        );
        assert!(DepthRange::new(f32::NAN, 0.1).is_err());
        assert!(DepthRange::new(0.1, f32::INFINITY).is_err());
    }

    #[test]
    fn test_validate_depth() -> Result<(), DepthError> {
        let depth = Image::<f32, 1>::new([2, 2].into(), vec![0.3, f32::NAN, 0.05, 0.7])?;

        let (masked, mask) = validate_depth(&depth, &DepthRange::default())?;

        assert_eq!(
            masked.as_slice(),
            &[0.3, DEPTH_SENTINEL, DEPTH_SENTINEL, DEPTH_SENTINEL]
        );
        assert_eq!(mask.as_image().as_slice(), &[255, 0, 0, 0]);
        assert!(mask.is_valid(0, 0));
        assert!(!mask.is_valid(1, 0));
        assert!(!mask.is_valid(5, 5));
        assert_eq!(mask.count_valid(), 1);

        Ok(())
    }

    #[test]
    fn test_validate_depth_is_idempotent() -> Result<(), DepthError> {
        let values = (0..64).map(|i| i as f32 * 0.01).collect::<Vec<_>>();
        let depth = Image::<f32, 1>::new([8, 8].into(), values)?;
        let range = DepthRange::default();

        let (masked, mask) = validate_depth(&depth, &range)?;
        let (masked_again, mask_again) = validate_depth(&masked, &range)?;

        assert_eq!(mask, mask_again);
        assert_eq!(masked, masked_again);

        Ok(())
    }

    #[test]
    fn test_validate_depth_all_nan() -> Result<(), DepthError> {
        let depth = Image::<f32, 1>::from_size_val([4, 3].into(), f32::NAN)?;
        let (masked, mask) = validate_depth(&depth, &DepthRange::default())?;

        assert_eq!(mask.count_valid(), 0);
        assert!(masked.as_slice().iter().all(|&d| d == DEPTH_SENTINEL));

        Ok(())
    }
}
