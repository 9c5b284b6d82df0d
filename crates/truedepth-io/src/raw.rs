use crate::error::IoError;
use truedepth_image::{Image, ImageSize};

/// Create a 4-channel image from a packed BGRA byte buffer.
///
/// The buffer holds `width * height` pixels in row-major order, 4 bytes per pixel.
///
/// # Errors
///
/// Returns [`ShapeMismatch`](truedepth_image::ImageError::ShapeMismatch) if the
/// buffer length is not `width * height * 4`.
///
/// # Example
///
/// ```
/// use truedepth_io::raw::image_from_bgra_bytes;
///
/// let image = image_from_bgra_bytes(&[0u8; 2 * 3 * 4], [2, 3].into()).unwrap();
/// assert_eq!(image.num_channels(), 4);
/// ```
pub fn image_from_bgra_bytes(bytes: &[u8], size: ImageSize) -> Result<Image<u8, 4>, IoError> {
    Ok(Image::new(size, bytes.to_vec())?)
}

/// Create a depth buffer from packed little-endian float32 samples.
///
/// # Errors
///
/// Returns [`ShapeMismatch`](truedepth_image::ImageError::ShapeMismatch) if the
/// buffer length is not `width * height * 4`.
pub fn depth_from_le_bytes(bytes: &[u8], size: ImageSize) -> Result<Image<f32, 1>, IoError> {
    // 4 bytes per float32 sample
    size.check_len(bytes.len(), 4)?;

    let data = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok(Image::new(size, data)?)
}

/// Create a depth buffer from in-memory samples in meters.
///
/// # Errors
///
/// Returns [`ShapeMismatch`](truedepth_image::ImageError::ShapeMismatch) if `data`
/// does not hold `width * height` samples.
pub fn depth_from_vec(data: Vec<f32>, size: ImageSize) -> Result<Image<f32, 1>, IoError> {
    Ok(Image::new(size, data)?)
}
