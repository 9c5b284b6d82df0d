use crate::parallel;
use truedepth_image::{Image, ImageError};

/// Convert a BGRA image to an RGB image.
///
/// Swaps the red and blue channels and drops the alpha channel, which is the layout
/// of the raw color buffers delivered by the capture device.
///
/// # Arguments
///
/// * `src` - The input BGRA image.
/// * `dst` - The output RGB image.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use truedepth_image::{Image, ImageSize};
/// use truedepth_imgproc::color::rgb_from_bgra;
///
/// let bgra = Image::<u8, 4>::new(
///     ImageSize {
///         width: 1,
///         height: 1,
///     },
///     vec![10, 20, 30, 255],
/// )
/// .unwrap();
///
/// let mut rgb = Image::<u8, 3>::from_size_val(bgra.size(), 0).unwrap();
///
/// rgb_from_bgra(&bgra, &mut rgb).unwrap();
/// assert_eq!(rgb.as_slice(), &[30, 20, 10]);
/// ```
pub fn rgb_from_bgra<T>(src: &Image<T, 4>, dst: &mut Image<T, 3>) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        dst_pixel[0] = src_pixel[2];
        dst_pixel[1] = src_pixel[1];
        dst_pixel[2] = src_pixel[0];
    });

    Ok(())
}
