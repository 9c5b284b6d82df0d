use crate::parallel;

use super::interpolate::interpolate_pixel;
use super::InterpolationMode;
use truedepth_image::{Image, ImageError};

/// Apply generic geometric transformation to an image.
///
/// Every destination pixel is sampled from `src` at the coordinate stored in
/// `map_x`/`map_y`. Samples falling outside of the source image are written as
/// `border_value` in every channel, so callers can pick a value that downstream
/// validation rejects (e.g. a depth outside of the valid range).
///
/// # Arguments
///
/// * `src` - The input image container with shape (height, width, C).
/// * `dst` - The output image container with shape (height, width, C).
/// * `map_x` - The x coordinates of the pixels to interpolate.
/// * `map_y` - The y coordinates of the pixels to interpolate.
/// * `interpolation` - The interpolation mode to use.
/// * `border_value` - The value written for samples outside of `src`.
///
/// # Errors
///
/// * The mapx and mapy must have the same size.
/// * The output image must have the same size as the mapx and mapy.
pub fn remap<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    map_x: &Image<f32, 1>,
    map_y: &Image<f32, 1>,
    interpolation: InterpolationMode,
    border_value: f32,
) -> Result<(), ImageError> {
    if map_x.size() != map_y.size() {
        return Err(ImageError::InvalidImageSize(
            map_x.width(),
            map_x.height(),
            map_y.width(),
            map_y.height(),
        ));
    }

    if dst.size() != map_x.size() {
        return Err(ImageError::InvalidImageSize(
            map_x.width(),
            map_x.height(),
            dst.width(),
            dst.height(),
        ));
    }

    // parallelize the remap operation by rows
    parallel::par_iter_rows_resample(dst, map_x, map_y, |&x, &y, dst_pixel| {
        match interpolate_pixel(src, x, y, interpolation) {
            Some(pixel) => dst_pixel.copy_from_slice(&pixel),
            None => dst_pixel.fill(border_value),
        }
    });

    Ok(())
}
