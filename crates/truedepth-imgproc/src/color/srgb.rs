use crate::parallel;
use truedepth_image::{Image, ImageError};

/// Convert an sRGB encoded intensity in `[0, 1]` to linear intensity.
///
/// Uses the standard piecewise transfer function:
///
/// * `c <= 0.04045`: `c / 12.92`
/// * otherwise: `((c + 0.055) / 1.055) ^ 2.4`
#[inline]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert a linear intensity in `[0, 1]` to sRGB encoding.
///
/// The inverse of [`srgb_to_linear`]:
///
/// * `c <= 0.0031308`: `c * 12.92`
/// * otherwise: `1.055 * c ^ (1 / 2.4) - 0.055`
#[inline]
pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Convert an sRGB image with values in `[0, 1]` to linear intensities.
///
/// # Arguments
///
/// * `src` - The input sRGB image.
/// * `dst` - The output linear image.
///
/// Precondition: the input and output images must have the same size.
pub fn linear_from_srgb<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
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
        *dst_pixel = srgb_to_linear(*src_pixel);
    });

    Ok(())
}

/// Convert a linear image with values in `[0, 1]` to sRGB encoding.
///
/// # Arguments
///
/// * `src` - The input linear image.
/// * `dst` - The output sRGB image.
///
/// Precondition: the input and output images must have the same size.
pub fn srgb_from_linear<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
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
        *dst_pixel = linear_to_srgb(*src_pixel);
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_srgb_to_linear_segments() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert_abs_diff_eq!(srgb_to_linear(0.04045), 0.04045 / 12.92);
        assert_abs_diff_eq!(srgb_to_linear(1.0), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(srgb_to_linear(0.5), 0.214_041_14, epsilon = 1e-5);
    }

    #[test]
    fn test_srgb_round_trip() {
        for i in 0..=1000 {
            let c = i as f32 / 1000.0;
            assert_abs_diff_eq!(linear_to_srgb(srgb_to_linear(c)), c, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_linear_from_srgb_image() -> Result<(), ImageError> {
        let image = Image::<f32, 3>::new([2, 1].into(), vec![0.0, 0.5, 1.0, 0.02, 0.04045, 0.8])?;

        let mut linear = Image::<f32, 3>::from_size_val(image.size(), 0.0)?;
        linear_from_srgb(&image, &mut linear)?;

        for (l, s) in linear.as_slice().iter().zip(image.as_slice()) {
            assert_eq!(*l, srgb_to_linear(*s));
        }

        let mut back = Image::<f32, 3>::from_size_val(image.size(), 0.0)?;
        srgb_from_linear(&linear, &mut back)?;

        for (b, s) in back.as_slice().iter().zip(image.as_slice()) {
            assert_abs_diff_eq!(*b, *s, epsilon = 1e-5);
        }

        Ok(())
    }
}
