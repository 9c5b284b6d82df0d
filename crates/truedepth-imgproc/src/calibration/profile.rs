use super::{CalibrationError, CameraIntrinsic, RadialLookup};
use truedepth_image::ImageSize;

/// The lens calibration of a depth camera, scaled to a target resolution.
///
/// Holds the working (row-major) intrinsic matrix with the focal lengths and the
/// principal point already multiplied by `target_width / reference_width`, together
/// with the forward and inverse radial distortion tables.
///
/// The profile is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationProfile {
    intrinsic_matrix: [[f64; 3]; 3],
    reference_width: f64,
    size: ImageSize,
    lookup: RadialLookup,
    inverse_lookup: RadialLookup,
}

impl CalibrationProfile {
    /// Build a profile from an unscaled row-major intrinsic matrix.
    ///
    /// # Arguments
    ///
    /// * `intrinsic_matrix` - The row-major intrinsic matrix computed at `reference_width`.
    /// * `reference_width` - The image width the intrinsics were computed at.
    /// * `lookup` - The forward radial distortion table.
    /// * `inverse_lookup` - The inverse radial distortion table.
    /// * `size` - The target resolution the profile is used at.
    ///
    /// # Errors
    ///
    /// Fails if the reference width is not positive, the target size is empty, or the
    /// scaled intrinsics are degenerate.
    pub fn new(
        intrinsic_matrix: [[f64; 3]; 3],
        reference_width: f64,
        lookup: RadialLookup,
        inverse_lookup: RadialLookup,
        size: ImageSize,
    ) -> Result<Self, CalibrationError> {
        if !(reference_width.is_finite() && reference_width > 0.0) {
            return Err(CalibrationError::InvalidReferenceWidth(reference_width));
        }

        if size.width == 0 || size.height == 0 {
            return Err(CalibrationError::InvalidTargetSize(size.width, size.height));
        }

        let scale = size.width as f64 / reference_width;

        let mut intrinsic_matrix = intrinsic_matrix;
        intrinsic_matrix[0][0] *= scale;
        intrinsic_matrix[1][1] *= scale;
        intrinsic_matrix[0][2] *= scale;
        intrinsic_matrix[1][2] *= scale;

        let profile = Self {
            intrinsic_matrix,
            reference_width,
            size,
            lookup,
            inverse_lookup,
        };

        let CameraIntrinsic { fx, fy, cx, cy } = profile.intrinsic();
        let finite = [fx, fy, cx, cy].iter().all(|v| v.is_finite());
        if !finite || fx == 0.0 || fy == 0.0 {
            return Err(CalibrationError::DegenerateIntrinsic { fx, fy, cx, cy });
        }

        Ok(profile)
    }

    /// Build a profile from the 9 intrinsic values as stored by the capture device.
    ///
    /// The device stores the matrix transposed with respect to the row-major
    /// convention, so the values are read row by row and then transposed.
    ///
    /// # Errors
    ///
    /// Fails with [`CalibrationError::InvalidIntrinsicLength`] if `stored` does not
    /// hold exactly 9 values, and otherwise as [`CalibrationProfile::new`].
    pub fn from_stored_intrinsic(
        stored: &[f64],
        reference_width: f64,
        lookup: RadialLookup,
        inverse_lookup: RadialLookup,
        size: ImageSize,
    ) -> Result<Self, CalibrationError> {
        if stored.len() != 9 {
            return Err(CalibrationError::InvalidIntrinsicLength(stored.len()));
        }

        let mut intrinsic_matrix = [[0.0; 3]; 3];
        for (r, row) in intrinsic_matrix.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = stored[c * 3 + r];
            }
        }

        Self::new(intrinsic_matrix, reference_width, lookup, inverse_lookup, size)
    }

    /// The scaled row-major intrinsic matrix.
    pub fn intrinsic_matrix(&self) -> &[[f64; 3]; 3] {
        &self.intrinsic_matrix
    }

    /// The scaled pinhole parameters.
    pub fn intrinsic(&self) -> CameraIntrinsic {
        let m = &self.intrinsic_matrix;
        CameraIntrinsic {
            fx: m[0][0],
            fy: m[1][1],
            cx: m[0][2],
            cy: m[1][2],
        }
    }

    /// The image width the intrinsics were originally computed at.
    pub fn reference_width(&self) -> f64 {
        self.reference_width
    }

    /// The factor applied to the intrinsics, `target_width / reference_width`.
    pub fn scale(&self) -> f64 {
        self.size.width as f64 / self.reference_width
    }

    /// The target resolution of the profile.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The forward radial distortion table.
    pub fn lookup(&self) -> &RadialLookup {
        &self.lookup
    }

    /// The inverse radial distortion table.
    pub fn inverse_lookup(&self) -> &RadialLookup {
        &self.inverse_lookup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> Result<(RadialLookup, RadialLookup), CalibrationError> {
        Ok((
            RadialLookup::new("lookup", vec![0.0, 0.1])?,
            RadialLookup::new("inverse", vec![0.0, -0.1])?,
        ))
    }

    #[test]
    fn profile_transposes_and_scales() -> Result<(), CalibrationError> {
        let (lookup, inverse_lookup) = tables()?;

        // column-major storage of [[fx, s, cx], [0, fy, cy], [0, 0, 1]]
        let stored = [
            2000.0, 0.0, 0.0, //
            0.5, 2100.0, 0.0, //
            1000.0, 750.0, 1.0,
        ];

        let profile = CalibrationProfile::from_stored_intrinsic(
            &stored,
            4000.0,
            lookup,
            inverse_lookup,
            ImageSize {
                width: 640,
                height: 480,
            },
        )?;

        assert_eq!(profile.scale(), 0.16);
        assert_eq!(profile.reference_width(), 4000.0);

        let m = profile.intrinsic_matrix();
        assert_eq!(m[0][0], 2000.0 * 0.16);
        assert_eq!(m[1][1], 2100.0 * 0.16);
        assert_eq!(m[0][2], 1000.0 * 0.16);
        assert_eq!(m[1][2], 750.0 * 0.16);
        // skew and the last row are untouched
        assert_eq!(m[0][1], 0.5);
        assert_eq!(m[2], [0.0, 0.0, 1.0]);

        let intrinsic = profile.intrinsic();
        assert_eq!(intrinsic.cx, 160.0);
        assert_eq!(intrinsic.cy, 120.0);

        Ok(())
    }

    #[test]
    fn profile_rejects_reference_width() -> Result<(), CalibrationError> {
        let size = [640, 480].into();
        for width in [0.0, -640.0, f64::NAN] {
            let (lookup, inverse_lookup) = tables()?;
            let res = CalibrationProfile::new(
                [[500.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]],
                width,
                lookup,
                inverse_lookup,
                size,
            );
            assert!(matches!(
                res,
                Err(CalibrationError::InvalidReferenceWidth(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn profile_rejects_intrinsic_length() -> Result<(), CalibrationError> {
        let (lookup, inverse_lookup) = tables()?;
        let res = CalibrationProfile::from_stored_intrinsic(
            &[1.0; 6],
            640.0,
            lookup,
            inverse_lookup,
            [640, 480].into(),
        );
        assert_eq!(res, Err(CalibrationError::InvalidIntrinsicLength(6)));
        Ok(())
    }

    #[test]
    fn profile_rejects_degenerate_intrinsic() -> Result<(), CalibrationError> {
        let (lookup, inverse_lookup) = tables()?;
        let res = CalibrationProfile::new(
            [[0.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]],
            640.0,
            lookup,
            inverse_lookup,
            [640, 480].into(),
        );
        assert!(matches!(
            res,
            Err(CalibrationError::DegenerateIntrinsic { .. })
        ));
        Ok(())
    }

    #[test]
    fn profile_rejects_empty_size() -> Result<(), CalibrationError> {
        let (lookup, inverse_lookup) = tables()?;
        let res = CalibrationProfile::new(
            [[500.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]],
            640.0,
            lookup,
            inverse_lookup,
            [0, 480].into(),
        );
        assert_eq!(res, Err(CalibrationError::InvalidTargetSize(0, 480)));
        Ok(())
    }
}
