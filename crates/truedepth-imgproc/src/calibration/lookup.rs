use super::CalibrationError;

/// A 1D radial distortion lookup table.
///
/// The samples are uniformly spaced over the normalized radius `[0, 1]` and hold the
/// fractional scale correction to apply at that radius. Sample `i` sits at table
/// position `i`, so a normalized radius `r` maps to position `r * len`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialLookup {
    values: Vec<f32>,
}

impl RadialLookup {
    /// Create a lookup table from its samples.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the table, used in error messages.
    /// * `values` - The table samples ordered by increasing radius.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::EmptyLookup`] if `values` is empty.
    pub fn new(name: &'static str, values: Vec<f32>) -> Result<Self, CalibrationError> {
        if values.is_empty() {
            return Err(CalibrationError::EmptyLookup(name));
        }
        Ok(Self { values })
    }

    /// Decode a lookup table from packed little-endian float32 samples.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::InvalidLookupBytes`] if the byte length is not a
    /// multiple of 4, and [`CalibrationError::EmptyLookup`] if there are no bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use truedepth_imgproc::calibration::RadialLookup;
    ///
    /// let bytes = [0.5f32.to_le_bytes(), 1.0f32.to_le_bytes()].concat();
    /// let lookup = RadialLookup::from_le_bytes("lookup", &bytes).unwrap();
    /// assert_eq!(lookup.as_slice(), &[0.5, 1.0]);
    /// ```
    pub fn from_le_bytes(name: &'static str, bytes: &[u8]) -> Result<Self, CalibrationError> {
        if bytes.len() % 4 != 0 {
            return Err(CalibrationError::InvalidLookupBytes {
                name,
                len: bytes.len(),
            });
        }

        let values = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Self::new(name, values)
    }

    /// The number of samples in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false, tables are validated to be non-empty on construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The table samples.
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Linearly interpolate the table at a fractional position.
    ///
    /// Positions before the first sample return the first sample and positions at or
    /// beyond the last sample return the last one. NaN positions return the first
    /// sample.
    ///
    /// # Arguments
    ///
    /// * `t` - The position in table index space, i.e. `normalized_radius * len`.
    pub fn interpolate(&self, t: f64) -> f64 {
        let last = self.values.len() - 1;

        if t.is_nan() || t <= 0.0 {
            return self.values[0] as f64;
        }

        let i = t.floor() as usize;
        if i >= last {
            return self.values[last] as f64;
        }

        let alpha = t - i as f64;
        self.values[i] as f64 * (1.0 - alpha) + self.values[i + 1] as f64 * alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lookup_empty() {
        assert_eq!(
            RadialLookup::new("inverse", vec![]),
            Err(CalibrationError::EmptyLookup("inverse"))
        );
        assert_eq!(
            RadialLookup::from_le_bytes("inverse", &[]),
            Err(CalibrationError::EmptyLookup("inverse"))
        );
    }

    #[test]
    fn lookup_invalid_bytes() {
        assert_eq!(
            RadialLookup::from_le_bytes("forward", &[0, 0, 0, 0, 1]),
            Err(CalibrationError::InvalidLookupBytes {
                name: "forward",
                len: 5
            })
        );
    }

    #[test]
    fn lookup_interpolate() -> Result<(), CalibrationError> {
        let lookup = RadialLookup::new("lookup", vec![0.0, 1.0, 3.0])?;

        assert_eq!(lookup.interpolate(0.0), 0.0);
        assert_eq!(lookup.interpolate(-2.0), 0.0);
        assert_eq!(lookup.interpolate(f64::NAN), 0.0);
        assert_relative_eq!(lookup.interpolate(0.25), 0.25);
        assert_relative_eq!(lookup.interpolate(1.5), 2.0);
        assert_eq!(lookup.interpolate(2.0), 3.0);
        assert_eq!(lookup.interpolate(3.0), 3.0);
        assert_eq!(lookup.interpolate(100.0), 3.0);

        Ok(())
    }

    #[test]
    fn lookup_single_sample() -> Result<(), CalibrationError> {
        let lookup = RadialLookup::new("lookup", vec![0.25])?;
        assert_eq!(lookup.interpolate(0.0), 0.25);
        assert_eq!(lookup.interpolate(0.5), 0.25);
        assert_eq!(lookup.interpolate(1.0), 0.25);
        Ok(())
    }
}
