use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::IoError;
use truedepth_image::ImageSize;
use truedepth_imgproc::calibration::{CalibrationError, CalibrationProfile, RadialLookup};

/// The calibration record exported by the capture device.
///
/// The lookup tables are base64 strings of packed little-endian float32 samples and
/// the intrinsic matrix holds 9 values in the device storage order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationRecord {
    /// The forward radial distortion table.
    pub lens_distortion_lookup: String,
    /// The inverse radial distortion table.
    pub inverse_lens_distortion_lookup: String,
    /// The 9 intrinsic values as stored by the device.
    pub intrinsic: Vec<f64>,
    /// The image width the intrinsics were computed at.
    pub intrinsic_reference_dimension_width: f64,
}

impl CalibrationRecord {
    /// Decode the record into a calibration profile scaled to `size`.
    ///
    /// # Errors
    ///
    /// Fails if a table is not valid base64, if its byte length is not a multiple of
    /// 4, or if the intrinsic values are invalid.
    pub fn into_profile(self, size: ImageSize) -> Result<CalibrationProfile, IoError> {
        let lookup = decode_lookup("lensDistortionLookup", &self.lens_distortion_lookup)?;
        let inverse_lookup = decode_lookup(
            "inverseLensDistortionLookup",
            &self.inverse_lens_distortion_lookup,
        )?;

        log::debug!(
            "decoded lookup tables with {} and {} samples",
            lookup.len(),
            inverse_lookup.len()
        );

        Ok(CalibrationProfile::from_stored_intrinsic(
            &self.intrinsic,
            self.intrinsic_reference_dimension_width,
            lookup,
            inverse_lookup,
            size,
        )?)
    }
}

/// Decode a base64 lookup table of little-endian float32 samples.
///
/// Line breaks and other whitespace inside the payload are ignored, as produced by
/// encoders that wrap long base64 lines.
///
/// # Errors
///
/// Fails with [`CalibrationError::InvalidBase64`] if the payload does not decode, and
/// with the errors of [`RadialLookup::from_le_bytes`] if the bytes are not a table.
pub fn decode_lookup(name: &'static str, encoded: &str) -> Result<RadialLookup, IoError> {
    let compact = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| CalibrationError::InvalidBase64 {
            name,
            reason: e.to_string(),
        })?;
    Ok(RadialLookup::from_le_bytes(name, &bytes)?)
}

/// Encode a lookup table as base64 of little-endian float32 samples.
pub fn encode_lookup(values: &[f32]) -> String {
    let bytes = values
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect::<Vec<_>>();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Parse a calibration record from its JSON text.
///
/// # Errors
///
/// Fails with [`CalibrationError::InvalidRecord`] if the text is malformed or a
/// required field is missing.
pub fn parse_calibration(json: &str) -> Result<CalibrationRecord, IoError> {
    let record = serde_json::from_str(json)
        .map_err(|e| CalibrationError::InvalidRecord(e.to_string()))?;
    Ok(record)
}

/// Load a calibration profile from its JSON text, scaled to `size`.
///
/// # Arguments
///
/// * `json` - The calibration record as JSON text.
/// * `size` - The target resolution of the profile.
///
/// # Errors
///
/// Every malformed record is reported as [`IoError::CalibrationError`].
///
/// # Example
///
/// ```
/// use truedepth_io::calibration::{encode_lookup, load_calibration};
///
/// let json = format!(
///     r#"{{
///         "lensDistortionLookup": "{0}",
///         "inverseLensDistortionLookup": "{0}",
///         "intrinsic": [1000.0, 0.0, 0.0, 0.0, 1000.0, 0.0, 640.0, 480.0, 1.0],
///         "intrinsicReferenceDimensionWidth": 1280.0
///     }}"#,
///     encode_lookup(&[0.0; 4]),
/// );
///
/// let profile = load_calibration(&json, [640, 480].into()).unwrap();
/// assert_eq!(profile.intrinsic().cx, 320.0);
/// ```
pub fn load_calibration(json: &str, size: ImageSize) -> Result<CalibrationProfile, IoError> {
    parse_calibration(json)?.into_profile(size)
}

/// Read a calibration profile from a JSON file, scaled to `size`.
///
/// # Arguments
///
/// * `file_path` - The path to the calibration JSON file.
/// * `size` - The target resolution of the profile.
pub fn read_calibration_file(
    file_path: impl AsRef<Path>,
    size: ImageSize,
) -> Result<CalibrationProfile, IoError> {
    let file_path = file_path.as_ref().to_owned();

    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path));
    }

    let json = std::fs::read_to_string(&file_path)?;
    load_calibration(&json, size)
}
