use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::IoError;
use truedepth_image::{Image, ImageSize};
use truedepth_imgproc::calibration::UndistortionMap;

/// An undistortion map as exchanged with a host application.
///
/// The map grids are flattened in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEnvelope {
    /// The source x coordinate of every output pixel.
    pub map_x: Vec<f32>,
    /// The source y coordinate of every output pixel.
    pub map_y: Vec<f32>,
    /// The width of the map.
    pub width: usize,
    /// The height of the map.
    pub height: usize,
}

impl MapEnvelope {
    /// Create an envelope from an undistortion map.
    pub fn from_map(map: &UndistortionMap) -> Self {
        let size = map.size();
        Self {
            map_x: map.map_x().as_slice().to_vec(),
            map_y: map.map_y().as_slice().to_vec(),
            width: size.width,
            height: size.height,
        }
    }

    /// Convert the envelope back into an undistortion map.
    ///
    /// # Errors
    ///
    /// Fails with [`ShapeMismatch`](truedepth_image::ImageError::ShapeMismatch) if a
    /// grid does not hold `width * height` values.
    pub fn into_map(self) -> Result<UndistortionMap, IoError> {
        let size = ImageSize {
            width: self.width,
            height: self.height,
        };
        Ok(UndistortionMap::new(
            Image::new(size, self.map_x)?,
            Image::new(size, self.map_y)?,
        )?)
    }
}

/// A depth buffer as exchanged with a host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthEnvelope {
    /// The depth samples flattened in row-major order.
    pub depth_map: Vec<f32>,
    /// The width of the buffer.
    pub width: usize,
    /// The height of the buffer.
    pub height: usize,
}

impl DepthEnvelope {
    /// Create an envelope from a depth buffer.
    pub fn from_depth(depth: &Image<f32, 1>) -> Self {
        Self {
            depth_map: depth.as_slice().to_vec(),
            width: depth.width(),
            height: depth.height(),
        }
    }

    /// Convert the envelope back into a depth buffer.
    ///
    /// # Errors
    ///
    /// Fails with [`ShapeMismatch`](truedepth_image::ImageError::ShapeMismatch) if the
    /// buffer does not hold `width * height` samples.
    pub fn into_depth(self) -> Result<Image<f32, 1>, IoError> {
        let size = ImageSize {
            width: self.width,
            height: self.height,
        };
        Ok(Image::new(size, self.depth_map)?)
    }
}

// NOTE: JSON has no NaN literal, serde_json writes non-finite floats as `null`.
fn encode<T: Serialize>(envelope: &T) -> Result<String, IoError> {
    let json = serde_json::to_string(envelope)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

fn decode_json(encoded: &str) -> Result<String, IoError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// Encode an undistortion map as base64 of its JSON envelope.
///
/// # Example
///
/// ```
/// use truedepth_image::Image;
/// use truedepth_imgproc::calibration::UndistortionMap;
/// use truedepth_io::envelope::{decode_map_envelope, encode_map_envelope};
///
/// let map = UndistortionMap::new(
///     Image::new([2, 1].into(), vec![0.0, 1.0]).unwrap(),
///     Image::new([2, 1].into(), vec![0.0, 0.0]).unwrap(),
/// ).unwrap();
///
/// let encoded = encode_map_envelope(&map).unwrap();
/// assert_eq!(decode_map_envelope(&encoded).unwrap(), map);
/// ```
pub fn encode_map_envelope(map: &UndistortionMap) -> Result<String, IoError> {
    encode(&MapEnvelope::from_map(map))
}

/// Decode an undistortion map from base64 of its JSON envelope.
///
/// # Errors
///
/// Fails if the payload is not base64 encoded JSON, or if the grids do not match
/// the declared size.
pub fn decode_map_envelope(encoded: &str) -> Result<UndistortionMap, IoError> {
    let envelope: MapEnvelope = serde_json::from_str(&decode_json(encoded)?)?;
    envelope.into_map()
}

/// Encode a depth buffer as base64 of its JSON envelope.
///
/// Samples that are not finite are written as JSON `null`, so sentinel filled
/// buffers are preferred over raw ones.
pub fn encode_depth_envelope(depth: &Image<f32, 1>) -> Result<String, IoError> {
    encode(&DepthEnvelope::from_depth(depth))
}

/// Decode a depth buffer from base64 of its JSON envelope.
///
/// # Errors
///
/// Fails if the payload is not base64 encoded JSON, or if the buffer does not match
/// the declared size.
pub fn decode_depth_envelope(encoded: &str) -> Result<Image<f32, 1>, IoError> {
    let envelope: DepthEnvelope = serde_json::from_str(&decode_json(encoded)?)?;
    envelope.into_depth()
}
