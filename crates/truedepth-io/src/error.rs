/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Error when the file does not exist.
    #[error("File does not exist: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Error to open or read the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// An envelope is not valid JSON or misses a required field.
    #[error("Failed to parse the envelope. {0}")]
    JsonError(#[from] serde_json::Error),

    /// A base64 payload could not be decoded.
    #[error("Failed to decode the base64 payload. {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// The envelope payload is not valid UTF-8 once decoded.
    #[error("Failed to decode the envelope text. {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    /// The calibration values are invalid.
    #[error("Invalid calibration. {0}")]
    CalibrationError(#[from] truedepth_imgproc::calibration::CalibrationError),

    /// Error to create the image.
    #[error("Failed to create image. {0}")]
    ImageCreationError(#[from] truedepth_image::ImageError),
}
