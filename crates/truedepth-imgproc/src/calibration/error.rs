/// Errors raised while building a calibration profile.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CalibrationError {
    /// The calibration record is not valid JSON or misses a required field.
    #[error("Calibration record is malformed: {0}")]
    InvalidRecord(String),

    /// A lookup table is not valid base64.
    #[error("Lookup table `{name}` is not valid base64: {reason}")]
    InvalidBase64 {
        /// The name of the table.
        name: &'static str,
        /// The decoder message.
        reason: String,
    },

    /// A lookup table contains no samples.
    #[error("Lookup table `{0}` is empty")]
    EmptyLookup(&'static str),

    /// The decoded bytes of a lookup table are not a whole number of float32 samples.
    #[error("Lookup table `{name}` has {len} bytes, not a multiple of 4")]
    InvalidLookupBytes {
        /// The name of the table.
        name: &'static str,
        /// The decoded byte length.
        len: usize,
    },

    /// The intrinsic matrix does not hold 9 values.
    #[error("Intrinsic matrix must have 9 values, got {0}")]
    InvalidIntrinsicLength(usize),

    /// The focal lengths are zero or an entry of the intrinsic matrix is not finite.
    #[error("Intrinsic matrix is degenerate: fx={fx}, fy={fy}, cx={cx}, cy={cy}")]
    DegenerateIntrinsic {
        /// The focal length in the x direction.
        fx: f64,
        /// The focal length in the y direction.
        fy: f64,
        /// The x coordinate of the principal point.
        cx: f64,
        /// The y coordinate of the principal point.
        cy: f64,
    },

    /// The reference width of the intrinsics is not a positive number.
    #[error("Intrinsic reference width must be positive, got {0}")]
    InvalidReferenceWidth(f64),

    /// The target resolution has a zero dimension.
    #[error("Target size must be non-empty, got {0}x{1}")]
    InvalidTargetSize(usize, usize),
}
