//! Error types for featpyr.

use thiserror::Error;

/// Result alias for featpyr operations.
pub type FeatResult<T> = std::result::Result<T, FeatError>;

/// Errors that can occur when running featpyr algorithms.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FeatError {
    /// Width or height is zero or overflows the address space.
    #[error("invalid dimensions: width={width}, height={height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer cannot hold the described image.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Two images that must share a shape do not.
    #[error(
        "size mismatch: expected {expected_width}x{expected_height}, got {width}x{height}"
    )]
    SizeMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },
    /// The requested ROI does not fit inside the image.
    #[error(
        "roi out of bounds: x={x}, y={y}, width={width}, height={height}, image={img_width}x{img_height}"
    )]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The intensity strategy needs a derivative image that was not supplied.
    #[error("missing derivative image: {0}")]
    MissingDerivative(&'static str),
    /// An index is outside the valid range of a collection.
    #[error("index {index} out of bounds for {context} (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// Pyramid scales must be positive and strictly increasing.
    #[error("invalid scale {scale} at pyramid layer {index}")]
    InvalidScale { index: usize, scale: f64 },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image decoding failed.
    #[error("image I/O error: {reason}")]
    ImageIo { reason: String },
}
