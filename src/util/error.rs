//! Error types for pixelfind.

use thiserror::Error;

/// Result alias for pixelfind operations.
pub type PixelFindResult<T> = std::result::Result<T, PixelFindError>;

/// Errors that can occur when building patterns and finders or while
/// searching and waiting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PixelFindError {
    /// Width or height is zero, or the dimensions overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: usize,
        /// Requested height in pixels.
        height: usize,
    },

    /// The pixel buffer is shorter than the dimensions require.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall {
        /// Minimum number of pixels required.
        needed: usize,
        /// Number of pixels provided.
        got: usize,
    },

    /// The pixel layout cannot be searched. Bottom-up rows are rejected,
    /// never silently reinterpreted.
    #[error("unsupported pixel layout: {reason}")]
    UnsupportedLayout {
        /// What makes the layout unusable.
        reason: &'static str,
    },

    /// `diff` is outside the accepted range.
    #[error("diff range: 0 - 100, got {diff}")]
    InvalidDiff {
        /// The rejected value.
        diff: u32,
    },

    /// The finder was constructed with an empty pattern list.
    #[error("no patterns to search for")]
    NoPatterns,

    /// An image file or buffer could not be loaded or decoded.
    #[error("image load failed: {reason}")]
    ImageIo {
        /// Decoder or filesystem error text.
        reason: String,
    },

    /// An `image:` literal does not contain valid Base64 image data.
    #[error("invalid image literal: {reason}")]
    InvalidLiteral {
        /// What failed while parsing the literal.
        reason: String,
    },

    /// The capture target is permanently invalid. Transient unavailability
    /// is not an error; see [`FrameSource::acquire`](crate::FrameSource::acquire).
    #[error("capture failed: {reason}")]
    CaptureFailed {
        /// Source-provided failure text.
        reason: String,
    },

    /// Nothing was found within the requested wait time.
    #[error("not found")]
    NotFound,

    /// A wait with a positive timeout expired.
    #[error("timed out")]
    Timeout,
}
