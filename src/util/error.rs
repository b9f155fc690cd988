//! Error types for cubepeak.

use thiserror::Error;

/// Result alias for cubepeak operations.
pub type CubePeakResult<T> = std::result::Result<T, CubePeakError>;

/// Errors that can occur when running cubepeak algorithms.
#[derive(Debug, Error)]
pub enum CubePeakError {
    /// A cube shape has a zero-length axis.
    #[error("invalid cube dimensions: {shape:?}")]
    InvalidDimensions {
        /// Requested `[nz, ny, nx]` shape.
        shape: [usize; 3],
    },
    /// The backing buffer is shorter than the shape requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall {
        /// Minimum element count for the requested shape.
        needed: usize,
        /// Actual element count of the provided buffer.
        got: usize,
    },
    /// Two cubes that must share a shape do not.
    #[error("shape mismatch for {context}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Shape of the reference cube.
        expected: [usize; 3],
        /// Shape of the offending cube.
        got: [usize; 3],
        /// What the offending cube was supposed to be.
        context: &'static str,
    },
    /// A configuration value is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Human-readable reason.
        reason: &'static str,
    },
    /// An array rank outside the supported set was supplied.
    #[error("unsupported array rank: {rank} (expected 2 or 3)")]
    UnsupportedRank {
        /// Rank of the offending array.
        rank: usize,
    },
    /// A collaborator returned a batch of the wrong length.
    #[error("length mismatch for {context}: expected {expected}, got {got}")]
    LengthMismatch {
        /// Expected batch length.
        expected: usize,
        /// Returned batch length.
        got: usize,
        /// Which collaborator output was malformed.
        context: &'static str,
    },
    /// A collaborator failed; the original error is preserved unchanged.
    #[error(transparent)]
    External(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}
