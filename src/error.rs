use thiserror::Error;

/// Errors returned by this crate.
///
/// All variants describe malformed input caught at a construction or call
/// boundary. Steady-state fitting anomalies (an orphaned centroid, an
/// exhausted retry budget) are not errors: they are reported as data through
/// [`crate::FitFailureEvent`] and [`crate::FitResult`].
#[derive(Debug, Error)]
pub enum Error {
    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// Requested dimensions are not positive.
    #[error("invalid dimensions: {rows} x {cols} (both must be positive)")]
    InvalidDimensions {
        /// Requested row count.
        rows: usize,
        /// Requested column count.
        cols: usize,
    },

    /// Vectors in a dataset or distance computation have inconsistent lengths.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
