//! Distance computation over equal-length vectors.

use crate::error::{Error, Result};

/// Euclidean distance between two vectors of equal length.
///
/// Stateless and safe to call from any number of threads.
///
/// # Errors
///
/// [`Error::DimensionMismatch`] if the vectors differ in length.
pub fn euclidean(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch {
            expected: x.len(),
            found: y.len(),
        });
    }

    Ok(squared_euclidean(x, y).sqrt())
}

/// Squared Euclidean distance, for hot paths where only the ordering matters.
///
/// Callers guarantee equal lengths.
#[inline]
pub(crate) fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
