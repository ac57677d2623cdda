//! Uniform-random dataset generation for demos and tests.

use rand::prelude::*;

use crate::error::{Error, Result};
use crate::points::PointSet;

/// Generate a `rows` x `cols` [`PointSet`] of uniform-random values in `[0, 1)`.
///
/// A `seed` of 0 derives a fresh seed from the process entropy source; any
/// nonzero seed is reproducible.
///
/// # Errors
///
/// [`Error::InvalidDimensions`] if either dimension is zero.
pub fn sample(rows: usize, cols: usize, seed: u64) -> Result<PointSet> {
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions { rows, cols });
    }

    let seed = if seed == 0 { rand::rng().random() } else { seed };
    let mut rng = StdRng::seed_from_u64(seed);

    let data = (0..rows)
        .map(|_| (0..cols).map(|_| rng.random()).collect())
        .collect();

    PointSet::from_rows(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_shape() {
        let points = sample(10, 4, 42).unwrap();
        assert_eq!(points.len(), 10);
        assert_eq!(points.feature_count(), 4);
    }

    #[test]
    fn test_sample_values_in_unit_interval() {
        let points = sample(50, 3, 7).unwrap();
        for row in points.iter() {
            for v in row {
                assert!((0.0..1.0).contains(v), "value {} outside [0, 1)", v);
            }
        }
    }

    #[test]
    fn test_sample_same_seed_reproducible() {
        let a = sample(20, 2, 99).unwrap();
        let b = sample(20, 2, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_different_seeds_differ() {
        let a = sample(20, 2, 1).unwrap();
        let b = sample(20, 2, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sample_zero_seed_draws_entropy() {
        let points = sample(5, 2, 0).unwrap();
        assert_eq!(points.len(), 5);
    }

    #[test]
    fn test_sample_invalid_dimensions() {
        assert!(sample(0, 2, 1).is_err());
        assert!(sample(2, 0, 1).is_err());
    }
}
