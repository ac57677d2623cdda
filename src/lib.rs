//! Iterative k-means fitting for dense point sets.
//!
//! `kfit` fits a partition of a fixed-width point set into `k` clusters by
//! Lloyd iteration, reporting progress after every pass and recovering from
//! degenerate iterations instead of aborting.
//!
//! The primary public API is under [`fit`], which provides:
//! - [`FitEngine`]: the refinement loop (assignment, centroid recompute,
//!   convergence check, orphan recovery)
//! - [`FitStep`], [`FitFailureEvent`], [`FitResult`]: immutable snapshots
//!   handed to caller-supplied callbacks and returned at termination
//!
//! [`PointSet`] is the immutable input container, [`euclidean`] the distance
//! metric, and [`sample`] a uniform-random data generator for demos and
//! tests.

#![forbid(unsafe_code)]

pub mod error;
pub mod fit;
pub mod metric;
pub mod points;
pub mod sample;

pub use error::{Error, Result};
pub use fit::{
    FailureCallback, FitEngine, FitFailureEvent, FitOutcome, FitParams, FitResult, FitStep,
    StepCallback,
};
pub use metric::euclidean;
pub use points::PointSet;
pub use sample::sample;
