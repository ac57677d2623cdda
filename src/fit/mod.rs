//! Iterative k-means fitting with incremental progress reporting.
//!
//! This module provides the fitting engine and the records it produces.
//!
//! ## Shape of a fit
//!
//! A fit is a state machine: construction initializes random centroids and
//! an initial assignment, then [`FitEngine::fit`] loops
//!
//! ```text
//! recompute centroids -> assign points -> emit FitStep -> convergence check
//! ```
//!
//! until the cost improvement falls to the configured threshold, the
//! iteration cap is hit, or orphan recovery exhausts its retry budget. The
//! caller observes the run through two optional callbacks (one [`FitStep`]
//! per iteration, one [`FitFailureEvent`] per recovered orphan) and receives
//! a [`FitResult`] when the loop stops. Every record carries the engine's
//! identity, so an embedding layer driving many fits at once can correlate
//! events to their owners.
//!
//! ## Usage
//!
//! ```rust
//! use kfit::{sample, FitEngine, FitParams};
//!
//! let data = sample(100, 2, 42).unwrap();
//!
//! let params = FitParams::new(3).with_seed(42);
//! let mut engine = FitEngine::new(&data, params).unwrap();
//! engine.on_step(|step| println!("iteration {}: cost {:.4}", step.iteration, step.cost));
//!
//! let result = engine.fit();
//! assert_eq!(result.step.centroids.len(), 3);
//! assert_eq!(result.step.membership.len(), 100);
//! ```

mod engine;
mod params;
mod records;

pub use engine::{FailureCallback, FitEngine, StepCallback};
pub use params::FitParams;
pub use records::{FitFailureEvent, FitOutcome, FitResult, FitStep};
