//! Immutable records handed to callers.
//!
//! Each record is a complete snapshot: enough to render progress or a final
//! outcome without touching engine state. A transport pushing these to a
//! remote viewer can serialize the field sets as-is (enable the `serde`
//! feature).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of one completed assignment pass.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct FitStep {
    /// Identity of the owning fit.
    pub id: Uuid,
    /// Iterations completed since the last (re)initialization.
    pub iteration: usize,
    /// Total cost of this pass: the sum over points of squared distance to
    /// the assigned centroid.
    pub cost: f64,
    /// Current centroid matrix, `k` rows of `feature_count` values.
    pub centroids: Vec<Vec<f64>>,
    /// Current assignment: `membership[i]` is the centroid index owning
    /// point `i`.
    pub membership: Vec<usize>,
}

/// Emitted when an iteration degenerates: a centroid finished an assignment
/// pass with no members.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct FitFailureEvent {
    /// Identity of the owning fit.
    pub id: Uuid,
    /// Iteration at which the orphan was detected.
    pub iteration: usize,
    /// Recovery attempts consumed so far, this one included.
    pub retries: usize,
    /// Index of the memberless centroid.
    pub orphan: usize,
}

/// Terminal state of a fit.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FitOutcome {
    /// Cost improvement fell to the configured threshold, or the iteration
    /// cap was reached.
    Converged,
    /// Orphan recovery exhausted its retry budget.
    RetryLimitExceeded,
}

/// Final result of [`crate::FitEngine::fit`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct FitResult {
    /// Which terminal condition fired.
    pub outcome: FitOutcome,
    /// Orphan recoveries consumed over the whole run.
    pub retries: usize,
    /// The last computed snapshot.
    pub step: FitStep,
}
