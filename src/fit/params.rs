use std::time::Duration;

/// Tuning parameters for a single fit.
///
/// Built with [`FitParams::new`] and the `with_*` setters:
///
/// ```rust
/// use kfit::FitParams;
///
/// let params = FitParams::new(3).with_delta(1e-4).with_seed(42);
/// assert_eq!(params.k, 3);
/// ```
#[derive(Clone, Debug)]
pub struct FitParams {
    /// Number of clusters. Must be at least 1.
    pub k: usize,

    /// Convergence threshold: the fit completes once the cost improvement
    /// between consecutive passes is at most `delta`.
    pub delta: f64,

    /// Upper bound on refinement iterations.
    pub max_iterations: usize,

    /// Seed for centroid initialization. 0 derives a seed from the process
    /// entropy source; any nonzero seed makes the fit reproducible.
    pub seed: u64,

    /// How many orphan-centroid recoveries to attempt before giving up.
    pub retry_limit: usize,

    /// Cooperative pause between iterations, for slow observers. Irrelevant
    /// to the fit itself.
    pub step_delay: Duration,
}

impl FitParams {
    /// Parameters for a `k`-cluster fit with default tuning.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            delta: 1e-3,
            max_iterations: 1000,
            seed: 0,
            retry_limit: 3,
            step_delay: Duration::ZERO,
        }
    }

    /// Set the convergence threshold.
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the initialization seed (nonzero for reproducibility).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the orphan-recovery retry budget.
    pub fn with_retry_limit(mut self, retry_limit: usize) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Set the inter-iteration pause.
    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }
}
