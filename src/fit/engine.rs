//! The fitting state machine: Lloyd iterations with orphan recovery.
//!
//! # The Algorithm (Lloyd, 1957)
//!
//! K-means partitions `m` points into `k` clusters by alternating two passes
//! until the objective stops improving:
//!
//! - **Assign**: each point joins its nearest centroid.
//! - **Recompute**: each centroid moves to the mean of its members.
//!
//! **Objective**: minimize the within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{i ∈ C_k} ||x_i - μ_k||²
//! ```
//!
//! ## Degeneracy and recovery
//!
//! An assignment pass can leave a centroid with zero members (an *orphan*),
//! typically when a randomly initialized centroid lands far from every point
//! or when the data has fewer distinct locations than `k`. Rather than
//! aborting, the engine reports the orphan through the failure callback,
//! reinitializes just that centroid, refreshes the assignment, and restarts
//! the convergence clock. Each reinitialization discards all convergence
//! progress: cost measured from an unstable configuration is not comparable
//! to cost measured after. A bounded retry budget keeps a pathological
//! dataset (say, `k` greater than the number of distinct points) from
//! looping forever; exhausting it is a reported terminal state, not a crash.
//!
//! ## Progress
//!
//! After every assignment pass the engine hands the registered step callback
//! a [`FitStep`]: a full snapshot of iteration, cost, centroids, and
//! membership. Callbacks run synchronously on the fitting thread, so they
//! must return promptly or hand work off elsewhere; a blocking callback
//! stalls the fit.
//!
//! ## Complexity
//!
//! - **Time**: O(m·k·n) per iteration.
//! - **Space**: O(k·n + m) of mutable state beyond the input.

use std::thread;

use log::{debug, trace, warn};
use rand::prelude::*;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use uuid::Uuid;

use super::params::FitParams;
use super::records::{FitFailureEvent, FitOutcome, FitResult, FitStep};
use crate::error::{Error, Result};
use crate::metric::squared_euclidean;
use crate::points::PointSet;

/// Progress callback, invoked once per completed assignment pass.
pub type StepCallback<'a> = Box<dyn FnMut(&FitStep) + Send + 'a>;

/// Degeneracy callback, invoked once per recovered orphan centroid.
pub type FailureCallback<'a> = Box<dyn FnMut(&FitFailureEvent) + Send + 'a>;

/// Iterative centroid-refinement engine over a borrowed [`PointSet`].
///
/// One engine owns the mutable state of exactly one in-flight fit: the
/// current centroids, the current membership, the iteration counter, and a
/// seeded random source for centroid initialization. The borrowed data is
/// never mutated, so independent engines over the same `PointSet` may run
/// concurrently; a single engine must only ever be driven by one caller.
///
/// Construction initializes every centroid to uniform-random coordinates in
/// `[0, 1)` and runs one assignment pass to establish the starting cost.
/// [`FitEngine::fit`] then drives the refinement loop to a terminal state.
pub struct FitEngine<'a> {
    id: Uuid,
    data: &'a PointSet,
    params: FitParams,
    centroids: Vec<Vec<f64>>,
    membership: Vec<usize>,
    iteration: usize,
    previous_cost: f64,
    rng: StdRng,
    step_callback: Option<StepCallback<'a>>,
    failure_callback: Option<FailureCallback<'a>>,
}

impl<'a> FitEngine<'a> {
    /// Construct and initialize an engine over `data`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `params.k` is 0.
    pub fn new(data: &'a PointSet, params: FitParams) -> Result<Self> {
        if params.k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }

        let seed = if params.seed == 0 {
            rand::rng().random()
        } else {
            params.seed
        };

        let mut engine = Self {
            id: Uuid::new_v4(),
            centroids: vec![vec![0.0; data.feature_count()]; params.k],
            membership: vec![0; data.len()],
            iteration: 0,
            previous_cost: 0.0,
            rng: StdRng::seed_from_u64(seed),
            step_callback: None,
            failure_callback: None,
            data,
            params,
        };

        for c in 0..engine.params.k {
            engine.initialize_centroid(c);
        }
        engine.previous_cost = engine.assign();
        engine.iteration = 0;

        debug!(
            "fit {}: initialized with k={}, {} points of {} features",
            engine.id,
            engine.params.k,
            data.len(),
            data.feature_count()
        );

        Ok(engine)
    }

    /// Identity of this fit, carried on every emitted record.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Configured cluster count.
    pub fn cluster_count(&self) -> usize {
        self.params.k
    }

    /// Iterations completed since the last (re)initialization.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Register the progress callback. At most one is held; registering
    /// again replaces the previous one.
    ///
    /// The callback runs synchronously on the fitting thread and must return
    /// promptly.
    pub fn on_step<F>(&mut self, callback: F)
    where
        F: FnMut(&FitStep) + Send + 'a,
    {
        self.step_callback = Some(Box::new(callback));
    }

    /// Register the degeneracy callback. At most one is held; registering
    /// again replaces the previous one.
    pub fn on_failure<F>(&mut self, callback: F)
    where
        F: FnMut(&FitFailureEvent) + Send + 'a,
    {
        self.failure_callback = Some(Box::new(callback));
    }

    /// Run the refinement loop to a terminal state.
    ///
    /// Synchronous with respect to the caller: the loop, both callbacks, and
    /// the optional inter-iteration pause all run on the calling thread. The
    /// iteration cap is the only built-in bound on runtime; reaching it
    /// terminates as [`FitOutcome::Converged`] at the last computed cost.
    pub fn fit(&mut self) -> FitResult {
        let mut retries = 0;
        let mut outcome = FitOutcome::Converged;
        let mut complete = false;

        while self.iteration < self.params.max_iterations {
            if let Some(orphan) = self.recompute_centroids() {
                retries += 1;
                if retries > self.params.retry_limit {
                    warn!(
                        "fit {}: centroid {} orphaned, retry budget {} exhausted",
                        self.id, orphan, self.params.retry_limit
                    );
                    outcome = FitOutcome::RetryLimitExceeded;
                    break;
                }

                debug!(
                    "fit {}: centroid {} orphaned at iteration {}, reinitializing (retry {})",
                    self.id, orphan, self.iteration, retries
                );
                let event = FitFailureEvent {
                    id: self.id,
                    iteration: self.iteration,
                    retries,
                    orphan,
                };
                if let Some(callback) = self.failure_callback.as_mut() {
                    callback(&event);
                }

                self.reinitialize(orphan);
                continue;
            }

            let cost = self.assign();
            trace!("fit {}: iteration {} cost {}", self.id, self.iteration, cost);

            let step = self.snapshot(cost);
            if let Some(callback) = self.step_callback.as_mut() {
                callback(&step);
            }

            if self.previous_cost - cost <= self.params.delta {
                complete = true;
            }
            self.previous_cost = cost;

            if complete {
                debug!(
                    "fit {}: converged after {} iterations, cost {}",
                    self.id, self.iteration, cost
                );
                break;
            }

            self.iteration += 1;

            if !self.params.step_delay.is_zero() {
                thread::sleep(self.params.step_delay);
            }
        }

        FitResult {
            outcome,
            retries,
            step: self.snapshot(self.previous_cost),
        }
    }

    /// Average each cluster's members into a fresh centroid matrix and
    /// commit it, or report the first memberless cluster without committing
    /// anything.
    fn recompute_centroids(&mut self) -> Option<usize> {
        let k = self.params.k;
        let features = self.data.feature_count();

        let mut sums = vec![vec![0.0; features]; k];
        let mut member_counts = vec![0usize; k];

        for (point, row) in self.data.iter().enumerate() {
            let c = self.membership[point];
            member_counts[c] += 1;
            for (sum, value) in sums[c].iter_mut().zip(row) {
                *sum += value;
            }
        }

        for (c, count) in member_counts.iter().enumerate() {
            if *count == 0 {
                return Some(c);
            }
            for sum in sums[c].iter_mut() {
                *sum /= *count as f64;
            }
        }

        self.centroids = sums;
        None
    }

    /// Assign every point to its nearest centroid and return the pass's
    /// total cost.
    ///
    /// The nearest-centroid scan is data-parallel over points when the
    /// `parallel` feature is enabled. Per-centroid costs are then merged by
    /// a sequential reduction in point order, so the summed cost does not
    /// depend on how the scan was partitioned across workers.
    fn assign(&mut self) -> f64 {
        let rows = self.data.as_rows();
        let centroids = self.centroids.as_slice();

        #[cfg(feature = "parallel")]
        let nearest: Vec<(usize, f64)> = rows
            .par_iter()
            .map(|row| nearest_centroid(row, centroids))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let nearest: Vec<(usize, f64)> = rows
            .iter()
            .map(|row| nearest_centroid(row, centroids))
            .collect();

        let mut cost = vec![0.0; self.params.k];
        for (point, (c, squared_distance)) in nearest.into_iter().enumerate() {
            self.membership[point] = c;
            cost[c] += squared_distance;
        }

        cost.iter().sum()
    }

    /// Reinitialize an orphaned centroid, refresh the assignment, and reset
    /// the convergence clock.
    fn reinitialize(&mut self, orphan: usize) {
        self.initialize_centroid(orphan);
        self.previous_cost = self.assign();
        self.iteration = 0;
    }

    /// Set centroid `c` to uniform-random coordinates in `[0, 1)`.
    fn initialize_centroid(&mut self, c: usize) {
        for value in self.centroids[c].iter_mut() {
            *value = self.rng.random();
        }
    }

    fn snapshot(&self, cost: f64) -> FitStep {
        FitStep {
            id: self.id,
            iteration: self.iteration,
            cost,
            centroids: self.centroids.clone(),
            membership: self.membership.clone(),
        }
    }
}

impl std::fmt::Debug for FitEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitEngine")
            .field("id", &self.id)
            .field("params", &self.params)
            .field("iteration", &self.iteration)
            .field("previous_cost", &self.previous_cost)
            .finish_non_exhaustive()
    }
}

/// Index of the nearest centroid and the squared distance to it.
///
/// Squared distances order the same as distances, so the square root is
/// skipped; the squared form is also exactly the point's cost contribution.
/// Ties go to the lowest centroid index.
fn nearest_centroid(row: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = 0;
    let mut best_squared = f64::INFINITY;

    for (c, centroid) in centroids.iter().enumerate() {
        let squared = squared_euclidean(row, centroid);
        if squared < best_squared {
            best_squared = squared;
            best = c;
        }
    }

    (best, best_squared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample;
    use std::sync::{Arc, Mutex};

    /// Three tight, well-separated blobs inside the unit square, 5 points
    /// each.
    fn blobs() -> Vec<Vec<f64>> {
        let centers = [(0.1, 0.1), (0.9, 0.15), (0.5, 0.9)];
        let offsets = [
            (0.0, 0.0),
            (0.004, 0.0),
            (0.0, 0.004),
            (-0.004, 0.0),
            (0.0, -0.004),
        ];
        centers
            .iter()
            .flat_map(|(cx, cy)| {
                offsets
                    .iter()
                    .map(move |(dx, dy)| vec![cx + dx, cy + dy])
            })
            .collect()
    }

    #[test]
    fn test_zero_k_rejected() {
        let points = PointSet::from_rows(vec![vec![0.5, 0.5]]).unwrap();
        let result = FitEngine::new(&points, FitParams::new(0));
        assert!(matches!(
            result,
            Err(Error::InvalidParameter { name: "k", .. })
        ));
    }

    #[test]
    fn test_separated_blobs_converge_with_shared_membership() {
        let points = PointSet::from_rows(blobs()).unwrap();
        let params = FitParams::new(3).with_seed(7).with_retry_limit(10);
        let mut engine = FitEngine::new(&points, params).unwrap();

        let result = engine.fit();
        assert_eq!(result.outcome, FitOutcome::Converged);

        // Every blob ends up wholly owned by one centroid, and the three
        // blobs by three different centroids.
        let membership = &result.step.membership;
        for blob in membership.chunks(5) {
            for label in blob {
                assert_eq!(*label, blob[0]);
            }
        }
        assert_ne!(membership[0], membership[5]);
        assert_ne!(membership[5], membership[10]);
        assert_ne!(membership[0], membership[10]);
    }

    #[test]
    fn test_cost_non_increasing_between_recoveries() {
        let points = PointSet::from_rows(blobs()).unwrap();
        let params = FitParams::new(3).with_seed(11).with_retry_limit(10);
        let mut engine = FitEngine::new(&points, params).unwrap();

        let costs = Arc::new(Mutex::new(Vec::new()));
        {
            let costs = Arc::clone(&costs);
            engine.on_step(move |step| costs.lock().unwrap().push(step.cost));
        }
        {
            // A reinitialization restarts the cost sequence.
            let costs = Arc::clone(&costs);
            engine.on_failure(move |_| costs.lock().unwrap().clear());
        }

        let result = engine.fit();
        assert_eq!(result.outcome, FitOutcome::Converged);

        let costs = costs.lock().unwrap();
        assert!(!costs.is_empty());
        for pair in costs.windows(2) {
            assert!(
                pair[1] <= pair[0] + 1e-9,
                "cost rose from {} to {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_records_carry_engine_identity() {
        let points = PointSet::from_rows(blobs()).unwrap();
        let params = FitParams::new(3).with_seed(5).with_retry_limit(10);
        let mut engine = FitEngine::new(&points, params).unwrap();
        let id = engine.id();

        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            engine.on_step(move |step| seen.lock().unwrap().push(step.id));
        }

        let result = engine.fit();
        assert_eq!(result.step.id, id);
        assert!(seen.lock().unwrap().iter().all(|step_id| *step_id == id));
    }

    #[test]
    fn test_duplicate_points_trigger_failure_callback() {
        // Three identical points with k=4: at least three centroids can
        // never acquire a member, so every recompute orphans.
        let points = PointSet::from_rows(vec![vec![0.5, 0.5]; 3]).unwrap();
        let mut engine = FitEngine::new(&points, FitParams::new(4).with_seed(21)).unwrap();

        let failures = Arc::new(Mutex::new(Vec::new()));
        {
            let failures = Arc::clone(&failures);
            engine.on_failure(move |failure| {
                failures.lock().unwrap().push((failure.retries, failure.orphan));
            });
        }

        let result = engine.fit();
        assert_eq!(result.outcome, FitOutcome::RetryLimitExceeded);

        let failures = failures.lock().unwrap();
        assert!(!failures.is_empty());
        for (i, (retries, orphan)) in failures.iter().enumerate() {
            assert_eq!(*retries, i + 1);
            assert!(*orphan < 4);
        }
        // The terminating orphan consumes one more attempt than was reported.
        assert_eq!(result.retries, failures.len() + 1);
    }

    #[test]
    fn test_zero_retry_limit_fails_on_first_orphan() {
        let points = PointSet::from_rows(vec![vec![0.5, 0.5]; 3]).unwrap();
        let params = FitParams::new(4).with_seed(21).with_retry_limit(0);
        let mut engine = FitEngine::new(&points, params).unwrap();

        let fired = Arc::new(Mutex::new(0usize));
        {
            let fired = Arc::clone(&fired);
            engine.on_failure(move |_| *fired.lock().unwrap() += 1);
        }

        let result = engine.fit();
        assert_eq!(result.outcome, FitOutcome::RetryLimitExceeded);
        assert_eq!(result.retries, 1);
        assert_eq!(*fired.lock().unwrap(), 0);
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let points = sample(40, 3, 9).unwrap();

        let run = |points: &PointSet| {
            let steps: Arc<Mutex<Vec<(f64, Vec<Vec<f64>>, Vec<usize>)>>> =
                Arc::new(Mutex::new(Vec::new()));
            let mut engine =
                FitEngine::new(points, FitParams::new(4).with_seed(1234)).unwrap();
            {
                let steps = Arc::clone(&steps);
                engine.on_step(move |step| {
                    steps.lock().unwrap().push((
                        step.cost,
                        step.centroids.clone(),
                        step.membership.clone(),
                    ));
                });
            }
            let result = engine.fit();
            drop(engine);
            let steps = Arc::try_unwrap(steps).unwrap().into_inner().unwrap();
            (steps, result)
        };

        let (steps_a, result_a) = run(&points);
        let (steps_b, result_b) = run(&points);

        assert_eq!(steps_a, steps_b);
        assert_eq!(result_a.outcome, result_b.outcome);
        assert_eq!(result_a.retries, result_b.retries);
        assert_eq!(result_a.step.cost, result_b.step.cost);
        assert_eq!(result_a.step.centroids, result_b.step.centroids);
        assert_eq!(result_a.step.membership, result_b.step.membership);
    }

    #[test]
    fn test_callback_re_registration_replaces() {
        let points = PointSet::from_rows(blobs()).unwrap();
        let params = FitParams::new(3).with_seed(7).with_retry_limit(10);
        let mut engine = FitEngine::new(&points, params).unwrap();

        let first = Arc::new(Mutex::new(0usize));
        let second = Arc::new(Mutex::new(0usize));
        {
            let first = Arc::clone(&first);
            engine.on_step(move |_| *first.lock().unwrap() += 1);
        }
        {
            let second = Arc::clone(&second);
            engine.on_step(move |_| *second.lock().unwrap() += 1);
        }

        engine.fit();
        assert_eq!(*first.lock().unwrap(), 0);
        assert!(*second.lock().unwrap() > 0);
    }

    #[test]
    fn test_sampled_data_end_to_end() {
        let data = sample(100, 2, 42).unwrap();
        let mut engine = FitEngine::new(&data, FitParams::new(3).with_seed(42)).unwrap();

        let result = engine.fit();
        assert_eq!(result.outcome, FitOutcome::Converged);
        assert!(result.step.iteration < 1000);
        assert_eq!(result.step.centroids.len(), 3);
        assert!(result.step.centroids.iter().all(|c| c.len() == 2));
        assert_eq!(result.step.membership.len(), 100);
    }

    #[test]
    fn test_shared_pointset_across_engines() {
        let points = sample(30, 2, 8).unwrap();
        let snapshot = points.clone();

        let mut a = FitEngine::new(&points, FitParams::new(2).with_seed(1)).unwrap();
        let mut b = FitEngine::new(&points, FitParams::new(3).with_seed(2)).unwrap();
        a.fit();
        b.fit();

        // Fitting never mutates the input.
        assert_eq!(points, snapshot);
    }
}
