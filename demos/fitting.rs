//! Fit three well-separated blobs and watch the cost fall.

use kfit::{FitEngine, FitParams, PointSet};

fn main() {
    // Three tight clusters inside the unit square.
    let data: Vec<Vec<f64>> = vec![
        // Cluster A (near (0.1, 0.1))
        vec![0.10, 0.10],
        vec![0.12, 0.11],
        vec![0.09, 0.12],
        vec![0.11, 0.08],
        // Cluster B (near (0.9, 0.2))
        vec![0.90, 0.20],
        vec![0.91, 0.19],
        vec![0.89, 0.21],
        vec![0.92, 0.22],
        // Cluster C (near (0.5, 0.9))
        vec![0.50, 0.90],
        vec![0.51, 0.91],
        vec![0.49, 0.89],
        vec![0.52, 0.92],
    ];

    let points = PointSet::from_rows(data).unwrap();
    let params = FitParams::new(3).with_seed(42).with_retry_limit(10);
    let mut engine = FitEngine::new(&points, params).unwrap();

    engine.on_step(|step| {
        println!("iteration {:3}  cost {:.6}", step.iteration, step.cost);
    });
    engine.on_failure(|failure| {
        println!(
            "centroid {} orphaned at iteration {} (retry {})",
            failure.orphan, failure.iteration, failure.retries
        );
    });

    let result = engine.fit();

    println!(
        "\n{:?} after {} iterations, {} retries, final cost {:.6}",
        result.outcome, result.step.iteration, result.retries, result.step.cost
    );
    for (c, centroid) in result.step.centroids.iter().enumerate() {
        println!("  centroid {}: ({:.3}, {:.3})", c, centroid[0], centroid[1]);
    }
    for (i, label) in result.step.membership.iter().enumerate() {
        println!("  point {:2} => cluster {}", i, label);
    }
}
