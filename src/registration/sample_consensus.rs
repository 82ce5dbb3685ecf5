//! RANSAC rejection of outlier correspondences.
//!
//! Draws minimal three-pair samples, fits a rigid transform to each and keeps
//! the largest inlier set. The sampler is seeded so a given input always
//! yields the same subset.

use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Correspondence;
use super::rigid::estimate_rigid;

/// Settings for [`reject_outliers`].
#[derive(Debug, Clone, Copy)]
pub struct RansacParams {
    pub iterations: u32,
    pub inlier_threshold: f64,
    pub seed: u64,
}

/// Keep the correspondences consistent with the best sampled rigid model.
///
/// `source` holds the source points already moved by the current estimate.
/// When no sample yields at least three inliers the input is returned as is.
pub fn reject_outliers(
    correspondences: &[Correspondence],
    source: &[Point3<f64>],
    target: &[Point3<f64>],
    params: &RansacParams,
) -> Vec<Correspondence> {
    let n = correspondences.len();
    if n < 3 || params.iterations == 0 {
        return correspondences.to_vec();
    }

    let threshold_sq = params.inlier_threshold * params.inlier_threshold;
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut best: Vec<Correspondence> = Vec::new();

    for _ in 0..params.iterations {
        let sample = sample_three_indices(&mut rng, n);
        let src: Vec<_> = sample.iter().map(|&i| source[correspondences[i].source]).collect();
        let dst: Vec<_> = sample.iter().map(|&i| target[correspondences[i].target]).collect();

        let Some(model) = estimate_rigid(&src, &dst) else {
            continue;
        };

        let inliers: Vec<Correspondence> = correspondences
            .iter()
            .filter(|c| {
                let moved = model.transform_point(&source[c.source]);
                (moved - target[c.target]).norm_squared() < threshold_sq
            })
            .copied()
            .collect();

        if inliers.len() > best.len() {
            best = inliers;
            if best.len() == n {
                break;
            }
        }
    }

    if best.len() < 3 {
        return correspondences.to_vec();
    }
    best
}

/// Three distinct indices in `0..n` (requires `n >= 3`).
fn sample_three_indices(rng: &mut impl Rng, n: usize) -> [usize; 3] {
    let first = rng.gen_range(0..n);
    let mut second = rng.gen_range(0..n);
    while second == first {
        second = rng.gen_range(0..n);
    }
    let mut third = rng.gen_range(0..n);
    while third == first || third == second {
        third = rng.gen_range(0..n);
    }
    [first, second, third]
}
