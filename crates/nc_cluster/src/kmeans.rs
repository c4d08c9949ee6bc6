//! Lloyd's k-means with k-means++ seeding.
//!
//! All randomness comes from a `StdRng` seeded by the caller, so a fit is a
//! pure function of (matrix, k, params).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::matrix::EmbeddingMatrix;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    pub seed: u64,
    pub max_iterations: usize,
    /// Convergence threshold on the summed squared centroid shift.
    pub tolerance: f64,
    pub n_init: usize,
}

impl From<&nc_core::ClusterConfig> for KMeansParams {
    fn from(config: &nc_core::ClusterConfig) -> Self {
        Self {
            seed: config.seed,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            n_init: config.n_init,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Dense labels in `[0, k)`, numbered by first appearance.
    pub labels: Vec<usize>,
    /// Number of non-empty clusters.
    pub k: usize,
    pub inertia: f64,
    pub iterations: usize,
}

fn squared_distance(a: &[f32], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, c)| {
            let d = *x as f64 - c;
            d * d
        })
        .sum()
}

struct Centroids {
    data: Vec<f64>,
    dim: usize,
}

impl Centroids {
    fn get(&self, c: usize) -> &[f64] {
        &self.data[c * self.dim..(c + 1) * self.dim]
    }

    fn set_from_row(&mut self, c: usize, row: &[f32]) {
        for (dst, src) in self.data[c * self.dim..(c + 1) * self.dim].iter_mut().zip(row) {
            *dst = *src as f64;
        }
    }

    fn count(&self) -> usize {
        self.data.len() / self.dim.max(1)
    }

    /// Index and squared distance of the closest centroid; ties go to the lowest index.
    fn nearest(&self, row: &[f32]) -> (usize, f64) {
        let mut best = (0, f64::INFINITY);
        for c in 0..self.count() {
            let d = squared_distance(row, self.get(c));
            if d < best.1 {
                best = (c, d);
            }
        }
        best
    }
}

fn seed_plus_plus(matrix: &EmbeddingMatrix, k: usize, rng: &mut StdRng) -> Centroids {
    let n = matrix.rows();
    let mut centroids = Centroids {
        data: vec![0.0; k * matrix.dim()],
        dim: matrix.dim(),
    };

    let first = rng.gen_range(0..n);
    centroids.set_from_row(0, matrix.row(first));
    let mut closest: Vec<f64> = matrix
        .iter_rows()
        .map(|row| squared_distance(row, centroids.get(0)))
        .collect();

    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let chosen = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            closest
                .iter()
                .position(|d| {
                    acc += d;
                    acc > target
                })
                .unwrap_or(n - 1)
        } else {
            rng.gen_range(0..n)
        };
        centroids.set_from_row(c, matrix.row(chosen));
        for (i, row) in matrix.iter_rows().enumerate() {
            let d = squared_distance(row, centroids.get(c));
            if d < closest[i] {
                closest[i] = d;
            }
        }
    }
    centroids
}

/// Assign each row to its nearest centroid. Returns whether any label changed.
fn assign(matrix: &EmbeddingMatrix, centroids: &Centroids, labels: &mut [usize]) -> bool {
    let mut changed = false;
    for (i, row) in matrix.iter_rows().enumerate() {
        let (c, _) = centroids.nearest(row);
        if labels[i] != c {
            labels[i] = c;
            changed = true;
        }
    }
    changed
}

/// Recompute centroids as member means. Empty clusters take over the point
/// farthest from its own centroid. Returns the summed squared shift.
fn update(matrix: &EmbeddingMatrix, centroids: &mut Centroids, labels: &mut [usize]) -> f64 {
    let k = centroids.count();
    let dim = centroids.dim;
    let mut counts = vec![0usize; k];
    let mut sums = vec![0.0f64; k * dim];
    for (i, row) in matrix.iter_rows().enumerate() {
        let c = labels[i];
        counts[c] += 1;
        for (s, x) in sums[c * dim..(c + 1) * dim].iter_mut().zip(row) {
            *s += *x as f64;
        }
    }

    let previous = centroids.data.clone();
    for c in 0..k {
        if counts[c] > 0 {
            for (dst, s) in centroids.data[c * dim..(c + 1) * dim]
                .iter_mut()
                .zip(&sums[c * dim..(c + 1) * dim])
            {
                *dst = s / counts[c] as f64;
            }
        }
    }

    let empty: Vec<usize> = (0..k).filter(|c| counts[*c] == 0).collect();
    if !empty.is_empty() {
        let mut far: Vec<(usize, f64)> = matrix
            .iter_rows()
            .enumerate()
            .map(|(i, row)| (i, squared_distance(row, centroids.get(labels[i]))))
            .collect();
        far.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        let mut candidates = far.into_iter();
        for c in empty {
            if let Some((i, _)) = candidates.find(|(i, _)| counts[labels[*i]] > 1) {
                counts[labels[i]] -= 1;
                counts[c] += 1;
                labels[i] = c;
                centroids.set_from_row(c, matrix.row(i));
            }
        }
    }

    previous
        .iter()
        .zip(&centroids.data)
        .map(|(a, b)| (a - b) * (a - b))
        .sum()
}

/// Renumber labels by first appearance so they are dense from 0.
fn compact(labels: &mut [usize]) -> usize {
    let mut mapping: Vec<Option<usize>> = Vec::new();
    let mut next = 0;
    for label in labels.iter_mut() {
        if *label >= mapping.len() {
            mapping.resize(*label + 1, None);
        }
        let dense = *mapping[*label].get_or_insert_with(|| {
            next += 1;
            next - 1
        });
        *label = dense;
    }
    next
}

fn fit_once(matrix: &EmbeddingMatrix, k: usize, seed: u64, params: &KMeansParams) -> KMeansFit {
    let n = matrix.rows();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = seed_plus_plus(matrix, k, &mut rng);
    let mut labels = vec![0usize; n];
    let mut iterations = 0;

    assign(matrix, &centroids, &mut labels);
    for _ in 0..params.max_iterations.max(1) {
        iterations += 1;
        let shift = update(matrix, &mut centroids, &mut labels);
        let changed = assign(matrix, &centroids, &mut labels);
        if !changed || shift <= params.tolerance {
            break;
        }
    }

    let inertia = matrix
        .iter_rows()
        .zip(&labels)
        .map(|(row, c)| squared_distance(row, centroids.get(*c)))
        .sum();
    let k = compact(&mut labels);

    KMeansFit {
        labels,
        k,
        inertia,
        iterations,
    }
}

/// Fit k-means with `k` clusters, keeping the lowest-inertia run out of
/// `n_init` seeded restarts. `k` is capped at the number of rows.
pub fn fit(matrix: &EmbeddingMatrix, k: usize, params: &KMeansParams) -> KMeansFit {
    let n = matrix.rows();
    if n == 0 {
        return KMeansFit {
            labels: Vec::new(),
            k: 0,
            inertia: 0.0,
            iterations: 0,
        };
    }
    let k = k.clamp(1, n);

    let mut best: Option<KMeansFit> = None;
    for run in 0..params.n_init.max(1) {
        let candidate = fit_once(matrix, k, params.seed.wrapping_add(run as u64), params);
        let better = best
            .as_ref()
            .map_or(true, |current| candidate.inertia < current.inertia);
        if better {
            best = Some(candidate);
        }
    }
    best.unwrap_or_else(|| fit_once(matrix, k, params.seed, params))
}
