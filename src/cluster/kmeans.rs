//! K-means partitioning.
//!
//! Lloyd's algorithm with k-means++ seeding, minimizing within-cluster sum
//! of squares:
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! Used as the splitter for recursive partitional trees, where `k` is the
//! branching factor of each split.

use super::traits::Partitioner;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// K-means partitioner.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Maximum iterations.
    max_iter: usize,
    /// Convergence tolerance on total centroid shift.
    tol: f64,
    /// Random seed.
    seed: Option<u64>,
}

impl Default for Kmeans {
    fn default() -> Self {
        Self::new()
    }
}

impl Kmeans {
    /// Create a new K-means partitioner.
    pub fn new() -> Self {
        Self {
            max_iter: 100,
            tol: 1e-4,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// k-means++ seeding: each next centroid is sampled with probability
    /// proportional to its squared distance from the nearest chosen one.
    fn init_centroids(data: &Array2<f32>, k: usize, rng: &mut impl Rng) -> Array2<f32> {
        let n = data.nrows();
        let mut centroids = Array2::zeros((k, data.ncols()));
        centroids.row_mut(0).assign(&data.row(rng.random_range(0..n)));

        for i in 1..k {
            let distances: Vec<f32> = (0..n)
                .map(|j| {
                    (0..i)
                        .map(|c| squared_distance(&data.row(j), &centroids.row(c)))
                        .fold(f32::MAX, f32::min)
                })
                .collect();

            let total: f32 = distances.iter().sum();
            let selected = if total == 0.0 {
                rng.random_range(0..n)
            } else {
                let threshold = rng.random::<f32>() * total;
                let mut cumsum = 0.0;
                distances
                    .iter()
                    .position(|&d| {
                        cumsum += d;
                        cumsum >= threshold
                    })
                    .unwrap_or(n - 1)
            };
            centroids.row_mut(i).assign(&data.row(selected));
        }

        centroids
    }

    fn nearest(point: &ArrayView1<'_, f32>, centroids: &Array2<f32>) -> usize {
        let mut best = 0;
        let mut best_dist = f32::MAX;
        for (c, centroid) in centroids.rows().into_iter().enumerate() {
            let dist = squared_distance(point, &centroid);
            if dist < best_dist {
                best_dist = dist;
                best = c;
            }
        }
        best
    }

    fn assign(data: &Array2<f32>, centroids: &Array2<f32>, labels: &mut [usize]) {
        #[cfg(feature = "parallel")]
        labels.par_iter_mut().enumerate().for_each(|(i, label)| {
            *label = Self::nearest(&data.row(i), centroids);
        });

        #[cfg(not(feature = "parallel"))]
        for (i, label) in labels.iter_mut().enumerate() {
            *label = Self::nearest(&data.row(i), centroids);
        }
    }
}

fn squared_distance(a: &ArrayView1<'_, f32>, b: &ArrayView1<'_, f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Stack rows into an `n x d` matrix, rejecting ragged input.
pub(crate) fn to_matrix(data: &[Vec<f32>]) -> Result<Array2<f32>> {
    let n = data.len();
    let d = data.first().map(Vec::len).ok_or(Error::EmptyInput)?;
    let mut flat: Vec<f32> = Vec::with_capacity(n * d);
    for point in data {
        if point.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: point.len(),
            });
        }
        flat.extend(point);
    }
    Array2::from_shape_vec((n, d), flat).map_err(|e| Error::Other(e.to_string()))
}

impl Partitioner for Kmeans {
    fn partition(&self, data: &[Vec<f32>], k: usize) -> Result<Vec<usize>> {
        let data_arr = to_matrix(data)?;
        let (n, d) = data_arr.dim();

        if k == 0 || k > n {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: n,
            });
        }

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut centroids = Self::init_centroids(&data_arr, k, &mut rng);
        let mut labels = vec![0usize; n];

        for _ in 0..self.max_iter {
            Self::assign(&data_arr, &centroids, &mut labels);

            let mut sums = Array2::<f32>::zeros((k, d));
            let mut counts = vec![0usize; k];
            for (i, &label) in labels.iter().enumerate() {
                let mut row = sums.row_mut(label);
                row += &data_arr.row(i);
                counts[label] += 1;
            }

            for (c, &count) in counts.iter().enumerate() {
                if count > 0 {
                    sums.row_mut(c).mapv_inplace(|v| v / count as f32);
                } else {
                    // Empty cluster: reseed from a random point.
                    let idx = rng.random_range(0..n);
                    sums.row_mut(c).assign(&data_arr.row(idx));
                }
            }

            let shift: f32 = centroids
                .iter()
                .zip(sums.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            centroids = sums;

            if shift < self.tol as f32 {
                break;
            }
        }

        // Final assignment against the converged centroids.
        Self::assign(&data_arr, &centroids, &mut labels);
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
        ]
    }

    #[test]
    fn test_kmeans_basic() {
        let labels = Kmeans::new().with_seed(42).partition(&two_blobs(), 2).unwrap();

        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_kmeans_all_points_assigned() {
        let data: Vec<Vec<f32>> = (0..50)
            .map(|i| vec![i as f32 * 0.1, (i % 5) as f32])
            .collect();

        let labels = Kmeans::new().with_seed(123).partition(&data, 5).unwrap();

        assert_eq!(labels.len(), data.len());
        for &label in &labels {
            assert!(label < 5, "label {} out of range", label);
        }
    }

    #[test]
    fn test_kmeans_k_equals_n() {
        let data = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];

        let labels = Kmeans::new().with_seed(42).partition(&data, 3).unwrap();

        let unique: std::collections::HashSet<_> = labels.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        let labels1 = Kmeans::new().with_seed(42).partition(&two_blobs(), 2).unwrap();
        let labels2 = Kmeans::new().with_seed(42).partition(&two_blobs(), 2).unwrap();
        assert_eq!(labels1, labels2, "same seed should give same result");
    }

    #[test]
    fn test_kmeans_empty_input_error() {
        let data: Vec<Vec<f32>> = vec![];
        assert_eq!(Kmeans::new().partition(&data, 2), Err(Error::EmptyInput));
    }

    #[test]
    fn test_kmeans_k_larger_than_n_error() {
        let data = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        assert!(matches!(
            Kmeans::new().partition(&data, 5),
            Err(Error::InvalidClusterCount { requested: 5, n_items: 2 })
        ));
    }

    #[test]
    fn test_kmeans_ragged_rows_error() {
        let data = vec![vec![0.0, 0.0], vec![1.0]];
        assert!(matches!(
            Kmeans::new().partition(&data, 1),
            Err(Error::DimensionMismatch { expected: 2, found: 1 })
        ));
    }
}
