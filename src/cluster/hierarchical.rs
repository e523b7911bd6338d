//! Agglomerative linkage computation.
//!
//! Bottom-up clustering that records every merge as a row of a
//! [`LinkageMatrix`]. The matrix is what [`LinkageTreeBuilder`] turns into a
//! nested cluster tree.
//!
//! # Linkage Methods
//!
//! | Linkage | Formula | Effect |
//! |---------|---------|--------|
//! | Single | min(d(a,b)) for a∈A, b∈B | Chaining; elongated clusters |
//! | Complete | max(d(a,b)) | Compact, spherical clusters |
//! | Average | mean(d(a,b)) | Balanced compromise |
//! | Ward | Δ variance | Minimizes within-cluster variance |
//!
//! Perceptual hashes are compared with the hamming metric (fraction of
//! differing components) under complete linkage.
//!
//! [`LinkageTreeBuilder`]: crate::hierarchy::LinkageTreeBuilder

use crate::cluster::kmeans::to_matrix;
use crate::error::{Error, Result};
use crate::hierarchy::LinkageMatrix;
use kodama::{linkage as kodama_linkage, Method as KodamaMethod};

/// Linkage method for hierarchical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    /// Single linkage: minimum distance between clusters.
    Single,
    /// Complete linkage: maximum distance between clusters.
    Complete,
    /// Average linkage: mean distance between clusters.
    Average,
    /// Ward's method: minimize within-cluster variance.
    Ward,
}

/// Pairwise distance between feature rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Euclidean distance.
    Euclidean,
    /// Fraction of components that differ.
    Hamming,
}

impl Metric {
    fn distance(self, a: &[f32], b: &[f32]) -> f64 {
        match self {
            Metric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| {
                    let dx = *x as f64 - *y as f64;
                    dx * dx
                })
                .sum::<f64>()
                .sqrt(),
            Metric::Hamming => {
                if a.is_empty() {
                    return 0.0;
                }
                let differing = a.iter().zip(b.iter()).filter(|(x, y)| x != y).count();
                differing as f64 / a.len() as f64
            }
        }
    }
}

/// Hierarchical (agglomerative) clustering.
#[derive(Debug, Clone)]
pub struct HierarchicalClustering {
    linkage: Linkage,
    metric: Metric,
}

impl Default for HierarchicalClustering {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchicalClustering {
    /// Complete linkage over hamming distance.
    pub fn new() -> Self {
        Self {
            linkage: Linkage::Complete,
            metric: Metric::Hamming,
        }
    }

    /// Set linkage method.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Set distance metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Compute the full merge history.
    pub fn fit_linkage(&self, data: &[Vec<f32>]) -> Result<LinkageMatrix> {
        // Shape check only; kodama works on the condensed matrix.
        let n = to_matrix(data)?.nrows();
        if n < 2 {
            return Err(Error::InvalidClusterCount {
                requested: 1,
                n_items: n,
            });
        }

        // Condensed dissimilarity matrix (upper triangle, row-major), N-choose-2 long.
        let mut condensed = Vec::with_capacity((n * (n - 1)) / 2);
        for row in 0..(n - 1) {
            for col in (row + 1)..n {
                condensed.push(self.metric.distance(&data[row], &data[col]));
            }
        }

        let method = match self.linkage {
            Linkage::Single => KodamaMethod::Single,
            Linkage::Complete => KodamaMethod::Complete,
            Linkage::Average => KodamaMethod::Average,
            Linkage::Ward => KodamaMethod::Ward,
        };

        // kodama labels leaves 0..n-1 and gives merge i the label n+i.
        let dend = kodama_linkage(&mut condensed, n, method);

        let mut linkage = LinkageMatrix::new(n);
        for step in dend.steps() {
            linkage.add_merge(step.cluster1, step.cluster2, step.dissimilarity, step.size);
        }
        linkage.validate()?;

        Ok(linkage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Reference;

    #[test]
    fn test_linkage_shape() -> Result<()> {
        let data = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![10.0, 0.0]];

        let linkage = HierarchicalClustering::new()
            .with_metric(Metric::Euclidean)
            .fit_linkage(&data)?;

        assert_eq!(linkage.n_items(), 3);
        assert_eq!(linkage.n_merges(), 2);
        assert_eq!(linkage.get(1).map(|m| m.count), Some(3));
        Ok(())
    }

    #[test]
    fn test_closest_pair_merges_first() -> Result<()> {
        let data = vec![
            vec![0.0, 0.0],
            vec![10.0, 10.0],
            vec![0.1, 0.1],
            vec![10.1, 10.1],
        ];

        let linkage = HierarchicalClustering::new()
            .with_linkage(Linkage::Average)
            .with_metric(Metric::Euclidean)
            .fit_linkage(&data)?;

        let first = linkage.get(0).copied().ok_or(Error::EmptyInput)?;
        let mut pair = [first.a, first.b];
        pair.sort_unstable();
        assert!(pair == [0, 2] || pair == [1, 3]);
        assert_eq!(linkage.reference(first.a), Reference::Item(first.a));
        Ok(())
    }

    #[test]
    fn test_hamming_distance() {
        let a = [1.0, 0.0, 1.0, 1.0];
        let b = [1.0, 1.0, 1.0, 0.0];
        assert!((Metric::Hamming.distance(&a, &b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_item_rejected() {
        let data = vec![vec![0.0]];
        assert!(HierarchicalClustering::new().fit_linkage(&data).is_err());
    }
}
