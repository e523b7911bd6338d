//! Planar projection of feature rows.
//!
//! [`PcaProjector`] projects onto the first two principal components, found
//! by power iteration on `XᵀX` of the centered data (with deflation for the
//! second component). The covariance matrix is never formed, so wide
//! feature rows (raw pixels) stay cheap.

use super::traits::Projector;
use crate::cluster::kmeans::to_matrix;
use crate::error::Result;
use ndarray::{Array1, Array2, Axis};

/// Two-component PCA projector.
#[derive(Debug, Clone)]
pub struct PcaProjector {
    max_iter: usize,
    tol: f32,
}

impl Default for PcaProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl PcaProjector {
    /// Create a projector with default iteration limits.
    pub fn new() -> Self {
        Self {
            max_iter: 200,
            tol: 1e-6,
        }
    }

    /// Set maximum power iterations per component.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Leading eigenvector of `XᵀX` orthogonal to `exclude`.
    fn component(&self, x: &Array2<f32>, exclude: Option<&Array1<f32>>) -> Option<Array1<f32>> {
        let d = x.ncols();
        // Fixed, non-symmetric start so results are reproducible.
        let mut v: Array1<f32> = Array1::from_iter((0..d).map(|i| 1.0 + (i as f32) * 1e-3));

        for _ in 0..self.max_iter {
            if let Some(u) = exclude {
                let proj = v.dot(u);
                v.scaled_add(-proj, u);
            }
            let norm = v.dot(&v).sqrt();
            if norm <= f32::EPSILON {
                return None;
            }
            v /= norm;

            let mut next = x.t().dot(&x.dot(&v));
            if let Some(u) = exclude {
                let proj = next.dot(u);
                next.scaled_add(-proj, u);
            }
            let next_norm = next.dot(&next).sqrt();
            if next_norm <= f32::EPSILON {
                return None;
            }
            next /= next_norm;

            let delta: f32 = (&next - &v).mapv(|e| e * e).sum();
            v = next;
            if delta < self.tol {
                break;
            }
        }

        Some(v)
    }
}

impl Projector for PcaProjector {
    fn project(&self, data: &[Vec<f32>]) -> Result<Vec<[f32; 2]>> {
        let mut x = to_matrix(data)?;
        if let Some(mean) = x.mean_axis(Axis(0)) {
            x -= &mean;
        }

        let first = self.component(&x, None);
        let second = first
            .as_ref()
            .and_then(|u| self.component(&x, Some(u)));

        let xs = first.map(|u| x.dot(&u));
        let ys = second.map(|u| x.dot(&u));

        Ok((0..x.nrows())
            .map(|i| {
                [
                    xs.as_ref().map_or(0.0, |c| c[i]),
                    ys.as_ref().map_or(0.0, |c| c[i]),
                ]
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_separates_blobs() -> Result<()> {
        let data = vec![
            vec![0.0, 0.0, 0.0],
            vec![0.1, 0.0, 0.1],
            vec![10.0, 10.0, 10.0],
            vec![10.1, 10.0, 10.1],
        ];
        let points = PcaProjector::new().project(&data)?;
        assert_eq!(points.len(), 4);

        let gap = (points[0][0] - points[2][0]).abs();
        let spread = (points[0][0] - points[1][0]).abs();
        assert!(gap > 10.0 * spread);
        Ok(())
    }

    #[test]
    fn test_identical_rows_project_to_origin() -> Result<()> {
        let data = vec![vec![3.0, 3.0], vec![3.0, 3.0]];
        let points = PcaProjector::new().project(&data)?;
        assert_eq!(points, vec![[0.0, 0.0], [0.0, 0.0]]);
        Ok(())
    }
}
