//! Seams for the black-box algorithms a tree builder calls out to.

use crate::error::Result;

/// Splits a set of feature rows into `k` groups.
pub trait Partitioner {
    /// Assign each row a label in `0..k`.
    ///
    /// Returns one label per input row. Labels need not all be used.
    fn partition(&self, data: &[Vec<f32>], k: usize) -> Result<Vec<usize>>;
}

impl<F> Partitioner for F
where
    F: Fn(&[Vec<f32>], usize) -> Result<Vec<usize>>,
{
    fn partition(&self, data: &[Vec<f32>], k: usize) -> Result<Vec<usize>> {
        self(data, k)
    }
}

/// Projects feature rows into the plane.
pub trait Projector {
    /// One `[x, y]` per input row. Only called with two or more rows.
    fn project(&self, data: &[Vec<f32>]) -> Result<Vec<[f32; 2]>>;
}
